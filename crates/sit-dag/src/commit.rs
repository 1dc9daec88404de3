//! Commit records and their textual form.
//!
//! ```text
//! id <commit-id>
//! tree <object-id>
//! author <text>
//! committer <text>
//! pred <commit-id>        zero or more
//! succ <commit-id>        zero or more
//!
//! <message, verbatim to end of file>
//! ```

use serde::{Deserialize, Serialize};
use sit_types::{CommitId, ObjectId};

use crate::error::{GraphError, GraphResult};

/// A commit: a tree snapshot plus authorship and graph edges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub tree: ObjectId,
    pub author: String,
    pub committer: String,
    pub message: String,
    /// Predecessors; `pred[0]` is the first parent.
    pub pred: Vec<CommitId>,
    /// Successors, appended as children are committed.
    pub succ: Vec<CommitId>,
}

impl Commit {
    /// The root record every repository starts from.
    pub fn root() -> Self {
        Self {
            id: CommitId::EMPTY,
            tree: ObjectId::EMPTY,
            author: String::new(),
            committer: String::new(),
            message: String::new(),
            pred: Vec::new(),
            succ: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.id.is_empty()
    }

    /// The first parent, if any.
    pub fn first_parent(&self) -> Option<CommitId> {
        self.pred.first().copied()
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Check that every header field fits on one line.
    pub fn validate(&self) -> GraphResult<()> {
        for (field, value) in [("author", &self.author), ("committer", &self.committer)] {
            if value.contains('\n') || value.contains('\r') {
                return Err(GraphError::InvalidField {
                    field,
                    reason: "must not contain line breaks".into(),
                });
            }
        }
        Ok(())
    }

    /// Serialize to the record format.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(256 + self.message.len());
        out.push_str(&format!("id {}\n", self.id));
        out.push_str(&format!("tree {}\n", self.tree));
        out.push_str(&format!("author {}\n", self.author));
        out.push_str(&format!("committer {}\n", self.committer));
        for p in &self.pred {
            out.push_str(&format!("pred {p}\n"));
        }
        for s in &self.succ {
            out.push_str(&format!("succ {s}\n"));
        }
        out.push('\n');
        out.push_str(&self.message);
        out
    }

    /// Parse a record. `label` names the record in errors.
    pub fn decode(label: &str, text: &str) -> GraphResult<Self> {
        let corrupt = |reason: String| GraphError::Corrupt {
            id: label.to_string(),
            reason,
        };

        let (header, message) = text
            .split_once("\n\n")
            .ok_or_else(|| corrupt("missing blank line after header".into()))?;
        let mut lines = header.split('\n');

        let id = header_field(&mut lines, "id").map_err(corrupt)?;
        let id = CommitId::from_hex(id).map_err(|e| corrupt(format!("id: {e}")))?;
        let tree = header_field(&mut lines, "tree").map_err(corrupt)?;
        let tree = ObjectId::from_hex(tree).map_err(|e| corrupt(format!("tree: {e}")))?;
        let author = header_field(&mut lines, "author").map_err(corrupt)?.to_string();
        let committer = header_field(&mut lines, "committer").map_err(corrupt)?.to_string();

        let mut pred = Vec::new();
        let mut succ = Vec::new();
        for line in lines {
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| corrupt(format!("malformed edge line {line:?}")))?;
            let target = CommitId::from_hex(value).map_err(|e| corrupt(format!("{key}: {e}")))?;
            match key {
                "pred" if succ.is_empty() => pred.push(target),
                "succ" => succ.push(target),
                _ => return Err(corrupt(format!("unexpected line {line:?}"))),
            }
        }

        Ok(Self {
            id,
            tree,
            author,
            committer,
            message: message.to_string(),
            pred,
            succ,
        })
    }
}

/// Take the next header line, which must be `<key> <value>`.
fn header_field<'a>(lines: &mut impl Iterator<Item = &'a str>, key: &str) -> Result<&'a str, String> {
    let line = lines.next().ok_or_else(|| format!("missing {key} line"))?;
    line.strip_prefix(key)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| format!("expected {key} line, got {line:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cid(b: u8) -> CommitId {
        CommitId::from_bytes([b; 20])
    }

    fn sample() -> Commit {
        Commit {
            id: cid(0xaa),
            tree: ObjectId::from_hash([0xbb; 20]),
            author: "Ada <ada@example.com> 2026-Oct-15 09:30:00".into(),
            committer: "Ada <ada@example.com> 2026-Oct-15 09:30:00".into(),
            message: "first line\n\nbody\n".into(),
            pred: vec![cid(1)],
            succ: vec![cid(2), cid(3)],
        }
    }

    #[test]
    fn encoded_grammar() {
        let text = sample().encode();
        let expected = format!(
            "id {}\ntree {}\nauthor Ada <ada@example.com> 2026-Oct-15 09:30:00\n\
             committer Ada <ada@example.com> 2026-Oct-15 09:30:00\npred {}\nsucc {}\nsucc {}\n\n\
             first line\n\nbody\n",
            "aa".repeat(20),
            "bb".repeat(20),
            "01".repeat(20),
            "02".repeat(20),
            "03".repeat(20),
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn decode_reverses_encode() {
        let c = sample();
        assert_eq!(Commit::decode("x", &c.encode()).unwrap(), c);
    }

    #[test]
    fn root_record() {
        let root = Commit::root();
        assert!(root.is_root());
        let text = root.encode();
        assert!(text.starts_with(&format!("id {}\n", "0".repeat(40))));
        assert_eq!(Commit::decode("root", &text).unwrap(), root);
    }

    #[test]
    fn summary_and_first_parent() {
        let c = sample();
        assert_eq!(c.summary(), "first line");
        assert_eq!(c.first_parent(), Some(cid(1)));
        assert_eq!(Commit::root().first_parent(), None);
    }

    #[test]
    fn decode_rejects_bad_records() {
        let good = sample().encode();
        let cases = [
            good.replacen("id ", "ident ", 1),
            good.replacen("\n\n", "\n", 1),
            good.replacen(&format!("succ {}", "03".repeat(20)), &format!("pred {}", "03".repeat(20)), 1),
            good.replacen("tree ", "tree zz", 1),
            good.replacen("pred", "parent", 1),
        ];
        for text in cases {
            assert!(Commit::decode("bad", &text).is_err(), "{text:?} parsed");
        }
    }

    #[test]
    fn multiline_author_rejected() {
        let mut c = sample();
        c.author = "two\nlines".into();
        assert!(matches!(c.validate(), Err(GraphError::InvalidField { .. })));
    }

    proptest! {
        #[test]
        fn message_bytes_survive(message in "(?s).{0,200}", preds in 0usize..3, succs in 0usize..3) {
            let c = Commit {
                message,
                pred: (0..preds).map(|i| cid(i as u8 + 1)).collect(),
                succ: (0..succs).map(|i| cid(i as u8 + 10)).collect(),
                ..sample()
            };
            let text = c.encode();
            let decoded = Commit::decode("p", &text).unwrap();
            prop_assert_eq!(decoded.encode(), text);
            prop_assert_eq!(decoded, c);
        }
    }
}

//! Tree codec: flat snapshot to nested tree objects and back.
//!
//! Writing goes through a transient [`Forest`]: the snapshot's paths are
//! split on `/` into a nested map, then [`flush`] writes trees bottom-up so
//! every subtree is stored before the tree that references it. The forest is
//! an owned value dropped as soon as the root id is known.

use std::collections::BTreeMap;

use sit_store::{EntryMode, ObjectStore, Tree, TreeEntry};
use sit_types::ObjectId;
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::index::{validate_path, Index};
use crate::Snapshot;

/// One directory level, keyed by path component.
pub type Forest = BTreeMap<String, ForestNode>;

/// A node in the forest: a staged file or a nested directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForestNode {
    File(ObjectId),
    Dir(Forest),
}

/// Nest a flat snapshot by path component.
///
/// Fails with [`IndexError::PathConflict`] if a path is staged both as a file
/// and as a directory containing other staged paths.
pub fn build_forest(snapshot: &Snapshot) -> IndexResult<Forest> {
    let mut root = Forest::new();
    for (path, id) in snapshot {
        validate_path(path)?;
        let mut components = path.split('/').peekable();
        let mut level = &mut root;
        while let Some(component) = components.next() {
            if components.peek().is_none() {
                if matches!(level.get(component), Some(ForestNode::Dir(_))) {
                    return Err(IndexError::PathConflict(path.clone()));
                }
                level.insert(component.to_string(), ForestNode::File(*id));
                break;
            }
            let node = level
                .entry(component.to_string())
                .or_insert_with(|| ForestNode::Dir(Forest::new()));
            level = match node {
                ForestNode::Dir(children) => children,
                ForestNode::File(_) => return Err(IndexError::PathConflict(path.clone())),
            };
        }
    }
    Ok(root)
}

/// Write `forest` as tree objects, children first, and return the root id.
pub fn flush<S: ObjectStore + ?Sized>(store: &S, forest: &Forest) -> IndexResult<ObjectId> {
    let mut entries = Vec::with_capacity(forest.len());
    for (name, node) in forest {
        let entry = match node {
            ForestNode::File(id) => TreeEntry::blob(name.clone(), *id),
            ForestNode::Dir(children) => TreeEntry::tree(name.clone(), flush(store, children)?),
        };
        entries.push(entry);
    }
    let id = store.write_tree(&Tree::new(entries))?;
    Ok(id)
}

/// Store a snapshot as a tree and return the root tree id.
pub fn write_snapshot<S: ObjectStore + ?Sized>(store: &S, snapshot: &Snapshot) -> IndexResult<ObjectId> {
    let forest = build_forest(snapshot)?;
    let root = flush(store, &forest)?;
    debug!(%root, entries = snapshot.len(), "snapshot written");
    Ok(root)
}

/// Store the current staging area as a tree and return the root tree id.
pub fn write_index<S: ObjectStore + ?Sized>(store: &S, index: &Index) -> IndexResult<ObjectId> {
    write_snapshot(store, index.entries())
}

/// Flatten the tree `tree_id` into a path-to-blob map.
///
/// `EMPTY` materializes to an empty snapshot.
pub fn materialize<S: ObjectStore + ?Sized>(store: &S, tree_id: &ObjectId) -> IndexResult<Snapshot> {
    let mut out = Snapshot::new();
    if !tree_id.is_empty() {
        materialize_into(store, tree_id, "", &mut out)?;
    }
    Ok(out)
}

fn materialize_into<S: ObjectStore + ?Sized>(
    store: &S,
    tree_id: &ObjectId,
    prefix: &str,
    out: &mut Snapshot,
) -> IndexResult<()> {
    let tree = store.read_tree(tree_id)?;
    for entry in &tree.entries {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{prefix}/{}", entry.name)
        };
        match entry.mode {
            EntryMode::Directory => materialize_into(store, &entry.object_id, &path, out)?,
            _ => {
                out.insert(path, entry.object_id);
            }
        }
    }
    Ok(())
}

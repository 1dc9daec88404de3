use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha1::{Digest, Sha1};
use sit_types::ObjectId;

/// Buffer size used when streaming readers through the digest.
const CHUNK_SIZE: usize = 64 * 1024;

/// SHA-1 content hasher.
///
/// Stateless; every method computes a fresh digest. Hashing a file streams it
/// in fixed-size chunks so large working files are never fully buffered.
pub struct ContentHasher;

impl ContentHasher {
    /// Hash raw bytes.
    pub fn hash(data: &[u8]) -> ObjectId {
        let mut hasher = Sha1::new();
        hasher.update(data);
        ObjectId::from_hash(hasher.finalize().into())
    }

    /// Hash everything a reader yields.
    pub fn hash_reader<R: Read>(mut reader: R) -> Result<ObjectId, HasherError> {
        let mut hasher = Sha1::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HasherError::Io(e)),
            };
            hasher.update(&buf[..n]);
        }
        Ok(ObjectId::from_hash(hasher.finalize().into()))
    }

    /// Hash the whole contents of a file.
    pub fn hash_file(path: &Path) -> Result<ObjectId, HasherError> {
        let file = File::open(path)?;
        Self::hash_reader(BufReader::new(file))
    }

    /// Verify that data produces the expected object ID.
    pub fn verify(data: &[u8], expected: &ObjectId) -> bool {
        Self::hash(data) == *expected
    }
}

/// A reader adapter that digests every byte passing through it.
///
/// Lets a caller hash and consume a stream in one pass, e.g. while
/// compressing a working file into the object store.
pub struct HashingReader<R> {
    inner: R,
    hasher: Sha1,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha1::new(),
        }
    }

    /// Consume the adapter and return the digest of everything read so far.
    pub fn finish(self) -> ObjectId {
        ObjectId::from_hash(self.hasher.finalize().into())
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error)]
pub enum HasherError {
    #[error("I/O error while hashing: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sha1_vectors() {
        assert_eq!(
            ContentHasher::hash(b"").to_hex(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            ContentHasher::hash(b"hello").to_hex(),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
    }

    #[test]
    fn reader_matches_bytes() {
        let data = vec![7u8; CHUNK_SIZE * 3 + 11];
        let from_reader = ContentHasher::hash_reader(data.as_slice()).unwrap();
        assert_eq!(from_reader, ContentHasher::hash(&data));
    }

    #[test]
    fn file_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, b"file content").unwrap();
        assert_eq!(
            ContentHasher::hash_file(&path).unwrap(),
            ContentHasher::hash(b"file content")
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentHasher::hash_file(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, HasherError::Io(_)));
    }

    #[test]
    fn hashing_reader_digests_passthrough() {
        let mut reader = HashingReader::new(&b"streamed bytes"[..]);
        let mut sink = Vec::new();
        io::copy(&mut reader, &mut sink).unwrap();
        assert_eq!(sink, b"streamed bytes");
        assert_eq!(reader.finish(), ContentHasher::hash(b"streamed bytes"));
    }

    #[test]
    fn verify_detects_tampering() {
        let id = ContentHasher::hash(b"original");
        assert!(ContentHasher::verify(b"original", &id));
        assert!(!ContentHasher::verify(b"tampered", &id));
    }
}

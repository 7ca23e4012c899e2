use md5::{Digest, Md5};

/// Maximum strong-digest length, in bytes.
pub const MAX_DIGEST_LEN: usize = 16;
/// Minimum strong-digest length used for block matching.
pub const MIN_DIGEST_LEN: usize = 2;

/// Computes the MD5 digest of `seed || data`, truncated to `digest_len`
/// bytes, as used for per-block strong checksums.
///
/// # Panics
///
/// Panics if `digest_len` exceeds [`MAX_DIGEST_LEN`]; callers should clamp
/// with [`crate::policy::BlockChecksumPolicy`] before calling this.
#[must_use]
pub fn block_digest(seed: i32, data: &[u8], digest_len: usize) -> Vec<u8> {
    assert!(digest_len <= MAX_DIGEST_LEN, "digest_len exceeds MD5 output size");
    let mut hasher = Md5::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(data);
    let full = hasher.finalize();
    full[..digest_len].to_vec()
}

/// Streams a whole-file MD5 digest of `seed || file-bytes`, used for the
/// end-of-file verification digest.
#[derive(Clone)]
pub struct FileDigest {
    hasher: Md5,
}

impl FileDigest {
    #[must_use]
    pub fn new(seed: i32) -> Self {
        let mut hasher = Md5::new();
        hasher.update(seed.to_le_bytes());
        Self { hasher }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    #[must_use]
    pub fn finalize(self) -> [u8; 16] {
        self.hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_digest_truncates_to_requested_length() {
        let digest = block_digest(0, b"hello", 4);
        assert_eq!(digest.len(), 4);
    }

    #[test]
    fn file_digest_matches_block_digest_for_single_update() {
        let mut file = FileDigest::new(7);
        file.update(b"payload");
        let whole = file.finalize();

        let block = block_digest(7, b"payload", 16);
        assert_eq!(whole.to_vec(), block);
    }

    #[test]
    fn different_seeds_produce_different_digests() {
        let a = block_digest(1, b"same", 16);
        let b = block_digest(2, b"same", 16);
        assert_ne!(a, b);
    }
}

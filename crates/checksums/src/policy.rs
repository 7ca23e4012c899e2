use thiserror::Error;

use crate::strong::{MAX_DIGEST_LEN, MIN_DIGEST_LEN};

/// Raised when a file is large enough that its checksum header would need
/// more chunks than the wire format can address.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("file of {file_size} bytes needs more than {max} chunks at block length {block_length}")]
pub struct ChunkOverflow {
    pub file_size: u64,
    pub block_length: u32,
    pub max: u32,
}

/// Maximum `chunkCount` addressable by the wire format (`2^31 - 1`).
pub const MAX_CHUNK_COUNT: u32 = i32::MAX as u32;

/// Derives the block length and strong-digest length for a file, following
/// Design Note 2's formula: `max(MIN_BLOCK_SIZE, pow2_floor(sqrt(size)))`
/// rather than the alternative `pow2SquareRoot` formula some reference
/// versions use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockChecksumPolicy {
    pub block_length: u32,
    pub digest_length: usize,
}

impl BlockChecksumPolicy {
    const MIN_BLOCK_SIZE: u32 = 512;

    /// Computes the policy for a file of `file_size` bytes. Returns a
    /// `block_length` of zero for an empty file.
    #[must_use]
    pub fn for_file_size(file_size: u64) -> Self {
        if file_size == 0 {
            return Self {
                block_length: 0,
                digest_length: MIN_DIGEST_LEN,
            };
        }

        let block_length = Self::MIN_BLOCK_SIZE.max(pow2_floor_sqrt(file_size));
        let digest_length = digest_length_for(file_size, block_length);

        Self {
            block_length,
            digest_length,
        }
    }

    /// Forces the strictest digest length, as the Generator may do to demand
    /// stricter verification.
    #[must_use]
    pub fn with_max_digest(mut self) -> Self {
        self.digest_length = MAX_DIGEST_LEN;
        self
    }

    /// Computes `(chunk_count, remainder)` for `file_size` under this
    /// policy's block length, or a [`ChunkOverflow`] if the chunk count
    /// would exceed [`MAX_CHUNK_COUNT`].
    pub fn chunks_for(&self, file_size: u64) -> Result<(u32, u32), ChunkOverflow> {
        if self.block_length == 0 {
            return Ok((0, 0));
        }
        let block_length = u64::from(self.block_length);
        let chunk_count = file_size / block_length;
        let remainder = (file_size % block_length) as u32;
        if chunk_count > u64::from(MAX_CHUNK_COUNT) {
            return Err(ChunkOverflow {
                file_size,
                block_length: self.block_length,
                max: MAX_CHUNK_COUNT,
            });
        }
        Ok((chunk_count as u32, remainder))
    }
}

/// Largest power of two less than or equal to `floor(sqrt(n))`, matching the
/// `pow2_floor(sqrt(size))` clause of the block-length formula.
fn pow2_floor_sqrt(n: u64) -> u32 {
    let sqrt = (n as f64).sqrt() as u64;
    if sqrt == 0 {
        return 0;
    }
    1u32 << (63 - sqrt.leading_zeros())
}

fn digest_length_for(file_size: u64, block_length: u32) -> usize {
    let fsize_log2 = (file_size as f64).log2();
    let block_log2 = (block_length as f64).log2();
    let raw = (10.0 + 2.0 * fsize_log2 - block_log2 - 24.0) / 8.0;
    let rounded = raw.round() as i64;
    rounded.clamp(MIN_DIGEST_LEN as i64, MAX_DIGEST_LEN as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_has_zero_block_length() {
        let policy = BlockChecksumPolicy::for_file_size(0);
        assert_eq!(policy.block_length, 0);
    }

    #[test]
    fn small_file_uses_minimum_block_length() {
        let policy = BlockChecksumPolicy::for_file_size(100);
        assert_eq!(policy.block_length, 512);
    }

    #[test]
    fn large_file_uses_power_of_two_block_length() {
        // sqrt(1_048_576) == 1024, already a power of two.
        let policy = BlockChecksumPolicy::for_file_size(1_048_576);
        assert_eq!(policy.block_length, 1024);
        assert!(policy.block_length.is_power_of_two());
    }

    #[test]
    fn digest_length_stays_within_bounds() {
        for size in [1u64, 512, 4096, 1 << 20, 1 << 40] {
            let policy = BlockChecksumPolicy::for_file_size(size);
            assert!(policy.digest_length >= MIN_DIGEST_LEN);
            assert!(policy.digest_length <= MAX_DIGEST_LEN);
        }
    }

    #[test]
    fn chunks_for_reproduces_file_size() {
        let policy = BlockChecksumPolicy::for_file_size(4096);
        let (count, remainder) = policy.chunks_for(4096).unwrap();
        assert_eq!(u64::from(count) * u64::from(policy.block_length) + u64::from(remainder), 4096);
    }

    #[test]
    fn chunk_overflow_detected_for_absurd_file_size() {
        let policy = BlockChecksumPolicy {
            block_length: 1,
            digest_length: 16,
        };
        let huge = (u64::from(MAX_CHUNK_COUNT) + 1) * 2;
        assert!(policy.chunks_for(huge).is_err());
    }

    #[test]
    fn with_max_digest_forces_sixteen_bytes() {
        let policy = BlockChecksumPolicy::for_file_size(4096).with_max_digest();
        assert_eq!(policy.digest_length, MAX_DIGEST_LEN);
    }
}

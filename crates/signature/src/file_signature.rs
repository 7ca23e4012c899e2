use std::io::Read;

use checksums::{block_digest, BlockChecksumPolicy, RollingChecksum};

use crate::block::SignatureBlock;
use crate::error::SignatureError;

/// The complete checksum header for one file: the block-size policy used to
/// generate it, plus one [`SignatureBlock`] per chunk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileSignature {
    policy: BlockChecksumPolicy,
    blocks: Vec<SignatureBlock>,
    file_size: u64,
}

impl FileSignature {
    #[must_use]
    pub fn from_raw_parts(policy: BlockChecksumPolicy, blocks: Vec<SignatureBlock>, file_size: u64) -> Self {
        Self {
            policy,
            blocks,
            file_size,
        }
    }

    #[must_use]
    pub fn policy(&self) -> BlockChecksumPolicy {
        self.policy
    }

    #[must_use]
    pub fn blocks(&self) -> &[SignatureBlock] {
        &self.blocks
    }

    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

/// Streams `reader`, computing one [`SignatureBlock`] per `policy.block_length`
/// chunk (the final chunk is shorter when `file_size` isn't an exact
/// multiple), seeding the strong digest with `checksum_seed`.
///
/// Returns [`SignatureError::Truncated`] if `reader` ends before `file_size`
/// bytes are read, and [`SignatureError::TrailingData`] if it produces more.
pub fn generate_file_signature<R: Read>(
    mut reader: R,
    policy: BlockChecksumPolicy,
    file_size: u64,
    checksum_seed: i32,
) -> Result<FileSignature, SignatureError> {
    let mut blocks = Vec::new();
    let mut consumed: u64 = 0;
    let mut index: u32 = 0;

    if policy.block_length > 0 {
        let block_length = u64::from(policy.block_length);
        let mut buf = vec![0u8; policy.block_length as usize];

        while consumed < file_size {
            let remaining = file_size - consumed;
            let take = remaining.min(block_length) as usize;
            reader.read_exact(&mut buf[..take])?;

            let rolling = RollingChecksum::compute(&buf[..take]).value();
            let strong = block_digest(checksum_seed, &buf[..take], policy.digest_length);

            blocks.push(SignatureBlock::new(index, take as u32, rolling, strong));
            consumed += take as u64;
            index += 1;
        }
    }

    if consumed < file_size {
        return Err(SignatureError::Truncated {
            expected: file_size,
            actual: consumed,
        });
    }

    let mut probe = [0u8; 1];
    if reader.read(&mut probe)? > 0 {
        return Err(SignatureError::TrailingData {
            expected: file_size,
            actual: file_size + 1,
        });
    }

    Ok(FileSignature {
        policy,
        blocks,
        file_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn pattern(size: usize) -> Vec<u8> {
        (0..size).map(|i| ((i * 17 + 31) % 256) as u8).collect()
    }

    #[test]
    fn empty_file_produces_no_blocks() {
        let policy = BlockChecksumPolicy::for_file_size(0);
        let sig = generate_file_signature(Cursor::new(Vec::new()), policy, 0, 0).unwrap();
        assert!(sig.blocks().is_empty());
    }

    #[test]
    fn multi_block_file_has_sequential_indices_and_matching_lengths() {
        let data = pattern(1500);
        let policy = BlockChecksumPolicy {
            block_length: 700,
            digest_length: 16,
        };
        let sig = generate_file_signature(Cursor::new(data), policy, 1500, 0).unwrap();

        assert_eq!(sig.blocks().len(), 3);
        for (i, block) in sig.blocks().iter().enumerate() {
            assert_eq!(block.index(), i as u32);
        }
        assert_eq!(sig.blocks()[0].length(), 700);
        assert_eq!(sig.blocks()[1].length(), 700);
        assert_eq!(sig.blocks()[2].length(), 100);
    }

    #[test]
    fn rolling_checksum_matches_fresh_compute_per_block() {
        let data = pattern(2000);
        let policy = BlockChecksumPolicy {
            block_length: 500,
            digest_length: 16,
        };
        let sig = generate_file_signature(Cursor::new(data.clone()), policy, 2000, 0).unwrap();

        for (i, block) in sig.blocks().iter().enumerate() {
            let start = i * 500;
            let end = start + 500;
            let expected = RollingChecksum::compute(&data[start..end]).value();
            assert_eq!(block.rolling(), expected);
        }
    }

    #[test]
    fn different_seeds_change_strong_digests() {
        let data = pattern(1000);
        let policy = BlockChecksumPolicy {
            block_length: 700,
            digest_length: 16,
        };
        let sig_a = generate_file_signature(Cursor::new(data.clone()), policy, 1000, 1).unwrap();
        let sig_b = generate_file_signature(Cursor::new(data), policy, 1000, 2).unwrap();

        assert_ne!(sig_a.blocks()[0].strong(), sig_b.blocks()[0].strong());
    }

    #[test]
    fn truncated_source_is_an_error() {
        let policy = BlockChecksumPolicy {
            block_length: 700,
            digest_length: 16,
        };
        let err = generate_file_signature(Cursor::new(vec![0u8; 500]), policy, 1000, 0).unwrap_err();
        assert!(matches!(err, SignatureError::Truncated { .. }));
    }

    #[test]
    fn trailing_data_is_an_error() {
        let policy = BlockChecksumPolicy {
            block_length: 700,
            digest_length: 16,
        };
        let err = generate_file_signature(Cursor::new(vec![0u8; 150]), policy, 100, 0).unwrap_err();
        assert!(matches!(err, SignatureError::TrailingData { .. }));
    }
}

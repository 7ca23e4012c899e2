use checksums::RollingChecksum;

use crate::index::DeltaSignatureIndex;
use crate::token::{DeltaScript, DeltaToken};

/// Scans `data` against `index`'s basis blocks, producing a [`DeltaScript`]
/// of copy and literal tokens.
///
/// The scan keeps one rolling checksum alive across the whole input: on a
/// confirmed match it jumps the window forward by a full block and
/// recomputes fresh; otherwise it emits one literal byte and slides the
/// window by one (the standard rsync move-one-byte-at-a-time search).
#[must_use]
pub fn generate_delta(data: &[u8], index: &DeltaSignatureIndex, checksum_seed: i32) -> DeltaScript {
    let block_length = index.block_length() as usize;
    let mut tokens = Vec::new();

    if block_length == 0 || data.len() < block_length {
        if !data.is_empty() {
            tokens.push(DeltaToken::Literal(data.to_vec()));
        }
        return DeltaScript::new(tokens);
    }

    let mut pos = 0usize;
    let mut literal = Vec::new();
    let mut roll = RollingChecksum::compute(&data[0..block_length]);

    while pos + block_length <= data.len() {
        let window = &data[pos..pos + block_length];
        if let Some(candidate) = index.find(roll.value(), window, checksum_seed) {
            if !literal.is_empty() {
                tokens.push(DeltaToken::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(DeltaToken::Copy {
                block_index: candidate.block_index,
                length: candidate.length,
            });
            pos += block_length;
            if pos + block_length <= data.len() {
                roll = RollingChecksum::compute(&data[pos..pos + block_length]);
            }
        } else {
            literal.push(data[pos]);
            if pos + block_length < data.len() {
                roll.roll(data[pos], data[pos + block_length])
                    .expect("window is non-empty while block_length > 0");
            }
            pos += 1;
        }
    }

    literal.extend_from_slice(&data[pos..]);
    if !literal.is_empty() {
        tokens.push(DeltaToken::Literal(literal));
    }

    DeltaScript::new(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checksums::BlockChecksumPolicy;
    use signature::generate_file_signature;
    use std::io::Cursor;

    fn index_for(data: &[u8], block_length: u32) -> DeltaSignatureIndex {
        let policy = BlockChecksumPolicy {
            block_length,
            digest_length: 16,
        };
        let sig =
            generate_file_signature(Cursor::new(data.to_vec()), policy, data.len() as u64, 0).unwrap();
        DeltaSignatureIndex::from_signature(&sig)
    }

    #[test]
    fn identical_data_is_mostly_copy_tokens() {
        let data = vec![0xAAu8; 8192];
        let index = index_for(&data, 700);
        let script = generate_delta(&data, &index, 0);

        assert!(script.copy_bytes() > script.literal_bytes());
    }

    #[test]
    fn completely_different_data_has_no_copies() {
        let basis = vec![0x00u8; 4096];
        let input: Vec<u8> = (0..4096u32).map(|i| (i % 255) as u8 + 1).collect();
        let index = index_for(&basis, 700);
        let script = generate_delta(&input, &index, 0);

        assert_eq!(script.copy_bytes(), 0);
        assert_eq!(script.literal_bytes(), input.len() as u64);
    }

    #[test]
    fn insertion_in_the_middle_still_matches_surrounding_blocks() {
        let mut basis = vec![0u8; 2048];
        for (i, b) in basis.iter_mut().enumerate() {
            *b = (i % 200) as u8;
        }
        let mut input = basis[..1024].to_vec();
        input.extend_from_slice(&[0xFFu8; 50]);
        input.extend_from_slice(&basis[1024..]);

        let index = index_for(&basis, 256);
        let script = generate_delta(&input, &index, 0);

        assert!(script.copy_bytes() > 0);
        assert!(script.literal_bytes() > 0);
    }

    #[test]
    fn data_shorter_than_one_block_is_entirely_literal() {
        let basis = vec![1u8; 4096];
        let input = vec![1u8; 10];
        let index = index_for(&basis, 700);
        let script = generate_delta(&input, &index, 0);

        assert_eq!(script.literal_bytes(), 10);
        assert_eq!(script.copy_bytes(), 0);
    }
}

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::token::{DeltaScript, DeltaToken};

/// Reconstructs a file by replaying `script` against `basis`, copying
/// matched ranges and writing literal bytes straight through.
pub fn apply_delta<R, W>(basis: &mut R, output: &mut W, script: &DeltaScript, block_length: u32) -> io::Result<()>
where
    R: Read + Seek,
    W: Write,
{
    let mut buf = Vec::new();
    for token in script.tokens() {
        match token {
            DeltaToken::Copy { block_index, length } => {
                let offset = u64::from(*block_index) * u64::from(block_length);
                basis.seek(SeekFrom::Start(offset))?;
                buf.resize(*length as usize, 0);
                basis.read_exact(&mut buf)?;
                output.write_all(&buf)?;
            }
            DeltaToken::Literal(bytes) => output.write_all(bytes)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::generate_delta;
    use crate::index::DeltaSignatureIndex;
    use checksums::BlockChecksumPolicy;
    use signature::generate_file_signature;
    use std::io::Cursor;

    fn round_trip(basis: &[u8], input: &[u8], block_length: u32) -> Vec<u8> {
        let policy = BlockChecksumPolicy {
            block_length,
            digest_length: 16,
        };
        let sig =
            generate_file_signature(Cursor::new(basis.to_vec()), policy, basis.len() as u64, 7).unwrap();
        let index = DeltaSignatureIndex::from_signature(&sig);
        let script = generate_delta(input, &index, 7);

        let mut basis_cursor = Cursor::new(basis.to_vec());
        let mut output = Vec::new();
        apply_delta(&mut basis_cursor, &mut output, &script, block_length).unwrap();
        output
    }

    #[test]
    fn identical_files_round_trip() {
        let data = vec![0x5Au8; 4096];
        let out = round_trip(&data, &data, 512);
        assert_eq!(out, data);
    }

    #[test]
    fn modified_middle_round_trips() {
        let mut basis: Vec<u8> = (0..4096u32).map(|i| (i % 250) as u8).collect();
        let mut input = basis.clone();
        input[2000..2050].fill(0xEE);
        basis.truncate(basis.len());

        let out = round_trip(&basis, &input, 256);
        assert_eq!(out, input);
    }

    #[test]
    fn appended_tail_round_trips() {
        let basis: Vec<u8> = (0..2000u32).map(|i| (i % 200) as u8).collect();
        let mut input = basis.clone();
        input.extend_from_slice(b"appended tail bytes that are new");

        let out = round_trip(&basis, &input, 256);
        assert_eq!(out, input);
    }
}

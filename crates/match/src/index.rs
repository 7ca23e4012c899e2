use rustc_hash::FxHashMap;

use checksums::block_digest;
use signature::FileSignature;

/// A basis block whose rolling checksum collided with the window currently
/// under scan; the strong digest still needs to be checked.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchCandidate {
    pub block_index: u32,
    pub length: u32,
    pub strong: Vec<u8>,
}

/// A basis file's checksum header, indexed by rolling checksum for O(1)
/// average-case lookup during the sliding-window scan.
pub struct DeltaSignatureIndex {
    block_length: u32,
    digest_length: usize,
    table: FxHashMap<u32, Vec<MatchCandidate>>,
}

impl DeltaSignatureIndex {
    #[must_use]
    pub fn from_signature(sig: &FileSignature) -> Self {
        let policy = sig.policy();
        let mut table: FxHashMap<u32, Vec<MatchCandidate>> = FxHashMap::default();
        for block in sig.blocks() {
            table.entry(block.rolling()).or_default().push(MatchCandidate {
                block_index: block.index(),
                length: block.length(),
                strong: block.strong().to_vec(),
            });
        }
        Self {
            block_length: policy.block_length,
            digest_length: policy.digest_length,
            table,
        }
    }

    #[must_use]
    pub fn block_length(&self) -> u32 {
        self.block_length
    }

    #[must_use]
    pub fn digest_length(&self) -> usize {
        self.digest_length
    }

    /// Looks up `rolling` and, on a hash hit, confirms the match with the
    /// strong digest of `window` before returning a candidate.
    #[must_use]
    pub fn find(&self, rolling: u32, window: &[u8], checksum_seed: i32) -> Option<&MatchCandidate> {
        let candidates = self.table.get(&rolling)?;
        let strong = block_digest(checksum_seed, window, self.digest_length);
        candidates.iter().find(|c| c.strong == strong)
    }
}

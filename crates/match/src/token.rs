/// One step of a delta script: either copy a range from the basis file or
/// emit literal bytes the peer doesn't have.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeltaToken {
    Copy { block_index: u32, length: u32 },
    Literal(Vec<u8>),
}

/// The ordered sequence of tokens that reconstructs a file from a basis
/// plus a literal stream.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DeltaScript {
    tokens: Vec<DeltaToken>,
}

impl DeltaScript {
    #[must_use]
    pub fn new(tokens: Vec<DeltaToken>) -> Self {
        Self { tokens }
    }

    #[must_use]
    pub fn tokens(&self) -> &[DeltaToken] {
        &self.tokens
    }

    #[must_use]
    pub fn copy_bytes(&self) -> u64 {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                DeltaToken::Copy { length, .. } => Some(u64::from(*length)),
                DeltaToken::Literal(_) => None,
            })
            .sum()
    }

    #[must_use]
    pub fn literal_bytes(&self) -> u64 {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                DeltaToken::Literal(bytes) => Some(bytes.len() as u64),
                DeltaToken::Copy { .. } => None,
            })
            .sum()
    }
}

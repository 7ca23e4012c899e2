use thiserror::Error;

const MOD: u32 = 1 << 16;
const MASK: u32 = MOD - 1;

/// Errors raised by [`RollingChecksum::roll`].
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum RollingError {
    /// `roll` was called on a checksum with no active window.
    #[error("cannot roll an empty window")]
    EmptyWindow,
}

/// Adler-32-style weak checksum used by rsync for block matching.
///
/// `s1` accumulates the byte sum, `s2` accumulates the weighted prefix sum;
/// both are kept modulo 2^16 so the 32-bit `value()` stays within the range
/// the wire format expects.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RollingChecksum {
    s1: u32,
    s2: u32,
    len: u32,
}

impl RollingChecksum {
    #[must_use]
    pub const fn new() -> Self {
        Self { s1: 0, s2: 0, len: 0 }
    }

    /// Computes the checksum of `window` from scratch.
    #[must_use]
    pub fn compute(window: &[u8]) -> Self {
        let mut checksum = Self::new();
        checksum.update(window);
        checksum
    }

    /// Accumulates `chunk` into the checksum, as if it had been included in
    /// the window from the start. Used to build the initial window before
    /// any `roll` calls.
    pub fn update(&mut self, chunk: &[u8]) {
        let mut s1 = self.s1;
        let mut s2 = self.s2;
        let mut n = self.len;
        for &byte in chunk {
            n += 1;
            s1 = (s1 + u32::from(byte)) & MASK;
            s2 = (s2 + s1) & MASK;
        }
        self.s1 = s1;
        self.s2 = s2;
        self.len = n;
    }

    /// Slides the window forward by one byte: `out` leaves the window at the
    /// front, `in_byte` enters it at the back. Runs in O(1), independent of
    /// the window length.
    pub fn roll(&mut self, out: u8, in_byte: u8) -> Result<(), RollingError> {
        if self.len == 0 {
            return Err(RollingError::EmptyWindow);
        }
        let out = u32::from(out);
        let in_byte = u32::from(in_byte);
        self.s1 = (self.s1.wrapping_sub(out).wrapping_add(in_byte)) & MASK;
        self.s2 = (self
            .s2
            .wrapping_sub(self.len.wrapping_mul(out))
            .wrapping_add(self.s1))
            & MASK;
        Ok(())
    }

    /// Resets the checksum to an empty state.
    pub const fn reset(&mut self) {
        self.s1 = 0;
        self.s2 = 0;
        self.len = 0;
    }

    #[must_use]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The 32-bit rolling checksum value transmitted on the wire.
    #[must_use]
    pub const fn value(&self) -> u32 {
        (self.s2 << 16) | self.s1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_window_rolls_to_error() {
        let mut checksum = RollingChecksum::new();
        assert_eq!(checksum.roll(b'a', b'b'), Err(RollingError::EmptyWindow));
    }

    #[test]
    fn roll_matches_fresh_compute_after_single_slide() {
        let window = b"abcdefgh";
        let mut rolling = RollingChecksum::compute(window);
        rolling.roll(window[0], b'Z').unwrap();

        let mut slid = window[1..].to_vec();
        slid.push(b'Z');
        let fresh = RollingChecksum::compute(&slid);

        assert_eq!(rolling.value(), fresh.value());
    }

    #[test]
    fn update_is_order_sensitive_split_invariant() {
        let mut a = RollingChecksum::new();
        a.update(b"hello, ");
        a.update(b"rsync!");

        let b = RollingChecksum::compute(b"hello, rsync!");
        assert_eq!(a.value(), b.value());
    }

    proptest! {
        #[test]
        fn roll_equals_fresh_compute(data in proptest::collection::vec(any::<u8>(), 4..64), extra in any::<u8>()) {
            let window_len = data.len();
            let mut rolling = RollingChecksum::compute(&data);
            rolling.roll(data[0], extra).unwrap();

            let mut next_window = data[1..].to_vec();
            next_window.push(extra);
            let fresh = RollingChecksum::compute(&next_window);

            prop_assert_eq!(rolling.value(), fresh.value());
            prop_assert_eq!(rolling.len() as usize, window_len);
        }
    }
}

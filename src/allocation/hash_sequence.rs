/// Deterministic pseudo-random sequence used to place rounding remainders.
///
/// The sequence is a value: [`HashSequence::pick`] consumes it and hands back
/// the chosen index together with the next state, so the allocator never
/// holds mutable generator state.
///
/// The first state is the string hash of the seed; every following state is
/// the string hash of the previous state's decimal representation.
///
/// # Examples
///
/// ```
/// use split_engine::allocation::hash_sequence::HashSequence;
///
/// let seq = HashSequence::from_seed("100ABC");
/// let (first, next) = seq.pick(3);
/// let (again, _) = HashSequence::from_seed("100ABC").pick(3);
/// assert_eq!(first, again);
/// assert_ne!(next.state(), seq.state());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashSequence {
    state: u32,
}

impl HashSequence {
    pub fn from_seed(seed: &str) -> Self {
        Self {
            state: string_hash(seed),
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    /// Choose an index in `0..len` and advance the sequence.
    ///
    /// `len` must be non-zero.
    pub fn pick(self, len: usize) -> (usize, HashSequence) {
        let index = (self.state as usize) % len;
        let next = HashSequence {
            state: string_hash(&self.state.to_string()),
        };
        (index, next)
    }
}

/// Multiplicative string hash: `h = h * 31 + byte`, wrapping at 32 bits.
pub fn string_hash(input: &str) -> u32 {
    input
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_hash_known_values() {
        assert_eq!(string_hash(""), 0);
        assert_eq!(string_hash("a"), 97);
        assert_eq!(string_hash("ab"), 97 * 31 + 98);
        assert_eq!(string_hash("100ABC"), 1_448_651_953);
    }

    #[test]
    fn test_sequence_rehashes_previous_state() {
        let seq = HashSequence::from_seed("100ABC");
        let (index, next) = seq.pick(3);
        assert_eq!(index, 1);
        assert_eq!(next.state(), string_hash("1448651953"));
        assert_eq!(next.state(), 3_946_248_364);
    }

    #[test]
    fn test_pick_stays_in_range() {
        let mut seq = HashSequence::from_seed("seed");
        for len in 1..50 {
            let (index, next) = seq.pick(len);
            assert!(index < len);
            seq = next;
        }
    }
}

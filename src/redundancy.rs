/// Voting over redundant copies
///
/// Samples are tiny (two or three copies), so votes are plain insertion-ordered
/// counters. Ties go to the value seen first.

/// Outcome of resolving the three stored ciphertext-length copies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthResolution {
    /// All three copies agree
    Unanimous(u32),
    /// Two copies agree
    Majority(u32),
    /// All differ; the median passed the ceiling
    Median(u32),
    /// All differ; the median failed the ceiling but the minimum passed
    Minimum(u32),
    /// Nothing passed the ceiling
    Fallback(u32),
}

impl LengthResolution {
    pub fn value(self) -> u32 {
        match self {
            Self::Unanimous(v) | Self::Majority(v) | Self::Median(v) | Self::Minimum(v) | Self::Fallback(v) => v,
        }
    }

    pub fn is_unanimous(self) -> bool {
        matches!(self, Self::Unanimous(_))
    }
}

/// Resolve three length copies: agreement first, then median, then minimum,
/// then `fallback`, rejecting anything above `ceiling`.
pub fn resolve_length(copies: [u32; 3], ceiling: u32, fallback: u32) -> LengthResolution {
    let [a, b, c] = copies;
    if a == b && b == c {
        return LengthResolution::Unanimous(a);
    }
    if a == b || a == c {
        return LengthResolution::Majority(a);
    }
    if b == c {
        return LengthResolution::Majority(b);
    }

    let mut sorted = copies;
    sorted.sort_unstable();
    if sorted[1] <= ceiling {
        LengthResolution::Median(sorted[1])
    } else if sorted[0] <= ceiling {
        LengthResolution::Minimum(sorted[0])
    } else {
        LengthResolution::Fallback(fallback)
    }
}

/// Merge two copies of a byte. On disagreement prefer the non-zero one,
/// else the first. Returns `(value, disagreed)`.
#[inline]
pub fn merge_pair(a: u8, b: u8) -> (u8, bool) {
    if a == b {
        (a, false)
    } else if a != 0 {
        (a, true)
    } else {
        (b, true)
    }
}

/// Majority of three copies. When all differ, take the first non-zero copy.
/// Returns `(value, disagreed)` where `disagreed` means no two copies matched.
#[inline]
pub fn majority_of_three(a: u8, b: u8, c: u8) -> (u8, bool) {
    if a == b || a == c {
        (a, false)
    } else if b == c {
        (b, false)
    } else if a != 0 {
        (a, true)
    } else if b != 0 {
        (b, true)
    } else {
        (c, true)
    }
}

/// Byte-wise merge of two copies of a field
pub fn merge_pair_bytes<const LEN: usize>(a: &[u8; LEN], b: &[u8; LEN]) -> ([u8; LEN], bool) {
    let mut out = [0u8; LEN];
    let mut disagreed = false;
    for i in 0..LEN {
        let (v, d) = merge_pair(a[i], b[i]);
        out[i] = v;
        disagreed |= d;
    }
    (out, disagreed)
}

/// Byte-wise majority of three copies of a field.
///
/// `disagreed` is set whenever any byte's copies are not all equal, including
/// a 2-of-3 majority, since that still means a copy was damaged.
pub fn majority_bytes<const LEN: usize>(copies: [&[u8; LEN]; 3]) -> ([u8; LEN], bool) {
    let [a, b, c] = copies;
    let mut out = [0u8; LEN];
    let mut disagreed = false;
    for i in 0..LEN {
        out[i] = majority_of_three(a[i], b[i], c[i]).0;
        disagreed |= !(a[i] == b[i] && b[i] == c[i]);
    }
    (out, disagreed)
}

/// Insertion-ordered frequency counter for one payload byte
#[derive(Clone, Debug, Default)]
pub struct Vote {
    counts: Vec<(u8, u32)>,
}

impl Vote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: u8) {
        match self.counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((value, 1)),
        }
    }

    /// Most frequent value; first-seen wins ties. `None` when nothing was added.
    pub fn winner(&self) -> Option<u8> {
        let mut best: Option<(u8, u32)> = None;
        for &(v, n) in &self.counts {
            if best.map_or(true, |(_, m)| n > m) {
                best = Some((v, n));
            }
        }
        best.map(|(v, _)| v)
    }

    /// Values that lost only on the first-seen tie-break
    pub fn tied_alternatives(&self) -> Vec<u8> {
        let Some(top) = self.counts.iter().map(|&(_, n)| n).max() else {
            return Vec::new();
        };
        self.counts
            .iter()
            .filter(|&&(_, n)| n == top)
            .skip(1)
            .map(|&(v, _)| v)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_agreement() {
        assert_eq!(resolve_length([48, 48, 48], 10_000, 1_000), LengthResolution::Unanimous(48));
        assert_eq!(resolve_length([48, 7, 48], 10_000, 1_000), LengthResolution::Majority(48));
        assert_eq!(resolve_length([7, 48, 48], 10_000, 1_000), LengthResolution::Majority(48));
        assert_eq!(resolve_length([48, 48, 9], 10_000, 1_000), LengthResolution::Majority(48));
    }

    #[test]
    fn test_length_median_and_fallbacks() {
        let r = resolve_length([48, u32::MAX, 0], 10_000, 1_000);
        assert_eq!(r, LengthResolution::Median(48));
        assert!(!r.is_unanimous());

        let r = resolve_length([20_000, 30_000, 64], 10_000, 1_000);
        assert_eq!(r, LengthResolution::Minimum(64));

        let r = resolve_length([20_000, 30_000, 40_000], 10_000, 1_000);
        assert_eq!(r, LengthResolution::Fallback(1_000));
        assert_eq!(r.value(), 1_000);
    }

    #[test]
    fn test_merge_pair_prefers_nonzero() {
        assert_eq!(merge_pair(b'a', b'a'), (b'a', false));
        assert_eq!(merge_pair(b'a', b'z'), (b'a', true));
        assert_eq!(merge_pair(0, b'z'), (b'z', true));

        let (salt, bad) = merge_pair_bytes(b"abcd", b"abXd");
        assert_eq!(&salt, b"abcd");
        assert!(bad);
    }

    #[test]
    fn test_majority_of_three() {
        assert_eq!(majority_of_three(1, 1, 2), (1, false));
        assert_eq!(majority_of_three(2, 1, 1), (1, false));
        assert_eq!(majority_of_three(1, 2, 1), (1, false));
        assert_eq!(majority_of_three(0, 5, 6), (5, true));
        assert_eq!(majority_of_three(0, 0, 0), (0, false));
        assert_eq!(majority_of_three(7, 5, 6), (7, true));
    }

    #[test]
    fn test_majority_bytes_flags_single_copy_damage() {
        let good = [1u8, 2, 3, 4];
        let bad = [1u8, 9, 3, 4];
        let (v, disagreed) = majority_bytes([&good, &bad, &good]);
        assert_eq!(v, good);
        assert!(disagreed);

        let (_, disagreed) = majority_bytes([&good, &good, &good]);
        assert!(!disagreed);
    }

    #[test]
    fn test_vote_first_seen_tie_break() {
        let mut vote = Vote::new();
        assert_eq!(vote.winner(), None);

        vote.add(9);
        vote.add(3);
        assert_eq!(vote.winner(), Some(9));
        assert_eq!(vote.tied_alternatives(), vec![3]);

        vote.add(3);
        assert_eq!(vote.winner(), Some(3));
        assert!(vote.tied_alternatives().is_empty());
    }
}

//! Longest-matching-blocks similarity ratio.
//!
//! Implements the classic "gestalt" sequence matcher: find the longest
//! contiguous matching block, recurse on the pieces to its left and right,
//! and score `2 * M / T` where `M` is the total matched length and `T` the
//! combined length of both sequences.
//!
//! Tie-breaks follow difflib exactly (earliest start in `a`, then earliest in
//! `b`, popular-element pruning for long `b`) because the fuzzy threshold in
//! [`crate::matching`] was calibrated against those outputs.

use rustc_hash::FxHashMap;
use std::hash::Hash;

/// `b` sequences at least this long get popular-element pruning.
pub const AUTOJUNK_MIN_LEN: usize = 200;

/// A matching block: `a[a..a + size] == b[b..b + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

/// Sequence matcher over two slices of comparable elements.
pub struct SequenceMatcher<'s, T> {
    a: &'s [T],
    b: &'s [T],
    /// Element → ascending positions in `b`, popular elements removed
    b2j: FxHashMap<T, Vec<usize>>,
}

impl<'s, T> SequenceMatcher<'s, T>
where
    T: Eq + Hash + Copy,
{
    pub fn new(a: &'s [T], b: &'s [T]) -> Self {
        let mut b2j: FxHashMap<T, Vec<usize>> = FxHashMap::default();
        for (j, elt) in b.iter().enumerate() {
            b2j.entry(*elt).or_default().push(j);
        }

        let n = b.len();
        if n >= AUTOJUNK_MIN_LEN {
            let ntest = n / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= ntest);
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` / `b[blo..bhi]`.
    /// Size 0 when nothing matches.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
        let (a, b) = (self.a, self.b);
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);

        // j2len[j] = length of the match ending at a[i - 1], b[j]
        let mut j2len: FxHashMap<usize, usize> = FxHashMap::default();
        for i in alo..ahi {
            let mut new_j2len: FxHashMap<usize, usize> = FxHashMap::default();
            if let Some(positions) = self.b2j.get(&a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j == 0 {
                        0
                    } else {
                        j2len.get(&(j - 1)).copied().unwrap_or(0)
                    };
                    let k = prev + 1;
                    new_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // Popular elements never seed a match but may extend one
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        Match {
            a: best_i,
            b: best_j,
            size: best_size,
        }
    }

    /// All matching blocks, ascending, adjacent blocks merged.
    /// Unlike difflib there is no trailing zero-size sentinel.
    pub fn matching_blocks(&self) -> Vec<Match> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            blocks.push(m);
            if alo < m.a && blo < m.b {
                queue.push((alo, m.a, blo, m.b));
            }
            if m.a + m.size < ahi && m.b + m.size < bhi {
                queue.push((m.a + m.size, ahi, m.b + m.size, bhi));
            }
        }
        blocks.sort();

        let mut merged: Vec<Match> = Vec::with_capacity(blocks.len());
        for m in blocks {
            match merged.last_mut() {
                Some(last) if last.a + last.size == m.a && last.b + last.size == m.b => {
                    last.size += m.size;
                }
                _ => merged.push(m),
            }
        }
        merged
    }

    /// Similarity in [0, 1]. Two empty sequences score 1.0.
    pub fn ratio(&self) -> f64 {
        let matches: usize = self.matching_blocks().iter().map(|m| m.size).sum();
        calculate_ratio(matches, self.a.len() + self.b.len())
    }

    /// Upper bound on [`Self::ratio`] from element multiset overlap.
    pub fn quick_ratio(&self) -> f64 {
        let mut avail: FxHashMap<T, isize> = FxHashMap::default();
        for elt in self.b {
            *avail.entry(*elt).or_insert(0) += 1;
        }
        let mut matches = 0usize;
        for elt in self.a {
            if let Some(count) = avail.get_mut(elt) {
                if *count > 0 {
                    matches += 1;
                }
                *count -= 1;
            }
        }
        calculate_ratio(matches, self.a.len() + self.b.len())
    }

    /// Cheapest upper bound on [`Self::ratio`], from lengths alone.
    pub fn real_quick_ratio(&self) -> f64 {
        let (la, lb) = (self.a.len(), self.b.len());
        calculate_ratio(la.min(lb), la + lb)
    }
}

fn calculate_ratio(matches: usize, length: usize) -> f64 {
    if length == 0 {
        1.0
    } else {
        2.0 * matches as f64 / length as f64
    }
}

/// Similarity ratio between two strings, compared char by char.
/// e.g., ratio("helfire", "hellfire") ≈ 0.933, ratio("abcd", "bcde") == 0.75
pub fn ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    SequenceMatcher::new(&a_chars, &b_chars).ratio()
}

// ============================================================================
// TESTS
// ============================================================================

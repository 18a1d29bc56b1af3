//! Greedy String Tiling over opaque symbol sequences.
//!
//! Each pass finds every longest common run between unconsumed positions of `a` and `b`,
//! then tiles them in `(start_a, start_b)` order, skipping runs occluded by a tile placed
//! earlier in the same pass. Passes repeat until the longest run is the minimum length.
//! Candidate runs are seeded from an index of every `min_length`-wide window of `b`, so only
//! positions that share a full window are ever extended.


use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

use crate::error::ConfigError;
use crate::token::Symbol;

/// A run of `length` positions of `a` starting at `start_a` matching `b` at `start_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    pub start_a: usize,
    pub start_b: usize,
    pub length: usize,
}

impl Tile {
    pub fn range_a(&self) -> Range<usize> {
        self.start_a..self.start_a + self.length
    }

    pub fn range_b(&self) -> Range<usize> {
        self.start_b..self.start_b + self.length
    }

    pub fn swapped(self) -> Self {
        Self {
            start_a: self.start_b,
            start_b: self.start_a,
            length: self.length,
        }
    }
}

/// Positions of one sequence that may no longer start or extend a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionMask {
    consumed: Vec<bool>,
}

impl ConsumptionMask {
    pub fn new(len: usize) -> Self {
        Self {
            consumed: vec![false; len],
        }
    }

    /// Fresh mask for a token sequence: only file-end markers are consumed.
    pub fn for_symbols(symbols: &[Symbol]) -> Self {
        Self {
            consumed: symbols.iter().map(|s| s.is_file_end()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }

    pub fn is_consumed(&self, pos: usize) -> bool {
        self.consumed[pos]
    }

    pub fn any_consumed(&self, range: Range<usize>) -> bool {
        self.consumed[range].iter().any(|&c| c)
    }

    pub fn consume(&mut self, range: Range<usize>) {
        for slot in &mut self.consumed[range] {
            *slot = true;
        }
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.iter().filter(|&&c| c).count()
    }

    /// Positions still available for matching.
    pub fn available(&self) -> usize {
        self.len() - self.consumed_count()
    }
}

/// Tiles `a` against `b` from fresh masks.
pub fn greedy_tiles<S: Copy + Eq + Hash>(
    a: &[S],
    b: &[S],
    min_length: usize,
) -> Result<Vec<Tile>, ConfigError> {
    let mut mask_a = ConsumptionMask::new(a.len());
    let mut mask_b = ConsumptionMask::new(b.len());
    greedy_tiles_masked(a, b, &mut mask_a, &mut mask_b, min_length)
}

/// Tiles `a` against `b`, honoring and updating the given consumption masks.
///
/// Each mask must cover its sequence exactly.
///
/// Returned tiles are in placement order: longest first, equal lengths by `(start_a, start_b)`.
pub fn greedy_tiles_masked<S: Copy + Eq + Hash>(
    a: &[S],
    b: &[S],
    mask_a: &mut ConsumptionMask,
    mask_b: &mut ConsumptionMask,
    min_length: usize,
) -> Result<Vec<Tile>, ConfigError> {
    if min_length == 0 {
        return Err(ConfigError::MinimumTokenMatch { value: 0 });
    }
    for (mask, sequence) in [(&*mask_a, a.len()), (&*mask_b, b.len())] {
        if mask.len() != sequence {
            return Err(ConfigError::MaskLength {
                mask: mask.len(),
                sequence,
            });
        }
    }

    let mut tiles = Vec::new();
    if a.len() < min_length || b.len() < min_length {
        return Ok(tiles);
    }

    let index = WindowIndex::build(b, mask_b, min_length);
    if index.is_empty() {
        return Ok(tiles);
    }

    loop {
        let mut max_match = min_length;
        let mut matches: Vec<Tile> = Vec::new();

        for start_a in 0..a.len() {
            if start_a + max_match > a.len() {
                break;
            }
            if mask_a.is_consumed(start_a) {
                continue;
            }
            let Some(candidates) = index.get(&a[start_a..start_a + min_length]) else {
                continue;
            };
            for &start_b in candidates {
                if start_b + max_match > b.len() {
                    break;
                }
                if mask_b.is_consumed(start_b) {
                    continue;
                }
                let length = extend_run(a, b, mask_a, mask_b, start_a, start_b);
                if length > max_match {
                    matches.clear();
                    max_match = length;
                }
                if length == max_match {
                    matches.push(Tile {
                        start_a,
                        start_b,
                        length,
                    });
                }
            }
        }

        for tile in matches {
            if mask_a.any_consumed(tile.range_a()) || mask_b.any_consumed(tile.range_b()) {
                continue;
            }
            mask_a.consume(tile.range_a());
            mask_b.consume(tile.range_b());
            tiles.push(tile);
        }

        if max_match == min_length {
            break;
        }
    }

    debug_assert!(tiles_are_disjoint(&tiles), "tiles overlap: {tiles:?}");
    Ok(tiles)
}

/// Length of the common run starting at the given positions, stopping at consumed tokens.
fn extend_run<S: Eq>(
    a: &[S],
    b: &[S],
    mask_a: &ConsumptionMask,
    mask_b: &ConsumptionMask,
    start_a: usize,
    start_b: usize,
) -> usize {
    let mut length = 0;
    while start_a + length < a.len()
        && start_b + length < b.len()
        && !mask_a.is_consumed(start_a + length)
        && !mask_b.is_consumed(start_b + length)
        && a[start_a + length] == b[start_b + length]
    {
        length += 1;
    }
    length
}

/// Start positions of `b`, keyed by the `width` symbols starting there.
struct WindowIndex<'a, S> {
    starts: HashMap<&'a [S], Vec<usize>>,
}

impl<'a, S: Eq + Hash> WindowIndex<'a, S> {
    fn build(b: &'a [S], mask_b: &ConsumptionMask, width: usize) -> Self {
        let mut starts: HashMap<&'a [S], Vec<usize>> = HashMap::new();
        let mut blocked_until = 0usize;
        for (pos, window) in b.windows(width).enumerate() {
            // Skip windows containing a position consumed before tiling began.
            if pos < blocked_until {
                continue;
            }
            if let Some(offset) = (pos..pos + width).rev().find(|&p| mask_b.is_consumed(p)) {
                blocked_until = offset + 1;
                continue;
            }
            starts.entry(window).or_default().push(pos);
        }
        Self { starts }
    }

    fn get(&self, window: &[S]) -> Option<&[usize]> {
        self.starts.get(window).map(Vec::as_slice)
    }

    fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

pub(crate) fn tiles_are_disjoint(tiles: &[Tile]) -> bool {
    fn disjoint(mut ranges: Vec<Range<usize>>) -> bool {
        ranges.sort_by_key(|r| r.start);
        ranges.windows(2).all(|w| w[0].end <= w[1].start)
    }
    disjoint(tiles.iter().map(Tile::range_a).collect())
        && disjoint(tiles.iter().map(Tile::range_b).collect())
}

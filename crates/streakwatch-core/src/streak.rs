//! Rule alignment, leading-run detection and row partitioning.
//!
//! Everything in this module is a pure function of its inputs. Sequences are
//! always newest-first: index 0 is the most recent block on the rule's
//! lattice.

use std::collections::BTreeMap;

use crate::block::{Block, Dimension, OutcomeClass};
use crate::rule::Rule;

// ---------------------------------------------------------------------------
// Alignment filter
// ---------------------------------------------------------------------------

/// Blocks on `rule`'s lattice, ordered by descending height.
///
/// The sort is stable, so blocks sharing a height keep their input order.
pub fn align_blocks<'a>(blocks: &'a [Block], rule: &Rule) -> Vec<&'a Block> {
    let mut aligned: Vec<&Block> = blocks.iter().filter(|b| rule.matches(b.height)).collect();
    aligned.sort_by(|a, b| b.height.cmp(&a.height));
    aligned
}

// ---------------------------------------------------------------------------
// Streak calculator
// ---------------------------------------------------------------------------

/// Leading run of a newest-first sequence.
///
/// Returns the key of the first element and how many leading elements share
/// it, or `None` for an empty sequence.
pub fn leading_streak<T, K, F>(sequence: &[T], key: F) -> Option<(K, usize)>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let first = key(sequence.first()?);
    let length = sequence.iter().take_while(|&item| key(item) == first).count();
    Some((first, length))
}

/// Leading run of `blocks` along one dimension.
pub fn block_streak(blocks: &[&Block], dimension: Dimension) -> Option<(OutcomeClass, usize)> {
    leading_streak(blocks, |b| b.class(dimension))
}

// ---------------------------------------------------------------------------
// Row partitioner
// ---------------------------------------------------------------------------

/// Position of `height` on the rule's lattice, counted in sampling steps from
/// the start offset. Heights below the offset get negative indices.
pub fn logical_index(height: u64, rule: &Rule) -> i128 {
    (i128::from(height) - i128::from(rule.start_offset)).div_euclid(i128::from(rule.step()))
}

/// Row a block at `height` belongs to under `rule`.
pub fn row_of(height: u64, rule: &Rule) -> usize {
    // rem_euclid keeps the result in 0..rows even for negative indices
    logical_index(height, rule).rem_euclid(rule.rows() as i128) as usize
}

/// One row of an aligned sequence.
#[derive(Debug, Clone)]
pub struct Row<'a> {
    pub index: usize,
    /// Newest-first, in the same relative order as the aligned input.
    pub blocks: Vec<&'a Block>,
}

impl Row<'_> {
    /// Height the row is expected to recur at next.
    pub fn predicted_next_height(&self, rule: &Rule) -> Option<u64> {
        let newest = self.blocks.first()?;
        let stride = rule.step().saturating_mul(rule.rows() as u64);
        Some(newest.height.saturating_add(stride))
    }
}

/// Split an aligned newest-first sequence into the rule's rows.
///
/// Rows with no blocks are omitted, so the result may have fewer than
/// `rule.rows()` entries. Returned rows are ordered by row index.
pub fn partition_rows<'a>(aligned: &[&'a Block], rule: &Rule) -> Vec<Row<'a>> {
    // only rows that receive a block get a bucket; row_count may be huge
    let mut rows: BTreeMap<usize, Vec<&'a Block>> = BTreeMap::new();
    for &block in aligned {
        rows.entry(row_of(block.height, rule)).or_default().push(block);
    }
    rows.into_iter()
        .map(|(index, blocks)| Row { index, blocks })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

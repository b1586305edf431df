//! Problem selection for a coding test start.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{Problem, ProblemView};

/// How many problems a request for `requested` out of `available` yields.
/// Zero or negative requests yield none; larger requests are capped to the pool.
pub fn clamp_count(requested: i64, available: usize) -> usize {
    if requested <= 0 {
        return 0;
    }
    usize::try_from(requested).map_or(available, |wanted| wanted.min(available))
}

/// Draws a uniform random subset of `pool` without replacement and numbers it
/// 1..=k in draw order.
///
/// Runs a partial Fisher-Yates over pool indices, so only `k` swaps happen and
/// the pool itself is never reordered or cloned wholesale.
pub fn select_problems<R>(pool: &[Problem], requested: i64, rng: &mut R) -> Vec<ProblemView>
where
    R: Rng + ?Sized,
{
    let take = clamp_count(requested, pool.len());
    if take == 0 {
        return Vec::new();
    }

    let mut indices: Vec<usize> = (0..pool.len()).collect();
    let (chosen, _) = indices.partial_shuffle(rng, take);

    chosen
        .iter()
        .enumerate()
        .map(|(position, &index)| ProblemView::numbered(position + 1, &pool[index]))
        .collect()
}

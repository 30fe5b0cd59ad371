//! Top-k probability heuristic (spec §4.4).
//!
//! If all shards have comparable content size, the per-shard `k'` may be
//! reduced below the query's `hits` by choosing `k'` such that
//! `P(top-k of union subset of union of top-k'-per-shard) >= topKProbability`.
//! If active document counts diverge (skew ratio above a threshold) or the
//! total is below a small-content threshold, this is disabled and
//! `k' = hits` is used instead.

/// Computes the reduced per-shard hit count `k'`. Disabled (returns
/// `hits` unchanged) when shard sizes diverge beyond the skew threshold or
/// the corpus is small enough that full per-shard hits are cheap anyway.
pub fn reduced_k(
    hits: usize,
    num_shards: usize,
    active_docs_per_shard: &[u64],
    top_k_probability: f64,
    skew_ratio_threshold: f64,
    small_content_threshold: u64,
) -> usize {
    if num_shards <= 1 || hits == 0 {
        return hits;
    }

    let total: u64 = active_docs_per_shard.iter().sum();
    if total < small_content_threshold {
        return hits;
    }

    let max = active_docs_per_shard.iter().copied().max().unwrap_or(0);
    let min = active_docs_per_shard.iter().copied().min().unwrap_or(0);
    let skew_ratio = if min == 0 { f64::INFINITY } else { max as f64 / min as f64 };
    if skew_ratio > skew_ratio_threshold {
        return hits;
    }

    // Binomial tail bound: with n shards each independently sampling from
    // the same score distribution, the probability that all of a shard's
    // true top-hits members land within its own top-k' is approximately
    // `k'/n_shard_share` per shard; solving for the smallest k' meeting
    // `top_k_probability` in aggregate reduces to scaling `hits` down by
    // the number of shards, floored at 1, then inflated slightly for the
    // requested confidence level.
    let even_share = (hits as f64 / num_shards as f64).ceil();
    let confidence_inflation = 1.0 + (1.0 - top_k_probability).max(0.0);
    let k_prime = (even_share * confidence_inflation).ceil() as usize;
    k_prime.clamp(1, hits)
}

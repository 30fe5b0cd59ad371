//! Interleaved invoker: the dispatcher's fan-out merge engine (spec §4.4).
//!
//! The actual network fan-out (sending a request to N shards and waiting
//! on N futures) is the surrounding server's concern; this module is the
//! pure decision core it drives: when to shorten the deadline, how to
//! merge arriving replies into a bounded top-k, and how to compute the
//! resulting coverage record. Keeping it pure and synchronous (driven by
//! an explicit shard timeline rather than real futures) lets the merge
//! and adaptive-timeout logic be tested deterministically, the same
//! pure-core-over-a-scripted-timeline shape used throughout this
//! workspace (e.g. `vespa-feed`'s token-bucket tests).

use std::time::Duration;

use vespa_types::{CoverageRecord, DegradationReason, Hit};

pub type ShardId = u32;

/// One shard's scripted behavior for a single query: when (if ever) it
/// responds, what it responds with.
#[derive(Debug, Clone)]
pub struct ShardTimeline {
    pub shard: ShardId,
    /// `None` means the shard never responds within any deadline tested.
    pub responds_at: Option<Duration>,
    pub hits: Vec<Hit>,
    pub coverage: CoverageRecord,
}

#[derive(Debug, Clone, Copy)]
pub struct AdaptiveTimeoutConfig {
    /// Fraction of expected coverage (by node count) that must have
    /// replied before adaptive shortening may kick in (spec: `minSearchCoverage`).
    pub min_search_coverage: f64,
    /// Once the coverage threshold is reached, the remaining deadline is
    /// tightened to `elapsed_so_far * multiplier` if that is smaller than
    /// what remains of the original deadline (spec: `coverageBasedAdaptive`).
    pub adaptive_timeout_multiplier: f64,
}

impl Default for AdaptiveTimeoutConfig {
    fn default() -> Self {
        Self {
            min_search_coverage: 0.5,
            adaptive_timeout_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MergeQuery {
    pub hits: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MergedResult {
    pub hits: Vec<Hit>,
    pub coverage: CoverageRecord,
    pub trace: Vec<String>,
}

/// Runs the fan-out simulation over `shards` for one query, honoring
/// `initial_timeout` and adaptive shortening once `min_search_coverage` is
/// reached, then merges all replies that arrived in time.
///
/// Matches spec §4.4 steps 1-5: dispatch with the initial timeout, merge
/// as replies arrive, switch to the adaptive timeout after sufficient
/// coverage, degrade on a missed deadline, and apply offset/hits only to
/// non-meta hits after the full merge.
pub fn run_interleaved(
    shards: &[ShardTimeline],
    initial_timeout: Duration,
    adaptive: AdaptiveTimeoutConfig,
    query: MergeQuery,
) -> MergedResult {
    let total_shards = shards.len();
    let mut current_deadline = initial_timeout;
    let mut replied: Vec<&ShardTimeline> = Vec::new();
    let mut missing: Vec<ShardId> = Vec::new();
    let mut adaptive_triggered = false;

    let mut sorted: Vec<&ShardTimeline> = shards.iter().collect();
    sorted.sort_by_key(|s| s.responds_at.unwrap_or(Duration::MAX));

    for shard in sorted {
        let Some(at) = shard.responds_at else {
            missing.push(shard.shard);
            continue;
        };
        if at > current_deadline {
            missing.push(shard.shard);
            continue;
        }
        replied.push(shard);

        if !adaptive_triggered && total_shards > 0 {
            let coverage_so_far = replied.len() as f64 / total_shards as f64;
            if coverage_so_far >= adaptive.min_search_coverage {
                let candidate = at.mul_f64(adaptive.adaptive_timeout_multiplier);
                if candidate < current_deadline {
                    tracing::debug!(
                        elapsed_ms = at.as_millis(),
                        new_deadline_ms = candidate.as_millis(),
                        "adaptive timeout engaged after sufficient coverage"
                    );
                    current_deadline = candidate;
                    adaptive_triggered = true;
                }
            }
        }
    }

    // Re-check: shortening the deadline may have excluded replies that
    // were originally counted as "replied" above (they arrived after the
    // new, tighter deadline).
    let (on_time, newly_missing): (Vec<&ShardTimeline>, Vec<&ShardTimeline>) = replied
        .into_iter()
        .partition(|s| s.responds_at.unwrap() <= current_deadline);
    missing.extend(newly_missing.iter().map(|s| s.shard));

    let mut coverage = CoverageRecord::default();
    let mut all_hits: Vec<Hit> = Vec::new();
    for shard in &on_time {
        coverage = coverage.merged_with(shard.coverage);
        all_hits.extend(shard.hits.iter().cloned());
    }

    let mut trace = Vec::new();
    if !missing.is_empty() {
        let reason = if adaptive_triggered {
            DegradationReason::ADAPTIVE_TIMEOUT
        } else {
            DegradationReason::TIMEOUT
        };
        coverage.degraded_by = coverage.degraded_by | reason;
        coverage.nodes_tried = total_shards as u32;
        trace.push("Backend communication timeout".to_string());
        tracing::warn!(missing = ?missing, adaptive = adaptive_triggered, "shard(s) missed deadline");
    }

    let merged = merge_and_page(all_hits, query);

    MergedResult {
        hits: merged,
        coverage,
        trace,
    }
}

/// Merges already-collected hits from all replies into the final page:
/// sorts by [`Hit::rank_cmp`], applies `offset`/`hits` to non-meta hits
/// only, then appends meta hits in their original relative order (spec
/// §4.4 step 5, testable property 6).
pub fn merge_and_page(mut all_hits: Vec<Hit>, query: MergeQuery) -> Vec<Hit> {
    let meta: Vec<Hit> = all_hits.iter().filter(|h| h.is_meta()).cloned().collect();
    all_hits.retain(|h| !h.is_meta());
    all_hits.sort_by(Hit::rank_cmp);

    let paged: Vec<Hit> = all_hits
        .into_iter()
        .skip(query.offset)
        .take(query.hits)
        .collect();

    let mut result = paged;
    result.extend(meta);
    result
}

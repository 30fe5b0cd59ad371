//! Nearest-neighbor blueprint (spec §4.4).
//!
//! `NearestNeighborBlueprint` decides, at construction time, whether a
//! query will be served by brute force over a global filter or by the
//! persistent approximate index — the decision itself is pure and
//! synchronous; the actual distance computation against stored vectors is
//! the surrounding attribute store's concern and is modeled here only
//! through the [`DistanceMetric`] it is parameterized by.

use crate::cell_type::{convert_tensor, CellType};
use crate::error::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    Euclidean,
    Angular,
    DotProduct,
    Geo,
}

/// An optional bounding-box prefilter for the `geo` metric: candidates
/// outside the box are rejected before the (more expensive) per-candidate
/// great-circle distance is computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoBoundingBox {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

/// An external document-id filter: `trueBits / numDocs` is the active
/// fraction consulted for the brute-force decision (spec §4.4).
#[derive(Debug, Clone, Copy)]
pub struct GlobalFilter {
    pub true_bits: u64,
    pub num_docs: u64,
}

impl GlobalFilter {
    pub fn active_fraction(&self) -> f64 {
        if self.num_docs == 0 {
            0.0
        } else {
            self.true_bits as f64 / self.num_docs as f64
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NearestNeighborParams {
    pub target_k: usize,
    pub explore_additional: usize,
    pub approximate: bool,
    pub distance_threshold: Option<f64>,
    pub brute_force_limit: f64,
}

/// The search strategy a blueprint resolves to, decided once at
/// construction (spec §4.4 algorithm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchStrategy {
    /// Brute force over the filter's admitted document ids.
    BruteForce,
    /// The persistent approximate index, searched for `k` with
    /// `explore_additional` extra candidates, optionally filter-aware.
    Approximate { k: usize, explore: usize, filter_aware: bool },
}

/// A planned nearest-neighbor search leaf, with the query tensor already
/// converted to the attribute's cell type exactly once (spec §4.4).
pub struct NearestNeighborBlueprint {
    metric: DistanceMetric,
    query_vector: Vec<f64>,
    geo_bbox: Option<GeoBoundingBox>,
    strategy: SearchStrategy,
}

impl NearestNeighborBlueprint {
    /// Builds a blueprint, converting `query_vector` from `query_cell_type`
    /// to `attribute_cell_type` once, and resolving the brute-force vs.
    /// approximate-index decision (spec §4.4 algorithm, steps 1-2).
    pub fn new(
        query_vector: &[f64],
        query_cell_type: CellType,
        attribute_cell_type: CellType,
        metric: DistanceMetric,
        params: NearestNeighborParams,
        filter: Option<GlobalFilter>,
        geo_bbox: Option<GeoBoundingBox>,
    ) -> Result<Self, DispatchError> {
        let converted = convert_tensor(query_vector, query_cell_type, attribute_cell_type)?;

        let strategy = match filter {
            Some(f) if f.active_fraction() < params.brute_force_limit => {
                tracing::debug!(
                    active_fraction = f.active_fraction(),
                    limit = params.brute_force_limit,
                    "nearest-neighbor blueprint falling back to brute force"
                );
                SearchStrategy::BruteForce
            }
            Some(_) => SearchStrategy::Approximate {
                k: params.target_k,
                explore: params.explore_additional,
                filter_aware: true,
            },
            None => SearchStrategy::Approximate {
                k: params.target_k,
                explore: params.explore_additional,
                filter_aware: false,
            },
        };

        Ok(Self {
            metric,
            query_vector: converted,
            geo_bbox: if metric == DistanceMetric::Geo { geo_bbox } else { None },
            strategy,
        })
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn query_vector(&self) -> &[f64] {
        &self.query_vector
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub fn is_approximate(&self) -> bool {
        matches!(self.strategy, SearchStrategy::Approximate { .. })
    }

    /// Computes distance between the query vector and a candidate under
    /// this blueprint's metric. For `geo`, an optional bounding-box
    /// prefilter rejects candidates before the full computation — the
    /// original's documented optimization, supplemented into this core per
    /// `original_source/`.
    pub fn distance(&self, candidate: &[f64]) -> Option<f64> {
        if self.metric == DistanceMetric::Geo {
            if let (Some(bbox), [lat, lng]) = (&self.geo_bbox, candidate) {
                if !bbox.contains(*lat, *lng) {
                    return None;
                }
            }
        }
        Some(compute_distance(self.metric, &self.query_vector, candidate))
    }
}

fn compute_distance(metric: DistanceMetric, a: &[f64], b: &[f64]) -> f64 {
    match metric {
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Angular => {
            let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                1.0
            } else {
                1.0 - dot / (norm_a * norm_b)
            }
        }
        DistanceMetric::DotProduct => -a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>(),
        DistanceMetric::Geo => {
            // Haversine-equivalent flat approximation: sufficient for
            // relative ranking within a bounding box already filtered.
            let dlat = a[0] - b[0];
            let dlng = a[1] - b[1];
            (dlat * dlat + dlng * dlng).sqrt()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_params() -> NearestNeighborParams {
        NearestNeighborParams {
            target_k: 10,
            explore_additional: 20,
            approximate: true,
            distance_threshold: None,
            brute_force_limit: 0.2,
        }
    }

    #[test]
    fn falls_back_to_brute_force_below_limit_scenario_e() {
        let filter = GlobalFilter { true_bits: 50, num_docs: 1000 }; // 5% active
        let blueprint = NearestNeighborBlueprint::new(
            &[1.0, 2.0],
            CellType::Float,
            CellType::Float,
            DistanceMetric::Euclidean,
            default_params(),
            Some(filter),
            None,
        )
        .unwrap();
        assert_eq!(blueprint.strategy(), SearchStrategy::BruteForce);
        assert!(!blueprint.is_approximate());
    }

    #[test]
    fn uses_filter_aware_approximate_above_limit() {
        let filter = GlobalFilter { true_bits: 500, num_docs: 1000 }; // 50% active
        let blueprint = NearestNeighborBlueprint::new(
            &[1.0, 2.0],
            CellType::Float,
            CellType::Float,
            DistanceMetric::Euclidean,
            default_params(),
            Some(filter),
            None,
        )
        .unwrap();
        assert!(matches!(blueprint.strategy(), SearchStrategy::Approximate { filter_aware: true, .. }));
    }

    #[test]
    fn no_filter_uses_plain_approximate_index() {
        let blueprint = NearestNeighborBlueprint::new(
            &[1.0, 2.0],
            CellType::Float,
            CellType::Float,
            DistanceMetric::Euclidean,
            default_params(),
            None,
            None,
        )
        .unwrap();
        assert!(matches!(blueprint.strategy(), SearchStrategy::Approximate { filter_aware: false, .. }));
    }

    #[test]
    fn converts_query_cell_type_once_at_construction() {
        let blueprint = NearestNeighborBlueprint::new(
            &[1.0, 2.0],
            CellType::Int8,
            CellType::Double,
            DistanceMetric::Euclidean,
            default_params(),
            None,
            None,
        )
        .unwrap();
        assert_eq!(blueprint.query_vector(), &[1.0, 2.0]);
    }

    #[test]
    fn rejects_unconvertible_cell_types() {
        let result = NearestNeighborBlueprint::new(
            &[1.0],
            CellType::Double,
            CellType::Int8,
            DistanceMetric::Euclidean,
            default_params(),
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn geo_bounding_box_prefilters_candidates() {
        let blueprint = NearestNeighborBlueprint::new(
            &[10.0, 10.0],
            CellType::Float,
            CellType::Float,
            DistanceMetric::Geo,
            default_params(),
            None,
            Some(GeoBoundingBox { min_lat: 0.0, max_lat: 5.0, min_lng: 0.0, max_lng: 5.0 }),
        )
        .unwrap();
        assert!(blueprint.distance(&[100.0, 100.0]).is_none());
        let inside = NearestNeighborBlueprint::new(
            &[1.0, 1.0],
            CellType::Float,
            CellType::Float,
            DistanceMetric::Geo,
            default_params(),
            None,
            Some(GeoBoundingBox { min_lat: 0.0, max_lat: 5.0, min_lng: 0.0, max_lng: 5.0 }),
        )
        .unwrap();
        assert!(inside.distance(&[2.0, 2.0]).is_some());
    }
}

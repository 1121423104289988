//! Radius search over a [`GeoRecordSource`].
//!
//! The strategy is chosen once, from the source's advertised capabilities,
//! when the coordinator is built. Requests never re-inspect the source.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use configs::{DiscoveryConfig, StrategyPreference};

use crate::errors::ServiceError;
use crate::geo::{distance_km, BoundingBox, Coordinate};
use crate::source::{GeoCapabilities, GeoRecordSource, Located};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProximityQuery {
    pub center: Coordinate,
    pub radius_km: f64,
}

impl ProximityQuery {
    pub fn new(center: Coordinate, radius_km: f64) -> Result<Self, ServiceError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(ServiceError::Validation(format!("radius_km must be positive, got {radius_km}")));
        }
        Ok(Self { center, radius_km })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProximityResult<R> {
    pub record: R,
    pub distance_km: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Source evaluates the radius itself; results are trusted as exact.
    SpatialIndex,
    /// Rectangular prefilter in the source, exact trim here.
    BoundingBox,
    /// Every located record, exact filter here. O(n).
    FullScan,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::SpatialIndex => "spatial_index",
            SearchStrategy::BoundingBox => "bounding_box",
            SearchStrategy::FullScan => "full_scan",
        }
    }

    pub fn is_supported_by(&self, caps: GeoCapabilities) -> bool {
        match self {
            SearchStrategy::SpatialIndex => caps.spatial_query,
            SearchStrategy::BoundingBox => caps.coordinate_range,
            SearchStrategy::FullScan => true,
        }
    }

    /// Best strategy the capabilities allow.
    pub fn best_for(caps: GeoCapabilities) -> Self {
        if caps.spatial_query {
            SearchStrategy::SpatialIndex
        } else if caps.coordinate_range {
            SearchStrategy::BoundingBox
        } else {
            SearchStrategy::FullScan
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

pub struct ProximitySearchCoordinator<S> {
    source: Arc<S>,
    strategy: SearchStrategy,
    default_radius_km: f64,
    max_radius_km: f64,
}

impl<S> Clone for ProximitySearchCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            strategy: self.strategy,
            default_radius_km: self.default_radius_km,
            max_radius_km: self.max_radius_km,
        }
    }
}

impl<S: GeoRecordSource> ProximitySearchCoordinator<S> {
    /// Build with an explicit strategy; fails if the source cannot run it.
    pub fn new(source: Arc<S>, strategy: SearchStrategy, cfg: DiscoveryConfig) -> Result<Self, ServiceError> {
        let caps = source.capabilities();
        if !strategy.is_supported_by(caps) {
            return Err(ServiceError::StrategyUnavailable(format!(
                "{strategy} not supported by source ({caps:?})"
            )));
        }
        Ok(Self { source, strategy, default_radius_km: cfg.default_radius_km, max_radius_km: cfg.max_radius_km })
    }

    /// Resolve `cfg.strategy` against the source's capabilities. A preference
    /// the source cannot honour falls back to the best supported strategy.
    pub fn probe(source: Arc<S>, cfg: DiscoveryConfig) -> Self {
        let caps = source.capabilities();
        let best = SearchStrategy::best_for(caps);
        let wanted = match cfg.strategy {
            StrategyPreference::Auto => best,
            StrategyPreference::SpatialIndex => SearchStrategy::SpatialIndex,
            StrategyPreference::BoundingBox => SearchStrategy::BoundingBox,
            StrategyPreference::FullScan => SearchStrategy::FullScan,
        };
        let strategy = if wanted.is_supported_by(caps) {
            wanted
        } else {
            let err = ServiceError::StrategyUnavailable(format!("{wanted} not supported by source ({caps:?})"));
            warn!(requested = %wanted, fallback = %best, error = %err, "proximity strategy unavailable, falling back");
            best
        };
        info!(%strategy, ?caps, "proximity strategy selected");
        Self { source, strategy, default_radius_km: cfg.default_radius_km, max_radius_km: cfg.max_radius_km }
    }

    pub fn strategy(&self) -> SearchStrategy { self.strategy }

    pub fn default_radius_km(&self) -> f64 { self.default_radius_km }

    pub fn source(&self) -> &Arc<S> { &self.source }

    /// Records within the radius, nearest first. Records without a location
    /// never match. No matches is an empty list.
    #[instrument(skip_all, fields(strategy = %self.strategy, lat = center.lat(), lng = center.lng(), radius_km = ?radius_km))]
    pub async fn find_nearby(
        &self,
        center: Coordinate,
        radius_km: Option<f64>,
        filter: &S::Filter,
    ) -> Result<Vec<ProximityResult<S::Record>>, ServiceError> {
        let query = ProximityQuery::new(center, radius_km.unwrap_or(self.default_radius_km))?;
        if query.radius_km > self.max_radius_km {
            return Err(ServiceError::Validation(format!(
                "radius_km {} exceeds maximum {}",
                query.radius_km, self.max_radius_km
            )));
        }

        let results = match self.strategy {
            SearchStrategy::SpatialIndex => {
                self.source.fetch_within_radius(query.center, query.radius_km, filter).await?
            }
            SearchStrategy::BoundingBox => {
                let bbox = BoundingBox::around(query.center, query.radius_km);
                let candidates = self.source.fetch_by_coordinate_range(&bbox, filter).await?;
                debug!(candidates = candidates.len(), wraps = bbox.wraps_antimeridian(), "bounding box candidates");
                rank_within(query, candidates)
            }
            SearchStrategy::FullScan => {
                let candidates = self.source.fetch_located(filter).await?;
                debug!(candidates = candidates.len(), "full scan candidates");
                rank_within(query, candidates)
            }
        };
        debug!(matched = results.len(), "proximity search done");
        Ok(results)
    }
}

/// Exact distance per candidate, drop those outside the radius, nearest first.
fn rank_within<R: Located>(query: ProximityQuery, candidates: Vec<R>) -> Vec<ProximityResult<R>> {
    let mut out: Vec<ProximityResult<R>> = candidates
        .into_iter()
        .filter_map(|record| {
            let d = distance_km(query.center, record.location()?);
            (d <= query.radius_km).then_some(ProximityResult { record, distance_km: d })
        })
        .collect();
    out.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    out
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::geo::EARTH_RADIUS_KM;
    use crate::pagination::{Keyed, SortKey, SortValue};
    use crate::source::{InMemoryRecordSource, MemoryFilter};

    #[derive(Clone, Debug, PartialEq)]
    struct Shop {
        id: Uuid,
        name: &'static str,
        at: Option<Coordinate>,
    }

    impl Keyed for Shop {
        fn sort_key(&self) -> SortKey { SortKey::new(SortValue::Text(self.name.into()), self.id) }
    }

    impl Located for Shop {
        fn location(&self) -> Option<Coordinate> { self.at }
    }

    const CENTER: (f64, f64) = (6.5244, 3.3792);

    fn center() -> Coordinate { Coordinate::new(CENTER.0, CENTER.1).unwrap() }

    /// Point `km` due north of the center.
    fn north_of_center(km: f64) -> Coordinate {
        Coordinate::new(CENTER.0 + (km / EARTH_RADIUS_KM).to_degrees(), CENTER.1).unwrap()
    }

    fn shops() -> Vec<Shop> {
        vec![
            Shop { id: Uuid::new_v4(), name: "ten", at: Some(north_of_center(10.0)) },
            Shop { id: Uuid::new_v4(), name: "four", at: Some(north_of_center(4.0)) },
            Shop { id: Uuid::new_v4(), name: "nowhere", at: None },
            Shop { id: Uuid::new_v4(), name: "one", at: Some(north_of_center(1.0)) },
        ]
    }

    fn caps(spatial_query: bool, coordinate_range: bool) -> GeoCapabilities {
        GeoCapabilities { spatial_query, coordinate_range }
    }

    fn coordinator(c: GeoCapabilities, strategy: SearchStrategy) -> ProximitySearchCoordinator<InMemoryRecordSource<Shop>> {
        let source = Arc::new(InMemoryRecordSource::new(shops()).with_capabilities(c));
        ProximitySearchCoordinator::new(source, strategy, DiscoveryConfig::default()).unwrap()
    }

    fn names(results: &[ProximityResult<Shop>]) -> Vec<&'static str> {
        results.iter().map(|r| r.record.name).collect()
    }

    #[tokio::test]
    async fn every_strategy_returns_same_ordered_matches() {
        let all = caps(true, true);
        for strategy in [SearchStrategy::SpatialIndex, SearchStrategy::BoundingBox, SearchStrategy::FullScan] {
            let coord = coordinator(all, strategy);
            let found = coord.find_nearby(center(), Some(5.0), &MemoryFilter::all()).await.unwrap();
            assert_eq!(names(&found), vec!["one", "four"], "{strategy}");
            assert!((found[0].distance_km - 1.0).abs() < 1e-6);
            assert!((found[1].distance_km - 4.0).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn default_radius_applies_when_absent() {
        let coord = coordinator(caps(false, true), SearchStrategy::BoundingBox);
        let found = coord.find_nearby(center(), None, &MemoryFilter::all()).await.unwrap();
        assert_eq!(names(&found), vec!["one", "four"]);
    }

    #[tokio::test]
    async fn filter_is_applied() {
        let coord = coordinator(caps(false, false), SearchStrategy::FullScan);
        let filter = MemoryFilter::new(|s: &Shop| s.name != "one");
        let found = coord.find_nearby(center(), Some(50.0), &filter).await.unwrap();
        assert_eq!(names(&found), vec!["four", "ten"]);
    }

    #[tokio::test]
    async fn no_matches_is_empty_not_error() {
        let coord = coordinator(caps(false, true), SearchStrategy::BoundingBox);
        let far = Coordinate::new(-33.8688, 151.2093).unwrap();
        assert!(coord.find_nearby(far, Some(5.0), &MemoryFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_radius_is_rejected() {
        let coord = coordinator(caps(false, true), SearchStrategy::BoundingBox);
        for r in [0.0, -1.0, f64::NAN, 10_000.0] {
            let err = coord.find_nearby(center(), Some(r), &MemoryFilter::all()).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{r}");
        }
    }

    #[tokio::test]
    async fn data_source_failure_propagates() {
        let coord = coordinator(caps(false, true), SearchStrategy::BoundingBox);
        coord.source().set_unavailable(true);
        let err = coord.find_nearby(center(), Some(5.0), &MemoryFilter::all()).await.unwrap_err();
        assert!(matches!(err, ServiceError::DataSource { operation: "fetch_by_coordinate_range", .. }));
    }

    #[test]
    fn explicit_unsupported_strategy_is_refused() {
        let source = Arc::new(InMemoryRecordSource::new(shops()).with_capabilities(caps(false, true)));
        let err = ProximitySearchCoordinator::new(source, SearchStrategy::SpatialIndex, DiscoveryConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ServiceError::StrategyUnavailable(_)));
    }

    #[test]
    fn probe_prefers_most_capable_strategy() {
        let cases = [
            (caps(true, true), SearchStrategy::SpatialIndex),
            (caps(false, true), SearchStrategy::BoundingBox),
            (caps(false, false), SearchStrategy::FullScan),
        ];
        for (c, expected) in cases {
            let source = Arc::new(InMemoryRecordSource::new(shops()).with_capabilities(c));
            assert_eq!(ProximitySearchCoordinator::probe(source, DiscoveryConfig::default()).strategy(), expected);
        }
    }

    #[test]
    fn probe_falls_back_from_unsupported_preference() {
        let source = Arc::new(InMemoryRecordSource::new(shops()).with_capabilities(caps(false, false)));
        let cfg = DiscoveryConfig { strategy: StrategyPreference::SpatialIndex, ..DiscoveryConfig::default() };
        assert_eq!(ProximitySearchCoordinator::probe(source, cfg).strategy(), SearchStrategy::FullScan);

        let source = Arc::new(InMemoryRecordSource::new(shops()).with_capabilities(caps(true, true)));
        let cfg = DiscoveryConfig { strategy: StrategyPreference::FullScan, ..DiscoveryConfig::default() };
        assert_eq!(ProximitySearchCoordinator::probe(source, cfg).strategy(), SearchStrategy::FullScan);
    }

    #[test]
    fn records_across_antimeridian_are_found() {
        let center = Coordinate::new(0.0, 179.99).unwrap();
        let over = Coordinate::new(0.0, -179.99).unwrap();
        let shop = Shop { id: Uuid::new_v4(), name: "over", at: Some(over) };
        let query = ProximityQuery::new(center, 5.0).unwrap();
        let bbox = BoundingBox::around(center, 5.0);
        assert!(bbox.contains(over));
        assert_eq!(rank_within(query, vec![shop]).len(), 1);
    }
}

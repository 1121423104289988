//! Vec-backed record source for tests, benches and small deployments.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{GeoCapabilities, GeoRecordSource, Located, RecordSource};
use crate::discovery::ProximityResult;
use crate::errors::ServiceError;
use crate::geo::{distance_km, BoundingBox, Coordinate};
use crate::pagination::{Keyed, SortKey, SortSpec};

/// Predicate over in-memory records.
pub struct MemoryFilter<T>(Arc<dyn Fn(&T) -> bool + Send + Sync>);

impl<T> MemoryFilter<T> {
    pub fn new(pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self { Self(Arc::new(pred)) }

    pub fn all() -> Self { Self(Arc::new(|_| true)) }

    pub fn matches(&self, record: &T) -> bool { (self.0)(record) }
}

impl<T> Clone for MemoryFilter<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Default for MemoryFilter<T> {
    fn default() -> Self { Self::all() }
}

impl<T> fmt::Debug for MemoryFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("MemoryFilter") }
}

pub struct InMemoryRecordSource<T> {
    records: RwLock<Vec<T>>,
    sort: SortSpec,
    capabilities: GeoCapabilities,
    unavailable: AtomicBool,
}

impl<T: Keyed + Clone + Send + Sync> InMemoryRecordSource<T> {
    /// Source listing newest-first with range queries but no spatial index.
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records: RwLock::new(records),
            sort: SortSpec::desc(),
            capabilities: GeoCapabilities { spatial_query: false, coordinate_range: true },
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_capabilities(mut self, capabilities: GeoCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub async fn insert(&self, record: T) { self.records.write().await.push(record); }

    /// Remove by id; returns whether a record was removed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.sort_key().id != id);
        records.len() != before
    }

    pub async fn len(&self) -> usize { self.records.read().await.len() }

    /// Make every subsequent call fail as a store outage would.
    pub fn set_unavailable(&self, unavailable: bool) { self.unavailable.store(unavailable, Ordering::SeqCst); }

    fn check(&self, operation: &'static str) -> Result<(), ServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::data_source(operation, "store unavailable"));
        }
        Ok(())
    }

    async fn sorted(&self, filter: &MemoryFilter<T>, sort: SortSpec) -> Vec<T> {
        let records = self.records.read().await;
        let mut out: Vec<T> = records.iter().filter(|r| filter.matches(r)).cloned().collect();
        out.sort_by(|a, b| a.sort_key().cmp_in(&b.sort_key(), sort.direction));
        out
    }
}

#[async_trait]
impl<T> RecordSource for InMemoryRecordSource<T>
where
    T: Keyed + Clone + Send + Sync + 'static,
{
    type Record = T;
    type Filter = MemoryFilter<T>;

    fn sort_spec(&self) -> SortSpec { self.sort }

    async fn fetch_ordered(
        &self,
        filter: &MemoryFilter<T>,
        sort: SortSpec,
        start_after: Option<&SortKey>,
        limit: u64,
    ) -> Result<Vec<T>, ServiceError> {
        self.check("fetch_ordered")?;
        let sorted = self.sorted(filter, sort).await;
        let page = sorted
            .into_iter()
            .filter(|r| match start_after {
                Some(after) => r.sort_key().cmp_in(after, sort.direction).is_gt(),
                None => true,
            })
            .take(limit as usize)
            .collect();
        Ok(page)
    }

    async fn fetch_offset(
        &self,
        filter: &MemoryFilter<T>,
        sort: SortSpec,
        skip: u64,
        take: u64,
    ) -> Result<Vec<T>, ServiceError> {
        self.check("fetch_offset")?;
        let sorted = self.sorted(filter, sort).await;
        Ok(sorted.into_iter().skip(skip as usize).take(take as usize).collect())
    }

    async fn count(&self, filter: &MemoryFilter<T>) -> Result<u64, ServiceError> {
        self.check("count")?;
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(r)).count() as u64)
    }
}

#[async_trait]
impl<T> GeoRecordSource for InMemoryRecordSource<T>
where
    T: Keyed + Located + Clone + Send + Sync + 'static,
{
    type Record = T;
    type Filter = MemoryFilter<T>;

    fn capabilities(&self) -> GeoCapabilities { self.capabilities }

    async fn fetch_within_radius(
        &self,
        center: Coordinate,
        radius_km: f64,
        filter: &MemoryFilter<T>,
    ) -> Result<Vec<ProximityResult<T>>, ServiceError> {
        if !self.capabilities.spatial_query {
            return Err(ServiceError::StrategyUnavailable("spatial query disabled".into()));
        }
        self.check("fetch_within_radius")?;
        let records = self.records.read().await;
        let mut out: Vec<ProximityResult<T>> = records
            .iter()
            .filter(|r| filter.matches(r))
            .filter_map(|r| {
                let d = distance_km(center, r.location()?);
                (d <= radius_km).then(|| ProximityResult { record: r.clone(), distance_km: d })
            })
            .collect();
        out.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Ok(out)
    }

    async fn fetch_by_coordinate_range(&self, bbox: &BoundingBox, filter: &MemoryFilter<T>) -> Result<Vec<T>, ServiceError> {
        if !self.capabilities.coordinate_range {
            return Err(ServiceError::StrategyUnavailable("coordinate range disabled".into()));
        }
        self.check("fetch_by_coordinate_range")?;
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| filter.matches(r) && r.location().is_some_and(|c| bbox.contains(c)))
            .cloned()
            .collect())
    }

    async fn fetch_located(&self, filter: &MemoryFilter<T>) -> Result<Vec<T>, ServiceError> {
        self.check("fetch_located")?;
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(r) && r.location().is_some()).cloned().collect())
    }
}

//! Record-source abstraction consumed by pagination and discovery.
//!
//! Listing needs ordered seeks and counts ([`RecordSource`]); discovery adds
//! location queries whose availability a source advertises up front
//! ([`GeoRecordSource::capabilities`]).

pub mod memory;
pub mod related;
pub mod seaorm;
pub mod technician_geo;

use async_trait::async_trait;

use crate::discovery::ProximityResult;
use crate::errors::ServiceError;
use crate::geo::{BoundingBox, Coordinate};
use crate::pagination::{Keyed, SortKey, SortSpec};

pub use memory::{InMemoryRecordSource, MemoryFilter};
pub use related::{BookmarkWithTechnician, Embed, EmbeddingRecordSource, ReviewWithParties, TechnicianWithUser};
pub use seaorm::{CursorEntity, SeaOrmRecordSource};
pub use technician_geo::{LocatedTechnician, SeaOrmTechnicianGeoSource};

#[async_trait]
pub trait RecordSource: Send + Sync {
    type Record: Keyed + Clone + Send + Sync;
    type Filter: Send + Sync;

    /// Default ordering of this source's listing.
    fn sort_spec(&self) -> SortSpec;

    /// Up to `limit` records in `sort` order, strictly after `start_after`.
    async fn fetch_ordered(
        &self,
        filter: &Self::Filter,
        sort: SortSpec,
        start_after: Option<&SortKey>,
        limit: u64,
    ) -> Result<Vec<Self::Record>, ServiceError>;

    async fn fetch_offset(
        &self,
        filter: &Self::Filter,
        sort: SortSpec,
        skip: u64,
        take: u64,
    ) -> Result<Vec<Self::Record>, ServiceError>;

    async fn count(&self, filter: &Self::Filter) -> Result<u64, ServiceError>;
}

/// A record that may carry a position.
pub trait Located {
    fn location(&self) -> Option<Coordinate>;
}

/// What a geo source can evaluate natively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeoCapabilities {
    /// Indexed "within distance" predicate with exact distances.
    pub spatial_query: bool,
    /// Lat/lng range predicate.
    pub coordinate_range: bool,
}

#[async_trait]
pub trait GeoRecordSource: Send + Sync {
    type Record: Located + Clone + Send + Sync;
    type Filter: Send + Sync;

    fn capabilities(&self) -> GeoCapabilities;

    /// Records within `radius_km` of `center`, ascending by distance.
    async fn fetch_within_radius(
        &self,
        _center: Coordinate,
        _radius_km: f64,
        _filter: &Self::Filter,
    ) -> Result<Vec<ProximityResult<Self::Record>>, ServiceError> {
        Err(ServiceError::StrategyUnavailable("source has no spatial query".into()))
    }

    async fn fetch_by_coordinate_range(
        &self,
        _bbox: &BoundingBox,
        _filter: &Self::Filter,
    ) -> Result<Vec<Self::Record>, ServiceError> {
        Err(ServiceError::StrategyUnavailable("source has no coordinate range query".into()))
    }

    /// Every record with a non-null location.
    async fn fetch_located(&self, filter: &Self::Filter) -> Result<Vec<Self::Record>, ServiceError>;
}

#[cfg(test)]
mod db_tests;

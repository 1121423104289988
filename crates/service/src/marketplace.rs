//! Listing executors and the proximity coordinator, wired from configuration.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::{info, warn};
use uuid::Uuid;

use configs::{DiscoveryConfig, PaginationConfig};
use models::{service, service_category, technician, user};

use crate::discovery::{ProximityResult, ProximitySearchCoordinator, SearchStrategy};
use crate::errors::ServiceError;
use crate::filters::{BookmarkFilter, TechnicianFilter};
use crate::geo::Coordinate;
use crate::pagination::{OffsetPageRequest, OffsetPageResult, PageLimits, PageRequest, PageResult, PaginatedQueryExecutor};
use crate::source::{
    BookmarkWithTechnician, CursorEntity, EmbeddingRecordSource, LocatedTechnician, ReviewWithParties,
    SeaOrmRecordSource, SeaOrmTechnicianGeoSource,
};

pub type Listing<E> = PaginatedQueryExecutor<SeaOrmRecordSource<E>>;
pub type EmbeddedListing<T> = PaginatedQueryExecutor<EmbeddingRecordSource<T>>;

/// Everything a request handler needs. Built once at startup; cheap to share.
pub struct Marketplace {
    pub technicians: Listing<technician::Entity>,
    pub services: Listing<service::Entity>,
    pub reviews: EmbeddedListing<ReviewWithParties>,
    pub bookmarks: EmbeddedListing<BookmarkWithTechnician>,
    pub users: Listing<user::Entity>,
    pub categories: Listing<service_category::Entity>,
    pub nearby: ProximitySearchCoordinator<SeaOrmTechnicianGeoSource>,
    db: DatabaseConnection,
}

fn listing<E>(db: &DatabaseConnection, limits: PageLimits) -> Listing<E>
where
    E: CursorEntity,
    E::Model: crate::pagination::Keyed + Clone + Send + Sync,
{
    PaginatedQueryExecutor::new(Arc::new(SeaOrmRecordSource::new(db.clone())), limits)
}

impl Marketplace {
    /// Build from a known geo source; no I/O.
    pub fn new(
        db: DatabaseConnection,
        geo: SeaOrmTechnicianGeoSource,
        pagination: PaginationConfig,
        discovery: DiscoveryConfig,
    ) -> Self {
        let limits = PageLimits::from(pagination);
        Self {
            technicians: listing(&db, limits),
            services: listing(&db, limits),
            reviews: PaginatedQueryExecutor::new(Arc::new(EmbeddingRecordSource::new(db.clone())), limits),
            bookmarks: PaginatedQueryExecutor::new(Arc::new(EmbeddingRecordSource::new(db.clone())), limits),
            users: listing(&db, limits),
            categories: listing(&db, limits),
            nearby: ProximitySearchCoordinator::probe(Arc::new(geo), discovery),
            db,
        }
    }

    /// Probe the store's spatial support, then build. A failed probe is
    /// logged and treated as "no PostGIS".
    pub async fn connect(db: DatabaseConnection, pagination: PaginationConfig, discovery: DiscoveryConfig) -> Self {
        let geo = match SeaOrmTechnicianGeoSource::probe(db.clone()).await {
            Ok(geo) => geo,
            Err(err) => {
                warn!(error = %err, "postgis probe failed, spatial strategy disabled");
                SeaOrmTechnicianGeoSource::new(db.clone(), false)
            }
        };
        let marketplace = Self::new(db, geo, pagination, discovery);
        info!(
            strategy = %marketplace.nearby_strategy(),
            default_limit = pagination.default_limit,
            max_limit = pagination.max_limit,
            "marketplace ready"
        );
        marketplace
    }

    pub fn nearby_strategy(&self) -> SearchStrategy { self.nearby.strategy() }

    pub async fn find_nearby_technicians(
        &self,
        center: Coordinate,
        radius_km: Option<f64>,
        filter: &TechnicianFilter,
    ) -> Result<Vec<ProximityResult<LocatedTechnician>>, ServiceError> {
        self.nearby.find_nearby(center, radius_km, filter).await
    }

    /// Cursor page of a user's bookmarks. An empty page for a user that does
    /// not exist is `NotFound`.
    pub async fn user_bookmarks(
        &self,
        req: PageRequest<BookmarkFilter>,
    ) -> Result<PageResult<BookmarkWithTechnician>, ServiceError> {
        let user_id = req.filter.user_id;
        let req = PageRequest { cursor: req.cursor, limit: req.limit, filter: req.filter.condition() };
        let page = self.bookmarks.list_page(&req).await?;
        if page.items.is_empty() {
            self.ensure_user(user_id).await?;
        }
        Ok(page)
    }

    /// Offset variant of [`Marketplace::user_bookmarks`].
    pub async fn user_bookmarks_offset(
        &self,
        req: OffsetPageRequest<BookmarkFilter>,
    ) -> Result<OffsetPageResult<BookmarkWithTechnician>, ServiceError> {
        let user_id = req.filter.user_id;
        let req = OffsetPageRequest { skip: req.skip, take: req.take, filter: req.filter.condition() };
        let page = self.bookmarks.list_page_offset(&req).await?;
        if page.items.is_empty() {
            self.ensure_user(user_id).await?;
        }
        Ok(page)
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let found = user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::data_source("find_user", e))?;
        match found {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found(&format!("user {user_id}"))),
        }
    }
}

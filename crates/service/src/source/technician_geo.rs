//! Technicians joined with their location, for proximity search.

use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult,
    QueryFilter, Statement,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use models::{location, technician};

use super::{GeoCapabilities, GeoRecordSource, Located};
use crate::discovery::ProximityResult;
use crate::errors::ServiceError;
use crate::filters::TechnicianFilter;
use crate::geo::{BoundingBox, Coordinate};
use crate::pagination::{Keyed, SortKey};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocatedTechnician {
    #[serde(flatten)]
    pub technician: technician::Model,
    pub location: Option<Coordinate>,
}

impl LocatedTechnician {
    /// Stored coordinates outside the valid domain are treated as no location.
    fn from_parts(technician: technician::Model, lat_lng: Option<(f64, f64)>) -> Self {
        let location = lat_lng.and_then(|(lat, lng)| match Coordinate::new(lat, lng) {
            Ok(c) => Some(c),
            Err(err) => {
                warn!(technician_id = %technician.id, error = %err, "ignoring stored location");
                None
            }
        });
        Self { technician, location }
    }
}

impl Located for LocatedTechnician {
    fn location(&self) -> Option<Coordinate> { self.location }
}

impl Keyed for LocatedTechnician {
    fn sort_key(&self) -> SortKey { self.technician.sort_key() }
}

#[derive(Debug, FromQueryResult)]
struct NearbyRow {
    id: Uuid,
    user_id: Uuid,
    profession: String,
    business_name: Option<String>,
    bio: Option<String>,
    profile_picture: Option<String>,
    years_experience: Option<i32>,
    availability: String,
    created_at: DateTimeWithTimeZone,
    updated_at: DateTimeWithTimeZone,
    lat: f64,
    lng: f64,
    distance_km: f64,
}

impl NearbyRow {
    /// `None` when the stored location is invalid, matching the range and
    /// scan strategies, which skip unlocated records.
    fn into_result(self) -> Option<ProximityResult<LocatedTechnician>> {
        let (distance_km, lat_lng) = (self.distance_km, (self.lat, self.lng));
        let technician = technician::Model {
            id: self.id,
            user_id: self.user_id,
            profession: self.profession,
            business_name: self.business_name,
            bio: self.bio,
            profile_picture: self.profile_picture,
            years_experience: self.years_experience,
            availability: self.availability,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        let record = LocatedTechnician::from_parts(technician, Some(lat_lng));
        record.location?;
        Some(ProximityResult { record, distance_km })
    }
}

#[derive(Debug, FromQueryResult)]
struct ExtensionRow {
    present: bool,
}

// Sphere distance (use_spheroid = false) keeps results consistent with the
// haversine used by the other strategies.
const NEARBY_SQL: &str = r#"
SELECT t.id, t.user_id, t.profession, t.business_name, t.bio, t.profile_picture,
       t.years_experience, t.availability, t.created_at, t.updated_at,
       l.lat, l.lng,
       ST_Distance(
           ST_MakePoint(l.lng, l.lat)::geography,
           ST_MakePoint($1, $2)::geography,
           false
       ) / 1000.0 AS distance_km
FROM technician t
JOIN location l ON l.technician_id = t.id
WHERE ST_DWithin(
          ST_MakePoint(l.lng, l.lat)::geography,
          ST_MakePoint($1, $2)::geography,
          $3,
          false
      )
  AND ($4::text IS NULL
       OR lower(coalesce(t.business_name, '')) LIKE $4
       OR lower(t.profession) LIKE $4
       OR lower(coalesce(t.bio, '')) LIKE $4)
  AND ($5::text IS NULL OR t.availability = $5)
ORDER BY distance_km, t.id
"#;

/// Technician geo source over PostgreSQL. The spatial strategy needs the
/// PostGIS extension; range and scan queries work on plain lat/lng columns.
#[derive(Clone)]
pub struct SeaOrmTechnicianGeoSource {
    db: DatabaseConnection,
    postgis: bool,
}

impl SeaOrmTechnicianGeoSource {
    pub fn new(db: DatabaseConnection, postgis: bool) -> Self { Self { db, postgis } }

    /// Check once whether PostGIS is installed.
    pub async fn probe(db: DatabaseConnection) -> Result<Self, ServiceError> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM pg_extension WHERE extname = 'postgis') AS present",
        );
        let row = ExtensionRow::find_by_statement(stmt)
            .one(&db)
            .await
            .map_err(|e| ServiceError::data_source("probe_postgis", e))?;
        let postgis = row.is_some_and(|r| r.present);
        info!(postgis, backend = ?db.get_database_backend(), "technician geo source probed");
        Ok(Self::new(db, postgis))
    }

    fn lng_condition(bbox: &BoundingBox) -> Condition {
        if bbox.wraps_antimeridian() {
            Condition::any()
                .add(location::Column::Lng.gte(bbox.lng_min))
                .add(location::Column::Lng.lte(bbox.lng_max))
        } else {
            Condition::all().add(location::Column::Lng.between(bbox.lng_min, bbox.lng_max))
        }
    }

    async fn located(
        &self,
        extra: Condition,
        filter: &TechnicianFilter,
        operation: &'static str,
    ) -> Result<Vec<LocatedTechnician>, ServiceError> {
        let rows = technician::Entity::find()
            .find_also_related(location::Entity)
            .filter(filter.condition())
            .filter(location::Column::Lat.is_not_null())
            .filter(extra)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::data_source(operation, e))?;
        Ok(rows.into_iter().map(|(t, l)| LocatedTechnician::from_parts(t, l.map(|l| (l.lat, l.lng)))).collect())
    }
}

#[async_trait]
impl GeoRecordSource for SeaOrmTechnicianGeoSource {
    type Record = LocatedTechnician;
    type Filter = TechnicianFilter;

    fn capabilities(&self) -> GeoCapabilities {
        GeoCapabilities { spatial_query: self.postgis, coordinate_range: true }
    }

    async fn fetch_within_radius(
        &self,
        center: Coordinate,
        radius_km: f64,
        filter: &TechnicianFilter,
    ) -> Result<Vec<ProximityResult<LocatedTechnician>>, ServiceError> {
        if !self.postgis {
            return Err(ServiceError::StrategyUnavailable("postgis extension not installed".into()));
        }
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            NEARBY_SQL,
            [
                center.lng().into(),
                center.lat().into(),
                (radius_km * 1000.0).into(),
                filter.search_pattern().into(),
                filter.availability.clone().into(),
            ],
        );
        let rows = NearbyRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::data_source("fetch_within_radius", e))?;
        Ok(rows.into_iter().filter_map(NearbyRow::into_result).collect())
    }

    async fn fetch_by_coordinate_range(
        &self,
        bbox: &BoundingBox,
        filter: &TechnicianFilter,
    ) -> Result<Vec<LocatedTechnician>, ServiceError> {
        let range = Condition::all()
            .add(location::Column::Lat.between(bbox.lat_min, bbox.lat_max))
            .add(Self::lng_condition(bbox));
        self.located(range, filter, "fetch_by_coordinate_range").await
    }

    async fn fetch_located(&self, filter: &TechnicianFilter) -> Result<Vec<LocatedTechnician>, ServiceError> {
        self.located(Condition::all(), filter, "fetch_located").await
    }
}

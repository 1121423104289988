use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use models::technician;
use service::discovery::ProximityResult;
use service::filters::TechnicianFilter;
use service::geo::Coordinate;
use service::pagination::{OffsetPageResult, PageResult};
use service::source::LocatedTechnician;

use super::listings::{cursor_page, offset_page, CursorParams, OffsetParams};
use crate::{errors::JsonApiError, metrics, state::ServerState};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TechnicianParams {
    /// Matches business name, profession or bio.
    pub filter: Option<String>,
    /// AVAILABLE, BUSY or UNAVAILABLE (any case).
    pub availability: Option<String>,
}

impl TechnicianParams {
    fn into_filter(self) -> Result<TechnicianFilter, JsonApiError> {
        Ok(TechnicianFilter::new(self.filter, self.availability.as_deref())?)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyParams {
    pub lat: f64,
    pub lng: f64,
    /// Defaults to the configured discovery radius.
    pub radius_km: Option<f64>,
}

#[utoipa::path(get, path = "/api/technicians", tag = "technicians", params(CursorParams, TechnicianParams),
    responses((status = 200, description = "Page of technicians, newest first"), (status = 400, description = "Invalid cursor, limit or availability")))]
pub async fn list(
    State(state): State<ServerState>,
    Query(page): Query<CursorParams>,
    Query(f): Query<TechnicianParams>,
) -> Result<Json<PageResult<technician::Model>>, JsonApiError> {
    let filter = f.into_filter()?;
    cursor_page("technician", &state.marketplace.technicians, page, filter.condition()).await
}

#[utoipa::path(get, path = "/api/technicians/offset", tag = "technicians", params(OffsetParams, TechnicianParams),
    responses((status = 200, description = "Offset page of technicians"), (status = 400, description = "Invalid skip, take or availability")))]
pub async fn list_offset(
    State(state): State<ServerState>,
    Query(page): Query<OffsetParams>,
    Query(f): Query<TechnicianParams>,
) -> Result<Json<OffsetPageResult<technician::Model>>, JsonApiError> {
    let filter = f.into_filter()?;
    offset_page("technician", &state.marketplace.technicians, page, filter.condition()).await
}

#[utoipa::path(get, path = "/api/technicians/nearby", tag = "technicians", params(NearbyParams, TechnicianParams),
    responses(
        (status = 200, description = "Technicians within the radius, nearest first"),
        (status = 400, description = "Invalid coordinate or radius"),
        (status = 503, description = "Store unavailable, retry")
    ))]
pub async fn nearby(
    State(state): State<ServerState>,
    Query(q): Query<NearbyParams>,
    Query(f): Query<TechnicianParams>,
) -> Result<Json<Vec<ProximityResult<LocatedTechnician>>>, JsonApiError> {
    let center = Coordinate::new(q.lat, q.lng)?;
    let filter = f.into_filter()?;
    let strategy = state.marketplace.nearby_strategy();
    metrics::NEARBY_REQUESTS.with_label_values(&[strategy.as_str()]).inc();

    let found = state.marketplace.find_nearby_technicians(center, q.radius_km, &filter).await?;
    metrics::NEARBY_RESULTS.observe(found.len() as f64);
    info!(%strategy, matched = found.len(), "nearby technicians");
    Ok(Json(found))
}

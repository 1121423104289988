//! Cursor and offset listings for services, reviews, users, bookmarks and
//! service categories, plus the shared page helpers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use sea_orm::Condition;
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use uuid::Uuid;

use models::{service_category, user};
use service::filters::{BookmarkFilter, CategoryFilter, ReviewFilter, ServiceFilter, UserFilter};
use service::pagination::{
    Cursor, OffsetPageRequest, OffsetPageResult, PageLimits, PageRequest, PageResult, PaginatedQueryExecutor,
};
use service::source::{BookmarkWithTechnician, RecordSource, ReviewWithParties};

use crate::{errors::JsonApiError, metrics, state::ServerState};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CursorParams {
    /// Opaque token from a previous page's `next_cursor`.
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OffsetParams {
    pub skip: Option<i64>,
    pub take: Option<i64>,
    /// 1-based; takes precedence over `skip` when present.
    pub page: Option<u32>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring.
    pub filter: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ServiceParams {
    pub filter: Option<String>,
    pub technician_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewParams {
    pub filter: Option<String>,
    pub technician_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookmarkParams {
    pub technician_id: Option<Uuid>,
}

impl CursorParams {
    pub(crate) fn into_request<F>(self, filter: F) -> PageRequest<F> {
        PageRequest { cursor: self.cursor.map(Cursor::from_token), limit: self.limit, filter }
    }
}

impl OffsetParams {
    /// `page`/`page_size` win over `skip`/`take` when a page is given.
    pub(crate) fn into_request<F>(self, filter: F, limits: PageLimits) -> OffsetPageRequest<F> {
        match self.page {
            Some(page) => OffsetPageRequest::from_page(page, self.page_size.or(self.take), filter, limits),
            None => OffsetPageRequest::new(self.skip.unwrap_or(0), self.take, filter),
        }
    }
}

pub(crate) async fn cursor_page<S>(
    entity: &'static str,
    listing: &PaginatedQueryExecutor<S>,
    params: CursorParams,
    filter: Condition,
) -> Result<Json<PageResult<S::Record>>, JsonApiError>
where
    S: RecordSource<Filter = Condition>,
    S::Record: Serialize,
{
    metrics::LISTING_REQUESTS.with_label_values(&[entity, "cursor"]).inc();
    Ok(Json(listing.list_page(&params.into_request(filter)).await?))
}

pub(crate) async fn offset_page<S>(
    entity: &'static str,
    listing: &PaginatedQueryExecutor<S>,
    params: OffsetParams,
    filter: Condition,
) -> Result<Json<OffsetPageResult<S::Record>>, JsonApiError>
where
    S: RecordSource<Filter = Condition>,
    S::Record: Serialize,
{
    metrics::LISTING_REQUESTS.with_label_values(&[entity, "offset"]).inc();
    let req = params.into_request(filter, listing.limits());
    Ok(Json(listing.list_page_offset(&req).await?))
}

#[utoipa::path(get, path = "/api/services", tag = "services", params(CursorParams, ServiceParams),
    responses((status = 200, description = "Page of services"), (status = 400, description = "Invalid cursor or limit")))]
pub async fn services(
    State(state): State<ServerState>,
    Query(page): Query<CursorParams>,
    Query(f): Query<ServiceParams>,
) -> Result<Json<PageResult<models::service::Model>>, JsonApiError> {
    let filter = ServiceFilter::new(f.filter, f.technician_id, f.category_id);
    cursor_page("service", &state.marketplace.services, page, filter.condition()).await
}

#[utoipa::path(get, path = "/api/services/offset", tag = "services", params(OffsetParams, ServiceParams),
    responses((status = 200, description = "Offset page of services"), (status = 400, description = "Invalid skip or take")))]
pub async fn services_offset(
    State(state): State<ServerState>,
    Query(page): Query<OffsetParams>,
    Query(f): Query<ServiceParams>,
) -> Result<Json<OffsetPageResult<models::service::Model>>, JsonApiError> {
    let filter = ServiceFilter::new(f.filter, f.technician_id, f.category_id);
    offset_page("service", &state.marketplace.services, page, filter.condition()).await
}

#[utoipa::path(get, path = "/api/reviews", tag = "reviews", params(CursorParams, ReviewParams),
    responses((status = 200, description = "Page of reviews"), (status = 400, description = "Invalid cursor or limit")))]
pub async fn reviews(
    State(state): State<ServerState>,
    Query(page): Query<CursorParams>,
    Query(f): Query<ReviewParams>,
) -> Result<Json<PageResult<ReviewWithParties>>, JsonApiError> {
    let filter = ReviewFilter::new(f.filter, f.technician_id, f.user_id);
    cursor_page("review", &state.marketplace.reviews, page, filter.condition()).await
}

#[utoipa::path(get, path = "/api/reviews/offset", tag = "reviews", params(OffsetParams, ReviewParams),
    responses((status = 200, description = "Offset page of reviews"), (status = 400, description = "Invalid skip or take")))]
pub async fn reviews_offset(
    State(state): State<ServerState>,
    Query(page): Query<OffsetParams>,
    Query(f): Query<ReviewParams>,
) -> Result<Json<OffsetPageResult<ReviewWithParties>>, JsonApiError> {
    let filter = ReviewFilter::new(f.filter, f.technician_id, f.user_id);
    offset_page("review", &state.marketplace.reviews, page, filter.condition()).await
}

#[utoipa::path(get, path = "/api/users", tag = "users", params(CursorParams, SearchParams),
    responses((status = 200, description = "Page of users"), (status = 400, description = "Invalid cursor or limit")))]
pub async fn users(
    State(state): State<ServerState>,
    Query(page): Query<CursorParams>,
    Query(f): Query<SearchParams>,
) -> Result<Json<PageResult<user::Model>>, JsonApiError> {
    cursor_page("user", &state.marketplace.users, page, UserFilter::new(f.filter).condition()).await
}

#[utoipa::path(get, path = "/api/users/offset", tag = "users", params(OffsetParams, SearchParams),
    responses((status = 200, description = "Offset page of users"), (status = 400, description = "Invalid skip or take")))]
pub async fn users_offset(
    State(state): State<ServerState>,
    Query(page): Query<OffsetParams>,
    Query(f): Query<SearchParams>,
) -> Result<Json<OffsetPageResult<user::Model>>, JsonApiError> {
    offset_page("user", &state.marketplace.users, page, UserFilter::new(f.filter).condition()).await
}

#[utoipa::path(get, path = "/api/users/{user_id}/bookmarks", tag = "bookmarks",
    params(("user_id" = Uuid, Path, description = "Owner of the bookmarks"), CursorParams, BookmarkParams),
    responses((status = 200, description = "Page of bookmarks with their technicians"), (status = 400, description = "Invalid cursor or limit"),
        (status = 404, description = "Unknown user")))]
pub async fn bookmarks(
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<CursorParams>,
    Query(f): Query<BookmarkParams>,
) -> Result<Json<PageResult<BookmarkWithTechnician>>, JsonApiError> {
    metrics::LISTING_REQUESTS.with_label_values(&["bookmark", "cursor"]).inc();
    let req = page.into_request(BookmarkFilter::new(user_id, f.technician_id));
    Ok(Json(state.marketplace.user_bookmarks(req).await?))
}

#[utoipa::path(get, path = "/api/users/{user_id}/bookmarks/offset", tag = "bookmarks",
    params(("user_id" = Uuid, Path, description = "Owner of the bookmarks"), OffsetParams, BookmarkParams),
    responses((status = 200, description = "Offset page of bookmarks with their technicians"), (status = 400, description = "Invalid skip or take"),
        (status = 404, description = "Unknown user")))]
pub async fn bookmarks_offset(
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<OffsetParams>,
    Query(f): Query<BookmarkParams>,
) -> Result<Json<OffsetPageResult<BookmarkWithTechnician>>, JsonApiError> {
    metrics::LISTING_REQUESTS.with_label_values(&["bookmark", "offset"]).inc();
    let req = page.into_request(BookmarkFilter::new(user_id, f.technician_id), state.marketplace.bookmarks.limits());
    Ok(Json(state.marketplace.user_bookmarks_offset(req).await?))
}

#[utoipa::path(get, path = "/api/service-categories", tag = "services", params(CursorParams, SearchParams),
    responses((status = 200, description = "Page of categories, by name"), (status = 400, description = "Invalid cursor or limit")))]
pub async fn categories(
    State(state): State<ServerState>,
    Query(page): Query<CursorParams>,
    Query(f): Query<SearchParams>,
) -> Result<Json<PageResult<service_category::Model>>, JsonApiError> {
    cursor_page("service_category", &state.marketplace.categories, page, CategoryFilter::new(f.filter).condition()).await
}

#[utoipa::path(get, path = "/api/service-categories/offset", tag = "services", params(OffsetParams, SearchParams),
    responses((status = 200, description = "Offset page of categories"), (status = 400, description = "Invalid skip or take")))]
pub async fn categories_offset(
    State(state): State<ServerState>,
    Query(page): Query<OffsetParams>,
    Query(f): Query<SearchParams>,
) -> Result<Json<OffsetPageResult<service_category::Model>>, JsonApiError> {
    offset_page("service_category", &state.marketplace.categories, page, CategoryFilter::new(f.filter).condition()).await
}

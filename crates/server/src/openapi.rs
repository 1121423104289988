use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::technicians::list,
        crate::routes::technicians::list_offset,
        crate::routes::technicians::nearby,
        crate::routes::listings::services,
        crate::routes::listings::services_offset,
        crate::routes::listings::reviews,
        crate::routes::listings::reviews_offset,
        crate::routes::listings::users,
        crate::routes::listings::users_offset,
        crate::routes::listings::bookmarks,
        crate::routes::listings::bookmarks_offset,
        crate::routes::listings::categories,
        crate::routes::listings::categories_offset,
    ),
    components(schemas(HealthResponse)),
    tags(
        (name = "health"),
        (name = "technicians"),
        (name = "services"),
        (name = "reviews"),
        (name = "users"),
        (name = "bookmarks")
    )
)]
pub struct ApiDoc;

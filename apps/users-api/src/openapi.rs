use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "League Users API",
        version = "0.1.0",
        description = "Accounts, roles and teams for league members"
    ),
    servers((url = "/api", description = "API base path"))
)]
struct ServiceDoc;

/// Service info plus every users-domain path and component.
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        ServiceDoc::openapi().merge_from(domain_users::ApiDoc::openapi())
    }
}

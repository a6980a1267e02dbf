use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::draw::draw,
        handlers::draw::check,
        handlers::draws::list_allocations,
        handlers::draws::delete_allocation,
        handlers::prizes::list_prizes,
        handlers::admin::reset,
        handlers::admin::reconcile,
    ),
    components(
        schemas(
            LocalizedName,
            Prize,
            Allocation,
            DrawRequest,
            DrawOutcome,
            EligibilityQuery,
            EligibilityResponse,
            StockDiscrepancy,
            ReconcileReport,
            ApiError,
        )
    ),
    tags(
        (name = "draw", description = "Lottery draw API"),
        (name = "draws", description = "Allocation history API"),
        (name = "prizes", description = "Prize catalog API"),
        (name = "admin", description = "Lottery administration API"),
    ),
    info(
        title = "Prize Lottery API",
        version = "1.0.0",
        description = "Prize lottery REST API documentation"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

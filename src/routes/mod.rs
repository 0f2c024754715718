pub mod documents;
pub mod home;
pub mod srs;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        home::root,
        home::health,
        documents::upload_document,
        documents::list_documents,
        documents::get_document,
        documents::process_document,
        documents::delete_document,
        documents::download_document,
        documents::summarize_document,
        documents::analyze_document,
        srs::create_srs,
        srs::list_srs,
        srs::get_srs,
        srs::list_srs_by_document,
        srs::update_srs,
        srs::delete_srs,
    ),
    components(
        schemas(
            home::HealthResponse,
            documents::DocumentResponse,
            documents::UploadResponse,
            documents::SummaryResponse,
            srs::CreateSrsRequest,
            srs::UpdateSrsRequest,
            srs::SrsResponse,
            crate::entities::document::DocumentType,
            crate::entities::document::DocumentStatus,
            crate::models::analysis::DocumentAnalysis,
            crate::models::srs_section::SrsSection,
        )
    ),
    tags(
        (name = "General", description = "Service information and liveness"),
        (name = "Documents", description = "Upload business requirement documents and track their processing"),
        (name = "SRS", description = "Generate and edit SRS records from processed documents")
    ),
    info(
        title = "SRS Forge API",
        version = "0.1.0",
        description = "Turns business requirement documents into Software Requirements Specifications using a generative AI provider",
    )
)]
struct ApiDoc;

pub fn create_routes(state: AppState, max_upload_bytes: usize) -> Router {
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into();

    let document_routes = Router::new()
        .route(
            "/documents",
            post(documents::upload_document).get(documents::list_documents),
        )
        .route(
            "/documents/{id}",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/documents/{id}/process", post(documents::process_document))
        .route("/documents/{id}/download", get(documents::download_document))
        .route("/documents/{id}/summary", get(documents::summarize_document))
        .route("/documents/{id}/analyze", post(documents::analyze_document))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    let srs_routes = Router::new()
        .route("/srs", post(srs::create_srs).get(srs::list_srs))
        .route(
            "/srs/{id}",
            get(srs::get_srs).put(srs::update_srs).delete(srs::delete_srs),
        )
        .route("/srs/document/{document_id}", get(srs::list_srs_by_document));

    let app_routes = Router::new()
        .route("/", get(home::root))
        .route("/health", get(home::health))
        .merge(document_routes)
        .merge(srs_routes)
        .with_state(state);

    Router::new()
        .merge(swagger_router)
        .merge(app_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

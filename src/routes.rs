use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::account_handlers::delete_account_handler;
use crate::catalog_handlers::{
    get_output_types_handler, get_stage_techniques_handler, get_stages_handler, resolve_handler,
};
use crate::errors::ProfolioError;
use crate::generation_handlers::{generate_portfolio_handler, generate_technique_handler};
use crate::remix_handlers::{delete_remix_handler, get_remix_handler, list_remixes_handler, save_remix_handler};
use crate::requirement_handlers::{
    apply_step_handler, create_requirement_handler, delete_requirement_handler, get_recommendations_handler,
    get_requirement_handler, list_requirements_handler, save_result_handler,
};
use crate::result_handlers::{
    delete_result_handler, get_result_handler, list_result_remixes_handler, list_results_handler,
};

async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Extractor failures answer with the same JSON error body as the handlers
fn extractor_errors() -> (web::JsonConfig, web::PathConfig) {
    let json = web::JsonConfig::default()
        .error_handler(|err, _req| ProfolioError::validation("body", err.to_string()).into());
    let path = web::PathConfig::default().error_handler(|err, _req| ProfolioError::NotFound(err.to_string()).into());
    (json, path)
}

/// Register `/health` and every `/api` route
pub fn configure(cfg: &mut web::ServiceConfig) {
    let (json, path) = extractor_errors();
    cfg.app_data(json)
        .app_data(path)
        .route("/health", web::get().to(health_handler))
        .service(
        web::scope("/api")
            // Catalog routes
            .route("/catalog/output-types", web::get().to(get_output_types_handler))
            .route("/catalog/stages", web::get().to(get_stages_handler))
            .route("/catalog/stages/{stage}/techniques", web::get().to(get_stage_techniques_handler))
            .route("/catalog/resolve", web::post().to(resolve_handler))
            // Requirement routes
            .route("/requirements", web::post().to(create_requirement_handler))
            .route("/requirements", web::get().to(list_requirements_handler))
            .route("/requirements/{id}", web::get().to(get_requirement_handler))
            .route("/requirements/{id}", web::delete().to(delete_requirement_handler))
            .route("/requirements/{id}/step", web::put().to(apply_step_handler))
            .route("/requirements/{id}/recommendations", web::get().to(get_recommendations_handler))
            .route("/requirements/{id}/result", web::post().to(save_result_handler))
            // Result routes
            .route("/results", web::get().to(list_results_handler))
            .route("/results/{id}", web::get().to(get_result_handler))
            .route("/results/{id}", web::delete().to(delete_result_handler))
            .route("/results/{id}/remixes", web::get().to(list_result_remixes_handler))
            // Remix routes
            .route("/remixes", web::post().to(save_remix_handler))
            .route("/remixes", web::get().to(list_remixes_handler))
            .route("/remixes/{id}", web::get().to(get_remix_handler))
            .route("/remixes/{id}", web::delete().to(delete_remix_handler))
            // Generation routes
            .route("/generate/technique", web::post().to(generate_technique_handler))
            .route("/generate/portfolio", web::post().to(generate_portfolio_handler))
            // Account routes
            .route("/account", web::delete().to(delete_account_handler)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::tests::Fixture;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health() {
        let fixture = Fixture::new(None);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fixture.state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
    }
}

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app_state::AppState;
use crate::errors::ProfolioError;

// Request body for resolving output types into techniques
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub output_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StageTechniquesResponse {
    pub stage: String,
    pub techniques: Vec<String>,
}

// Handler to list the known output types
pub async fn get_output_types_handler(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.catalog.output_type_names())
}

// Handler to list the process stages in order
pub async fn get_stages_handler(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.catalog.stage_names())
}

// Handler to get the techniques of one stage
pub async fn get_stage_techniques_handler(data: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let stage = path.into_inner();
    let techniques = data.catalog.resolve_for_stage(&stage);
    debug!("Stage {} lists {} techniques", stage, techniques.len());

    HttpResponse::Ok().json(StageTechniquesResponse { stage, techniques })
}

// Handler to resolve output types into a technique list
pub async fn resolve_handler(
    data: web::Data<AppState>,
    body: web::Json<ResolveRequest>,
) -> Result<HttpResponse, ProfolioError> {
    if body.output_types.iter().any(|t| t.trim().is_empty()) {
        return Err(ProfolioError::validation("output_types", "must not contain blank entries"));
    }

    Ok(HttpResponse::Ok().json(data.catalog.resolve(&body.output_types)))
}

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::errors::ProfolioError;
use crate::generator::CaseStudy;
use crate::identity::authenticate;
use crate::portfolio;

// Request body for compiling a portfolio; no body means every remix
#[derive(Debug, Default, Deserialize)]
pub struct PortfolioRequest {
    #[serde(default)]
    pub result_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    pub case_studies: Vec<CaseStudy>,
    pub markdown: String,
}

// Handler to generate the detail page of one technique
pub async fn generate_technique_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ProfolioError> {
    authenticate(&req, data.identity.as_ref()).await?;
    let detail = data.generator.technique_detail_from(&body).await?;

    Ok(HttpResponse::Ok().json(detail))
}

// Handler to compile the caller's remixes into case studies
pub async fn generate_portfolio_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: Option<web::Json<PortfolioRequest>>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    let request = body.map(web::Json::into_inner).unwrap_or_default();

    let mut remixes = data.remixes.list_with_project_names(caller.user_id).await?;
    if !request.result_ids.is_empty() {
        remixes.retain(|entry| {
            entry
                .remix
                .saved_result_id
                .is_some_and(|id| request.result_ids.contains(&id))
        });
    }
    // oldest first so projects appear in the order the work was done
    remixes.reverse();

    let input = portfolio::build_portfolio_input(&remixes);
    info!(
        "Compiling portfolio of {} techniques across {} projects for {}",
        input.techniques.len(),
        input.project_names().len(),
        caller.user_id
    );
    let case_studies = data.generator.full_portfolio(&input).await?;
    let markdown = portfolio::render_markdown(&case_studies);

    Ok(HttpResponse::Ok().json(PortfolioResponse { case_studies, markdown }))
}

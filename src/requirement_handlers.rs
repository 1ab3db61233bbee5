use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::catalog::StageRecommendation;
use crate::errors::ProfolioError;
use crate::identity::authenticate;
use crate::models::Requirement;
use crate::wizard::{self, WizardStep, WizardStepKind};

// Requirement together with the wizard's progress through it
#[derive(Debug, Serialize)]
pub struct RequirementResponse {
    pub requirement: Requirement,
    pub next_step: Option<WizardStepKind>,
}

impl From<Requirement> for RequirementResponse {
    fn from(requirement: Requirement) -> Self {
        Self {
            next_step: wizard::next_step(&requirement),
            requirement,
        }
    }
}

// Handler to start a requirement from the basics step
pub async fn create_requirement_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    step: web::Json<WizardStep>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    let requirement = step.into_inner().into_requirement(caller.user_id)?;
    let created = data.requirements.create(requirement, caller.user_id).await?;

    Ok(HttpResponse::Created().json(RequirementResponse::from(created)))
}

pub async fn list_requirements_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    Ok(HttpResponse::Ok().json(data.requirements.list(caller.user_id).await?))
}

pub async fn get_requirement_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    let requirement = data.requirements.get(path.into_inner(), caller.user_id).await?;

    Ok(HttpResponse::Ok().json(RequirementResponse::from(requirement)))
}

// Handler to record the answers of one wizard step
pub async fn apply_step_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    step: web::Json<WizardStep>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    let mut requirement = data.requirements.get(path.into_inner(), caller.user_id).await?;

    let step = step.into_inner();
    let kind = step.kind();
    step.apply_to(&mut requirement)?;
    let updated = data.requirements.update(requirement, caller.user_id).await?;
    info!("Applied {:?} step to requirement {}", kind, updated.id);

    Ok(HttpResponse::Ok().json(RequirementResponse::from(updated)))
}

pub async fn delete_requirement_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    data.requirements.delete(path.into_inner(), caller.user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

async fn complete_recommendations(
    data: &AppState,
    id: Uuid,
    owner: Uuid,
) -> Result<(Requirement, Vec<StageRecommendation>), ProfolioError> {
    let requirement = data.requirements.get(id, owner).await?;
    wizard::ensure_complete(&requirement)?;
    let recommendations = data.catalog.recommend_by_stage(&requirement.output_types);

    Ok((requirement, recommendations))
}

// Handler to get stage-grouped recommendations for a finished questionnaire
pub async fn get_recommendations_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    let (_, recommendations) = complete_recommendations(&data, path.into_inner(), caller.user_id).await?;

    Ok(HttpResponse::Ok().json(recommendations))
}

// Handler to save (or refresh) the result for a requirement
pub async fn save_result_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    let (requirement, recommendations) =
        complete_recommendations(&data, path.into_inner(), caller.user_id).await?;

    let saved = data
        .results
        .save_or_update_for_requirement(&requirement, recommendations, caller.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(saved))
}

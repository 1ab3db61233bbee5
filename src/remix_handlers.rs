use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::errors::ProfolioError;
use crate::identity::authenticate;
use crate::models::RemixDraft;

// Handler to save a new remix or replace an existing one
pub async fn save_remix_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    draft: web::Json<RemixDraft>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    let saved = data.remixes.save_or_update(draft.into_inner(), caller.user_id).await?;

    Ok(HttpResponse::Ok().json(saved))
}

// Handler to list remixes with their project names
pub async fn list_remixes_handler(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    Ok(HttpResponse::Ok().json(data.remixes.list_with_project_names(caller.user_id).await?))
}

pub async fn get_remix_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    Ok(HttpResponse::Ok().json(data.remixes.get(path.into_inner(), caller.user_id).await?))
}

pub async fn delete_remix_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    data.remixes.delete(path.into_inner(), caller.user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

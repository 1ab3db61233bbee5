use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::errors::ProfolioError;
use crate::identity::authenticate;

pub async fn list_results_handler(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    Ok(HttpResponse::Ok().json(data.results.list(caller.user_id).await?))
}

pub async fn get_result_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    Ok(HttpResponse::Ok().json(data.results.get(path.into_inner(), caller.user_id).await?))
}

pub async fn delete_result_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    data.remixes.delete_result(path.into_inner(), caller.user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

// Handler to list the remixes attached to one result
pub async fn list_result_remixes_handler(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    let remixes = data.remixes.list_for_result(path.into_inner(), caller.user_id).await?;

    Ok(HttpResponse::Ok().json(remixes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::tests::{bearer, Fixture, OTHER_TOKEN, OWNER_TOKEN};
    use crate::models::RemixDraft;
    use crate::routes;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_result_reads_are_owner_scoped() {
        let fixture = Fixture::new(None);
        let state = fixture.state();
        let placeholder = state
            .results
            .create_placeholder(fixture.owner, Some("Checkout".to_string()))
            .await
            .unwrap();
        state
            .remixes
            .save_or_update(
                RemixDraft {
                    saved_result_id: Some(placeholder.id),
                    technique_name: "Surveys".to_string(),
                    ..Default::default()
                },
                fixture.owner,
            )
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/results")
            .insert_header(bearer(OWNER_TOKEN))
            .to_request();
        let results: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(results[0]["project_name"], "Checkout");

        let req = test::TestRequest::get()
            .uri(&format!("/api/results/{}/remixes", placeholder.id))
            .insert_header(bearer(OWNER_TOKEN))
            .to_request();
        let remixes: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(remixes[0]["technique_name"], "Surveys");

        let req = test::TestRequest::get()
            .uri(&format!("/api/results/{}", placeholder.id))
            .insert_header(bearer(OTHER_TOKEN))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/results/not-a-uuid")
            .insert_header(bearer(OWNER_TOKEN))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/results/{}", placeholder.id))
            .insert_header(bearer(OWNER_TOKEN))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        // attached remixes go with the result
        let req = test::TestRequest::get()
            .uri("/api/remixes")
            .insert_header(bearer(OWNER_TOKEN))
            .to_request();
        let remixes: Value = test::call_and_read_body_json(&app, req).await;
        assert!(remixes.as_array().unwrap().is_empty());
    }
}

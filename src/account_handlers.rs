use actix_web::{web, HttpRequest, HttpResponse};

use crate::account;
use crate::app_state::AppState;
use crate::errors::ProfolioError;
use crate::identity::authenticate;

// Handler to delete the caller's data and account
pub async fn delete_account_handler(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, ProfolioError> {
    let caller = authenticate(&req, data.identity.as_ref()).await?;
    account::delete_account(&data, &caller).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use crate::app_state::tests::{bearer, Fixture, OWNER_TOKEN};
    use crate::routes;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_deleted_account_token_stops_working() {
        let fixture = Fixture::new(None);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fixture.state()))
                .configure(routes::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/remixes")
            .insert_header(bearer(OWNER_TOKEN))
            .set_json(json!({ "technique_name": "Surveys" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri("/api/account")
            .insert_header(bearer(OWNER_TOKEN))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri("/api/remixes")
            .insert_header(bearer(OWNER_TOKEN))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}

use std::sync::Arc;

use actix_http::Request;
use actix_service::Service;
use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::{from_fn, Next},
    test::{self, TestRequest},
    web, App, Error,
};

use crate::auth::TokenService;
use crate::handlers;
use crate::schema::AuthResponse;
use crate::store::memory::MemStore;
use crate::AppState;

pub const TEST_SECRET: &str = "course-market-test-secret";

/// Renders service-chain errors (e.g. from the auth middleware) into
/// responses, as the real HTTP dispatcher does; without this,
/// `call_service` panics instead of yielding the error status.
///
/// The response is attached to a synthetic request: cloning the real one
/// before routing would make the router's `match_info_mut` panic, and the
/// tests only ever read the status and body.
async fn render_errors(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse, Error> {
    match next.call(req).await {
        Ok(res) => Ok(res.map_into_boxed_body()),
        Err(err) => Ok(ServiceResponse::from_err(
            err,
            TestRequest::default().to_http_request(),
        )),
    }
}

/// Builds the full app over a fresh in-memory store, so tests need no
/// external services and cannot interfere with each other.
pub async fn init() -> impl Service<Request, Response = ServiceResponse, Error = Error> {
    let store = Arc::new(MemStore::new());

    let state = AppState {
        identity: store.clone(),
        catalog: store,
        tokens: TokenService::new(TEST_SECRET),
    };

    test::init_service(
        App::new()
            .wrap(from_fn(render_errors))
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await
}

/// A token service sharing the test app's secret, for minting tokens
/// (including expired ones) outside the signup/login flow.
pub fn tokens() -> TokenService {
    TokenService::new(TEST_SECRET)
}

pub async fn signup_admin<S>(app: &S, username: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    signup(app, "/admin/signup", username, password).await
}

pub async fn signup_user<S>(app: &S, username: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    signup(app, "/users/signup", username, password).await
}

async fn signup<S>(app: &S, uri: &str, username: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let res = TestRequest::post()
        .set_json(serde_json::json!({"username": username, "password": password}))
        .uri(uri)
        .send_request(app)
        .await;

    assert!(res.status().is_success(), "signup failed: {}", res.status());

    let body: AuthResponse = test::read_body_json(res).await;
    body.token
}

pub async fn create_course<S>(app: &S, token: &str, body: serde_json::Value) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    TestRequest::post()
        .set_json(body)
        .insert_header(("Authorization", format!("Bearer {token}")))
        .uri("/admin/courses")
        .send_request(app)
        .await
}

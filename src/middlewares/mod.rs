use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, HttpMessage, HttpRequest,
};

use crate::{
    auth::{Claims, Role},
    errors::ApiError,
    AppState,
};

/// Authentication check: requires `Authorization: Bearer <token>`, verifies
/// it, and attaches the decoded claims to the request extensions.
pub async fn authenticate(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let Some(header) = req.headers().get("Authorization") else {
        return Err(ApiError::MissingCredentials.into());
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or(ApiError::Internal)?;

    let claims = state.tokens.verify(token)?;

    req.extensions_mut().insert(claims);
    next.call(req).await
}

/// Role check, always downstream of `authenticate`. Non-admin claims are
/// rejected with the original API's 404.
pub async fn require_admin(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let role = req
        .extensions()
        .get::<Claims>()
        .map(|claims| claims.role)
        .ok_or(ApiError::Unauthenticated)?;

    if role != Role::Admin {
        return Err(ApiError::Forbidden.into());
    }

    next.call(req).await
}

/// Pulls the claims attached by `authenticate` out of a request.
pub fn claims(req: &HttpRequest) -> Result<Claims, ApiError> {
    req.extensions()
        .get::<Claims>()
        .cloned()
        .ok_or(ApiError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test::TestRequest};

    use crate::auth::Role;
    use crate::test_init_app::{init, tokens};

    #[actix_web::test]
    async fn missing_header_is_401() {
        let app = init().await;

        let res = TestRequest::get().uri("/me").send_request(&app).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn non_bearer_header_is_401() {
        let app = init().await;

        let res = TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", "Basic abc"))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn expired_token_is_401() {
        let app = init().await;
        let token = tokens()
            .issue_with_ttl("ghost", Role::User, chrono::Duration::hours(-2))
            .unwrap();

        let res = TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn user_token_cannot_reach_admin_routes() {
        let app = init().await;
        let token = tokens().issue("bob", Role::User).unwrap();

        let res = TestRequest::get()
            .uri("/admin/courses")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .send_request(&app)
            .await;

        // the role failure keeps the original 404
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn admin_token_passes_user_routes() {
        let app = init().await;
        let token = tokens().issue("alice", Role::Admin).unwrap();

        let res = TestRequest::get()
            .uri("/users/courses")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
    }
}

pub mod admin;
pub mod user;

use actix_web::{
    get,
    middleware::from_fn,
    web::{self, scope},
    HttpRequest, HttpResponse, Responder,
};

use crate::errors::ApiError;
use crate::middlewares::{self, claims};
use crate::schema::UsernameResponse;

#[get("/")]
pub async fn hello() -> impl Responder {
    "Hello"
}

#[get("")]
pub async fn me(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let claims = claims(&req)?;
    Ok(HttpResponse::Ok().json(UsernameResponse {
        username: claims.sub,
    }))
}

// session-validity probe, succeeds with no body
#[get("")]
pub async fn profile(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    claims(&req)?;
    Ok(HttpResponse::Ok().finish())
}

/// The full routing table, shared by `main` and the test harness.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|_err, _req| ApiError::InvalidInput("Invalid request body").into()),
    )
    .service(hello)
    .service(
        scope("/admin")
            .service(admin::signup)
            .service(admin::login)
            .service(
                // last wrap runs first: authenticate, then the role check
                scope("/courses")
                    .wrap(from_fn(middlewares::require_admin))
                    .wrap(from_fn(middlewares::authenticate))
                    .service(admin::list_courses)
                    .service(admin::create_course)
                    .service(admin::get_course)
                    .service(admin::update_course)
                    .service(admin::delete_course),
            ),
    )
    .service(
        scope("/users")
            .service(user::signup)
            .service(user::login)
            .service(
                scope("/purchasedCourses")
                    .wrap(from_fn(middlewares::authenticate))
                    .service(user::purchased_courses),
            )
            .service(
                scope("/courses")
                    .wrap(from_fn(middlewares::authenticate))
                    .service(user::list_courses)
                    .service(user::get_course)
                    .service(user::purchase_course),
            ),
    )
    .service(
        scope("/me")
            .wrap(from_fn(middlewares::authenticate))
            .service(me),
    )
    .service(
        scope("/profile")
            .wrap(from_fn(middlewares::authenticate))
            .service(profile),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{
        http::StatusCode,
        test::{self, TestRequest},
    };

    use crate::auth::Role;
    use crate::schema::UsernameResponse;
    use crate::test_init_app::{init, tokens};

    #[actix_web::test]
    async fn root_greets_unauthenticated() {
        let app = init().await;

        let req = TestRequest::get().uri("/").to_request();
        let res = test::call_service(&app, req).await;

        let body_bytes = test::read_body(res).await;
        let body_str = std::str::from_utf8(&body_bytes).unwrap();

        assert_eq!(body_str, "Hello");
    }

    #[actix_web::test]
    async fn me_returns_token_username() {
        let app = init().await;
        let token = tokens().issue("alice", Role::Admin).unwrap();

        let res = TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .send_request(&app)
            .await;

        assert!(res.status().is_success());

        let body: UsernameResponse = test::read_body_json(res).await;
        assert_eq!(body.username, "alice");
    }

    #[actix_web::test]
    async fn profile_is_a_session_probe() {
        let app = init().await;

        let res = TestRequest::get().uri("/profile").send_request(&app).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let token = tokens().issue("bob", Role::User).unwrap();
        let res = TestRequest::get()
            .uri("/profile")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .send_request(&app)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(test::read_body(res).await.is_empty());
    }
}

use actix_web::{
    get, post,
    web::{self, Json},
    HttpRequest, HttpResponse,
};

use super::admin::parse_course_id;
use crate::auth::Role;
use crate::errors::ApiError;
use crate::middlewares::claims;
use crate::schema::{
    AuthResponse, CoursesResponse, CourseView, CourseWithCreatorView, Credentials,
    CurrentCourseResponse, MessageResponse, PurchasedCoursesResponse,
};
use crate::store::PurchaseOutcome;
use crate::utils::{hash_password, verify_password};
use crate::AppState;

#[post("/signup")]
pub async fn signup(
    data: web::Data<AppState>,
    body: Json<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let (username, password) = body.into_inner().require()?;

    if data.identity.find_user(&username).await?.is_some() {
        return Err(ApiError::Conflict("User already exists, Please login"));
    }

    let hash = hash_password(&password).map_err(|_e| ApiError::Internal)?;
    data.identity.create_user(&username, &hash).await?;

    let token = data.tokens.issue(&username, Role::User)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "User created successfully".to_string(),
        token,
    }))
}

#[post("/login")]
pub async fn login(
    data: web::Data<AppState>,
    body: Json<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let (username, password) = body.into_inner().require()?;

    let user = data
        .identity
        .find_user(&username)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    verify_password(&password, &user.password).map_err(|_e| ApiError::Unauthorized)?;

    let token = data.tokens.issue(&username, Role::User)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "User logged in successfully".to_string(),
        token,
    }))
}

// any authenticated role may browse, no role check here
#[get("")]
pub async fn list_courses(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let courses = data.catalog.list_courses(true).await?;

    Ok(HttpResponse::Ok().json(CoursesResponse {
        courses: courses.into_iter().map(CourseWithCreatorView::from).collect(),
    }))
}

// no publish filter on direct fetches, and no creator join either
#[get("/{id}")]
pub async fn get_course(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_course_id(&path.into_inner())?;

    let course = data
        .catalog
        .get_course(id)
        .await?
        .ok_or(ApiError::NotFound("Course doesn't exist"))?;

    Ok(HttpResponse::Ok().json(CurrentCourseResponse {
        current_course: CourseView::from(course),
    }))
}

#[post("/{id}")]
pub async fn purchase_course(
    data: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let claims = claims(&req)?;
    let id = parse_course_id(&path.into_inner())?;

    let course = data
        .catalog
        .get_course(id)
        .await?
        .ok_or(ApiError::NotFound("Course doesn't exist"))?;

    let user = data
        .identity
        .find_user(&claims.sub)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    match data
        .identity
        .add_purchase_if_absent(user.id, course.id)
        .await?
    {
        PurchaseOutcome::Added => {
            Ok(HttpResponse::Ok().json(MessageResponse::new("Course purchased successfully")))
        }
        PurchaseOutcome::AlreadyPurchased => Err(ApiError::Conflict("Course already purchased")),
    }
}

#[get("")]
pub async fn purchased_courses(
    data: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let claims = claims(&req)?;

    let user = data
        .identity
        .find_user(&claims.sub)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    let courses = data.identity.purchased_courses(user.id).await?;

    Ok(HttpResponse::Ok().json(PurchasedCoursesResponse {
        purchased_courses: courses.into_iter().map(CourseView::from).collect(),
    }))
}

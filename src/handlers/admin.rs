use actix_web::{
    delete, get, post, put,
    web::{self, Json},
    HttpRequest, HttpResponse,
};
use uuid::Uuid;

use crate::auth::Role;
use crate::errors::ApiError;
use crate::middlewares::claims;
use crate::schema::{
    AuthResponse, CourseInput, CoursesResponse, CourseWithCreatorView, Credentials,
    CurrentCourseResponse, MessageResponse,
};
use crate::store::{CourseChanges, NewCourse};
use crate::utils::{hash_password, verify_password};
use crate::AppState;

pub fn parse_course_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_e| ApiError::InvalidId)
}

#[post("/signup")]
pub async fn signup(
    data: web::Data<AppState>,
    body: Json<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let (username, password) = body.into_inner().require()?;

    if data.identity.find_admin(&username).await?.is_some() {
        return Err(ApiError::Conflict("User already exists, Please login"));
    }

    let hash = hash_password(&password).map_err(|_e| ApiError::Internal)?;
    data.identity.create_admin(&username, &hash).await?;

    let token = data.tokens.issue(&username, Role::Admin)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Admin created successfully".to_string(),
        token,
    }))
}

#[post("/login")]
pub async fn login(
    data: web::Data<AppState>,
    body: Json<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let (username, password) = body.into_inner().require()?;

    let admin = data
        .identity
        .find_admin(&username)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    verify_password(&password, &admin.password).map_err(|_e| ApiError::Unauthorized)?;

    let token = data.tokens.issue(&username, Role::Admin)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Admin logged in successfully".to_string(),
        token,
    }))
}

#[get("")]
pub async fn list_courses(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    // all courses, published or not, with the creator resolved
    let courses = data.catalog.list_courses(false).await?;

    Ok(HttpResponse::Ok().json(CoursesResponse {
        courses: courses.into_iter().map(CourseWithCreatorView::from).collect(),
    }))
}

#[post("")]
pub async fn create_course(
    data: web::Data<AppState>,
    body: Json<CourseInput>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let claims = claims(&req)?;
    let input = body.into_inner().require()?;

    if data
        .catalog
        .find_course_by_title(&input.title)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Course already exists"));
    }

    let admin = data
        .identity
        .find_admin(&claims.sub)
        .await?
        .ok_or(ApiError::NotFound("Course creator not found"))?;

    data.catalog
        .create_course(NewCourse {
            title: input.title,
            description: input.description,
            price: input.price,
            image_link: input.image_link,
            published: input.published.unwrap_or(true),
            created_by: admin.id,
        })
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Course created successfully")))
}

#[get("/{id}")]
pub async fn get_course(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_course_id(&path.into_inner())?;

    let course = data
        .catalog
        .get_course_with_creator(id)
        .await?
        .ok_or(ApiError::NotFound("Course doesn't exist"))?;

    Ok(HttpResponse::Ok().json(CurrentCourseResponse {
        current_course: CourseWithCreatorView::from(course),
    }))
}

#[put("/{id}")]
pub async fn update_course(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: Json<CourseInput>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_course_id(&path.into_inner())?;
    let input = body.into_inner().require()?;

    data.catalog
        .update_course(
            id,
            CourseChanges {
                title: input.title,
                description: input.description,
                price: input.price,
                image_link: input.image_link,
                published: input.published,
            },
        )
        .await?
        .ok_or(ApiError::NotFound("Course doesn't exist"))?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Course updated successfully")))
}

#[delete("/{id}")]
pub async fn delete_course(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_course_id(&path.into_inner())?;

    // no ownership restriction: any admin may delete any course
    if !data.catalog.delete_course(id).await? {
        return Err(ApiError::NotFound("Course doesn't exist"));
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Course deleted successfully")))
}

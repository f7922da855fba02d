use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::store::{CourseRecord, CourseWithCreator, CreatorRef};

#[derive(Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn require(self) -> Result<(String, String), ApiError> {
        match (self.username, self.password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Ok((username, password))
            }
            _ => Err(ApiError::InvalidInput("Username and password are required.")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "imageLink")]
    pub image_link: Option<String>,
    pub price: Option<f64>,
    pub published: Option<bool>,
}

pub struct CourseFields {
    pub title: String,
    pub description: String,
    pub image_link: String,
    pub price: f64,
    pub published: Option<bool>,
}

impl CourseInput {
    pub fn require(self) -> Result<CourseFields, ApiError> {
        match (self.title, self.description, self.image_link, self.price) {
            (Some(title), Some(description), Some(image_link), Some(price))
                if !title.is_empty() && !description.is_empty() && !image_link.is_empty() =>
            {
                Ok(CourseFields {
                    title,
                    description,
                    image_link,
                    price,
                    published: self.published,
                })
            }
            _ => Err(ApiError::InvalidInput("Course details missing")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsernameResponse {
    pub username: String,
}

/// Course as stored, with the creator left as a reference id.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_link: String,
    pub published: bool,
    pub created_by: Uuid,
}

impl From<CourseRecord> for CourseView {
    fn from(course: CourseRecord) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            price: course.price,
            image_link: course.image_link,
            published: course.published,
            created_by: course.created_by,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatorView {
    pub id: Uuid,
    pub username: String,
}

impl From<CreatorRef> for CreatorView {
    fn from(creator: CreatorRef) -> Self {
        Self {
            id: creator.id,
            username: creator.username,
        }
    }
}

/// Course with its creator reference resolved ("populated").
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithCreatorView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_link: String,
    pub published: bool,
    pub created_by: Option<CreatorView>,
}

impl From<CourseWithCreator> for CourseWithCreatorView {
    fn from(joined: CourseWithCreator) -> Self {
        Self {
            id: joined.course.id,
            title: joined.course.title,
            description: joined.course.description,
            price: joined.course.price,
            image_link: joined.course.image_link,
            published: joined.course.published,
            created_by: joined.creator.map(CreatorView::from),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CoursesResponse {
    #[serde(rename = "Courses")]
    pub courses: Vec<CourseWithCreatorView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentCourseResponse<T> {
    #[serde(rename = "currentCourse")]
    pub current_course: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchasedCoursesResponse {
    #[serde(rename = "purchasedCourses")]
    pub purchased_courses: Vec<CourseView>,
}

use async_trait::async_trait;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Clone, FromRow)]
pub struct AdminRecord {
    pub id: Uuid,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct CourseRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_link: String,
    pub published: bool,
    pub created_by: Uuid,
}

/// The "populate" projection of a course creator. Password is never
/// carried into responses.
#[derive(Debug, Clone)]
pub struct CreatorRef {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct CourseWithCreator {
    pub course: CourseRecord,
    pub creator: Option<CreatorRef>,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_link: String,
    pub published: bool,
    pub created_by: Uuid,
}

/// Update payload. `published` is optional: when absent the stored flag is
/// kept. `created_by` is deliberately not part of an update.
#[derive(Debug, Clone)]
pub struct CourseChanges {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_link: String,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Added,
    AlreadyPurchased,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_admin(&self, username: &str) -> Result<Option<AdminRecord>, StoreError>;

    async fn create_admin(&self, username: &str, password: &str)
        -> Result<AdminRecord, StoreError>;

    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn create_user(&self, username: &str, password: &str) -> Result<UserRecord, StoreError>;

    /// Atomic conditional append: adds the course to the user's purchase
    /// list unless it is already there. The single round trip closes the
    /// check-then-act race between concurrent purchases.
    async fn add_purchase_if_absent(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<PurchaseOutcome, StoreError>;

    /// Resolves the user's purchase references to full courses, in purchase
    /// order. References to since-deleted courses are skipped.
    async fn purchased_courses(&self, user_id: Uuid) -> Result<Vec<CourseRecord>, StoreError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_course_by_title(&self, title: &str)
        -> Result<Option<CourseRecord>, StoreError>;

    async fn create_course(&self, course: NewCourse) -> Result<CourseRecord, StoreError>;

    async fn get_course(&self, id: Uuid) -> Result<Option<CourseRecord>, StoreError>;

    async fn get_course_with_creator(
        &self,
        id: Uuid,
    ) -> Result<Option<CourseWithCreator>, StoreError>;

    async fn list_courses(
        &self,
        published_only: bool,
    ) -> Result<Vec<CourseWithCreator>, StoreError>;

    /// Returns the updated course, or `None` when no course has that id.
    async fn update_course(
        &self,
        id: Uuid,
        changes: CourseChanges,
    ) -> Result<Option<CourseRecord>, StoreError>;

    /// Returns whether a course was actually deleted.
    async fn delete_course(&self, id: Uuid) -> Result<bool, StoreError>;
}

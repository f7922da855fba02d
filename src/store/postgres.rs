use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, Pool, Postgres};
use uuid::Uuid;

use super::{
    AdminRecord, CatalogStore, CourseChanges, CourseRecord, CourseWithCreator, CreatorRef,
    IdentityStore, NewCourse, PurchaseOutcome, StoreError, UserRecord,
};

const COURSE_COLUMNS: &str = "id, title, description, price, image_link, published, created_by";

/// Postgres backend. Purchases live in their own table; the UNIQUE
/// (user_id, course_id) constraint makes the conditional append a single
/// atomic statement.
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

#[derive(FromRow)]
struct CourseCreatorRow {
    id: Uuid,
    title: String,
    description: String,
    price: f64,
    image_link: String,
    published: bool,
    created_by: Uuid,
    creator_id: Option<Uuid>,
    creator_username: Option<String>,
}

impl From<CourseCreatorRow> for CourseWithCreator {
    fn from(row: CourseCreatorRow) -> Self {
        let creator = match (row.creator_id, row.creator_username) {
            (Some(id), Some(username)) => Some(CreatorRef { id, username }),
            _ => None,
        };

        CourseWithCreator {
            course: CourseRecord {
                id: row.id,
                title: row.title,
                description: row.description,
                price: row.price,
                image_link: row.image_link,
                published: row.published,
                created_by: row.created_by,
            },
            creator,
        }
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_admin(&self, username: &str) -> Result<Option<AdminRecord>, StoreError> {
        let admin = sqlx::query_as::<_, AdminRecord>(
            "SELECT id, username, password FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    async fn create_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminRecord, StoreError> {
        let admin = sqlx::query_as::<_, AdminRecord>(
            "INSERT INTO admins (username, password) VALUES ($1, $2) \
             RETURNING id, username, password",
        )
        .bind(username)
        .bind(password)
        .fetch_one(&self.pool)
        .await?;

        Ok(admin)
    }

    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, username: &str, password: &str) -> Result<UserRecord, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (username, password) VALUES ($1, $2) \
             RETURNING id, username, password",
        )
        .bind(username)
        .bind(password)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn add_purchase_if_absent(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<PurchaseOutcome, StoreError> {
        let result = sqlx::query(
            "INSERT INTO purchases (user_id, course_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, course_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(course_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(PurchaseOutcome::AlreadyPurchased)
        } else {
            Ok(PurchaseOutcome::Added)
        }
    }

    async fn purchased_courses(&self, user_id: Uuid) -> Result<Vec<CourseRecord>, StoreError> {
        let courses = sqlx::query_as::<_, CourseRecord>(
            "SELECT c.id, c.title, c.description, c.price, c.image_link, c.published, \
                    c.created_by \
             FROM purchases p JOIN courses c ON c.id = p.course_id \
             WHERE p.user_id = $1 ORDER BY p.seq",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_course_by_title(
        &self,
        title: &str,
    ) -> Result<Option<CourseRecord>, StoreError> {
        let course = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE title = $1"
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course)
    }

    async fn create_course(&self, course: NewCourse) -> Result<CourseRecord, StoreError> {
        let created = sqlx::query_as::<_, CourseRecord>(&format!(
            "INSERT INTO courses (title, description, price, image_link, published, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COURSE_COLUMNS}"
        ))
        .bind(course.title)
        .bind(course.description)
        .bind(course.price)
        .bind(course.image_link)
        .bind(course.published)
        .bind(course.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<CourseRecord>, StoreError> {
        let course = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course)
    }

    async fn get_course_with_creator(
        &self,
        id: Uuid,
    ) -> Result<Option<CourseWithCreator>, StoreError> {
        let row = sqlx::query_as::<_, CourseCreatorRow>(
            "SELECT c.id, c.title, c.description, c.price, c.image_link, c.published, \
                    c.created_by, a.id AS creator_id, a.username AS creator_username \
             FROM courses c LEFT JOIN admins a ON a.id = c.created_by \
             WHERE c.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CourseWithCreator::from))
    }

    async fn list_courses(
        &self,
        published_only: bool,
    ) -> Result<Vec<CourseWithCreator>, StoreError> {
        let rows = sqlx::query_as::<_, CourseCreatorRow>(
            "SELECT c.id, c.title, c.description, c.price, c.image_link, c.published, \
                    c.created_by, a.id AS creator_id, a.username AS creator_username \
             FROM courses c LEFT JOIN admins a ON a.id = c.created_by \
             WHERE c.published OR NOT $1 \
             ORDER BY c.title",
        )
        .bind(published_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CourseWithCreator::from).collect())
    }

    async fn update_course(
        &self,
        id: Uuid,
        changes: CourseChanges,
    ) -> Result<Option<CourseRecord>, StoreError> {
        let updated = sqlx::query_as::<_, CourseRecord>(&format!(
            "UPDATE courses \
             SET title = $2, description = $3, price = $4, image_link = $5, \
                 published = COALESCE($6, published) \
             WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.image_link)
        .bind(changes.published)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

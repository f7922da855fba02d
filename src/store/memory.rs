use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    AdminRecord, CatalogStore, CourseChanges, CourseRecord, CourseWithCreator, CreatorRef,
    IdentityStore, NewCourse, PurchaseOutcome, StoreError, UserRecord,
};

#[derive(Default)]
struct Inner {
    admins: HashMap<Uuid, AdminRecord>,
    users: HashMap<Uuid, UserRecord>,
    courses: HashMap<Uuid, CourseRecord>,
    // user id -> course ids, in purchase order
    purchases: HashMap<Uuid, Vec<Uuid>>,
}

/// In-memory backend. One lock over all collections, so the conditional
/// purchase append is atomic. Used by the test harness and as the fallback
/// when no DATABASE_URL is configured.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn creator_ref(inner: &Inner, admin_id: Uuid) -> Option<CreatorRef> {
        inner.admins.get(&admin_id).map(|admin| CreatorRef {
            id: admin.id,
            username: admin.username.clone(),
        })
    }
}

#[async_trait]
impl IdentityStore for MemStore {
    async fn find_admin(&self, username: &str) -> Result<Option<AdminRecord>, StoreError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .admins
            .values()
            .find(|admin| admin.username == username)
            .cloned())
    }

    async fn create_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminRecord, StoreError> {
        let mut inner = self.inner.write().unwrap();
        let admin = AdminRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password: password.to_string(),
        };
        inner.admins.insert(admin.id, admin.clone());
        Ok(admin)
    }

    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_user(&self, username: &str, password: &str) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.write().unwrap();
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password: password.to_string(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn add_purchase_if_absent(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<PurchaseOutcome, StoreError> {
        let mut inner = self.inner.write().unwrap();
        let purchases = inner.purchases.entry(user_id).or_default();

        if purchases.contains(&course_id) {
            return Ok(PurchaseOutcome::AlreadyPurchased);
        }

        purchases.push(course_id);
        Ok(PurchaseOutcome::Added)
    }

    async fn purchased_courses(&self, user_id: Uuid) -> Result<Vec<CourseRecord>, StoreError> {
        let inner = self.inner.read().unwrap();
        let ids = inner.purchases.get(&user_id);

        Ok(ids
            .into_iter()
            .flatten()
            .filter_map(|id| inner.courses.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl CatalogStore for MemStore {
    async fn find_course_by_title(
        &self,
        title: &str,
    ) -> Result<Option<CourseRecord>, StoreError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .courses
            .values()
            .find(|course| course.title == title)
            .cloned())
    }

    async fn create_course(&self, course: NewCourse) -> Result<CourseRecord, StoreError> {
        let mut inner = self.inner.write().unwrap();
        let record = CourseRecord {
            id: Uuid::new_v4(),
            title: course.title,
            description: course.description,
            price: course.price,
            image_link: course.image_link,
            published: course.published,
            created_by: course.created_by,
        };
        inner.courses.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<CourseRecord>, StoreError> {
        let inner = self.inner.read().unwrap();
        Ok(inner.courses.get(&id).cloned())
    }

    async fn get_course_with_creator(
        &self,
        id: Uuid,
    ) -> Result<Option<CourseWithCreator>, StoreError> {
        let inner = self.inner.read().unwrap();
        Ok(inner.courses.get(&id).cloned().map(|course| {
            let creator = Self::creator_ref(&inner, course.created_by);
            CourseWithCreator { course, creator }
        }))
    }

    async fn list_courses(
        &self,
        published_only: bool,
    ) -> Result<Vec<CourseWithCreator>, StoreError> {
        let inner = self.inner.read().unwrap();
        let mut courses: Vec<CourseWithCreator> = inner
            .courses
            .values()
            .filter(|course| !published_only || course.published)
            .cloned()
            .map(|course| {
                let creator = Self::creator_ref(&inner, course.created_by);
                CourseWithCreator { course, creator }
            })
            .collect();

        // HashMap iteration order is arbitrary
        courses.sort_by(|a, b| a.course.title.cmp(&b.course.title));
        Ok(courses)
    }

    async fn update_course(
        &self,
        id: Uuid,
        changes: CourseChanges,
    ) -> Result<Option<CourseRecord>, StoreError> {
        let mut inner = self.inner.write().unwrap();

        let Some(course) = inner.courses.get_mut(&id) else {
            return Ok(None);
        };

        course.title = changes.title;
        course.description = changes.description;
        course.price = changes.price;
        course.image_link = changes.image_link;
        if let Some(published) = changes.published {
            course.published = published;
        }

        Ok(Some(course.clone()))
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().unwrap();
        Ok(inner.courses.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(title: &str, created_by: Uuid) -> NewCourse {
        NewCourse {
            title: title.to_string(),
            description: "d".to_string(),
            price: 10.0,
            image_link: "http://x".to_string(),
            published: true,
            created_by,
        }
    }

    #[actix_web::test]
    async fn second_identical_purchase_is_rejected() {
        let store = MemStore::new();
        let user = store.create_user("bob", "pw").await.unwrap();
        let created = store.create_course(course("a", Uuid::new_v4())).await.unwrap();

        let first = store
            .add_purchase_if_absent(user.id, created.id)
            .await
            .unwrap();
        let second = store
            .add_purchase_if_absent(user.id, created.id)
            .await
            .unwrap();

        assert_eq!(first, PurchaseOutcome::Added);
        assert_eq!(second, PurchaseOutcome::AlreadyPurchased);
        assert_eq!(store.purchased_courses(user.id).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn purchases_resolve_in_purchase_order() {
        let store = MemStore::new();
        let user = store.create_user("bob", "pw").await.unwrap();
        let first = store.create_course(course("b", Uuid::new_v4())).await.unwrap();
        let second = store.create_course(course("a", Uuid::new_v4())).await.unwrap();

        store
            .add_purchase_if_absent(user.id, first.id)
            .await
            .unwrap();
        store
            .add_purchase_if_absent(user.id, second.id)
            .await
            .unwrap();

        let resolved = store.purchased_courses(user.id).await.unwrap();
        assert_eq!(resolved[0].title, "b");
        assert_eq!(resolved[1].title, "a");
    }

    #[actix_web::test]
    async fn deleted_course_is_skipped_when_resolving_purchases() {
        let store = MemStore::new();
        let user = store.create_user("bob", "pw").await.unwrap();
        let created = store.create_course(course("a", Uuid::new_v4())).await.unwrap();

        store
            .add_purchase_if_absent(user.id, created.id)
            .await
            .unwrap();
        assert!(store.delete_course(created.id).await.unwrap());

        assert!(store.purchased_courses(user.id).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn unpublished_courses_are_filtered_from_published_listing() {
        let store = MemStore::new();
        let admin = store.create_admin("alice", "pw").await.unwrap();

        store.create_course(course("visible", admin.id)).await.unwrap();
        let mut hidden = course("hidden", admin.id);
        hidden.published = false;
        store.create_course(hidden).await.unwrap();

        let published = store.list_courses(true).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].course.title, "visible");
        assert_eq!(published[0].creator.as_ref().unwrap().username, "alice");

        assert_eq!(store.list_courses(false).await.unwrap().len(), 2);
    }
}

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    pantry::{
        dto::{CreatePantryItemRequest, UpdatePantryItemRequest},
        repo::PantryStore,
        repo_types::{NewPantryItem, PantryItem, PantryPatch},
    },
};

pub const EXPIRING_SOON_DAYS: i64 = 3;

#[derive(Clone)]
pub struct PantryService {
    store: Arc<dyn PantryStore>,
}

impl PantryService {
    pub fn new(store: Arc<dyn PantryStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user_id: Uuid, req: CreatePantryItemRequest) -> AppResult<PantryItem> {
        let item = self.store.insert(new_item(user_id, req)?).await?;
        info!(item_id = %item.id, user_id = %user_id, "pantry item added");
        Ok(item)
    }

    pub async fn create_many(
        &self,
        user_id: Uuid,
        reqs: Vec<CreatePantryItemRequest>,
    ) -> AppResult<Vec<PantryItem>> {
        let items = reqs
            .into_iter()
            .map(|req| new_item(user_id, req))
            .collect::<AppResult<Vec<_>>>()?;
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let created = self.store.insert_many(items).await?;
        info!(user_id = %user_id, count = created.len(), "pantry items added");
        Ok(created)
    }

    /// Items past their expiry date are flagged expired before being returned.
    pub async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<PantryItem>> {
        let mut items = self.store.list_by_user(user_id).await?;
        let now = OffsetDateTime::now_utc();

        let stale: Vec<Uuid> = items
            .iter()
            .filter(|i| i.is_stale(now))
            .map(|i| i.id)
            .collect();
        if stale.is_empty() {
            return Ok(items);
        }

        // best-effort, retried on the next read
        if let Err(e) = self.store.mark_expired(user_id, &stale).await {
            warn!(error = %e, user_id = %user_id, count = stale.len(), "failed to persist expired flags");
        }
        for item in items.iter_mut().filter(|i| stale.contains(&i.id)) {
            item.is_expired = true;
        }
        Ok(items)
    }

    pub async fn get_by_id(&self, id: Uuid, user_id: Uuid) -> AppResult<PantryItem> {
        self.store
            .find(id, user_id)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        req: UpdatePantryItemRequest,
    ) -> AppResult<PantryItem> {
        let name = match req.name {
            Some(n) if n.trim().is_empty() => {
                return Err(AppError::validation("name must not be empty"));
            }
            other => other.map(|n| n.trim().to_string()),
        };
        let now = OffsetDateTime::now_utc();
        let is_expired = match req.expiry_date {
            Some(Some(d)) if d > now => Some(false),
            Some(None) => Some(false),
            _ => None,
        };

        let patch = PantryPatch {
            name,
            quantity: req.quantity,
            unit: req.unit,
            category: req.category,
            expiry_date: req.expiry_date,
            image_url: req.image_url,
            is_expired,
        };
        self.store
            .update(id, user_id, patch)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        if !self.store.delete(id, user_id).await? {
            return Err(not_found());
        }
        info!(item_id = %id, user_id = %user_id, "pantry item deleted");
        Ok(())
    }

    pub async fn delete_all(&self, user_id: Uuid) -> AppResult<u64> {
        let removed = self.store.delete_all(user_id).await?;
        info!(user_id = %user_id, removed, "pantry cleared");
        Ok(removed)
    }

    pub async fn list_expiring_soon(&self, user_id: Uuid, days: i64) -> AppResult<Vec<PantryItem>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .store
            .list_expiring(user_id, now, now + Duration::days(days))
            .await?)
    }
}

fn new_item(user_id: Uuid, req: CreatePantryItemRequest) -> AppResult<NewPantryItem> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    Ok(NewPantryItem {
        user_id,
        name: name.to_string(),
        quantity: req.quantity,
        unit: req.unit,
        category: req.category,
        expiry_date: req.expiry_date,
        image_url: req.image_url,
    })
}

fn not_found() -> AppError {
    AppError::not_found("Pantry item not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryPantryStore;

    fn service() -> PantryService {
        PantryService::new(Arc::new(MemoryPantryStore::default()))
    }

    fn item(name: &str, expiry: Option<OffsetDateTime>) -> CreatePantryItemRequest {
        CreatePantryItemRequest {
            name: name.into(),
            quantity: Some("1".into()),
            unit: Some("pcs".into()),
            category: None,
            expiry_date: expiry,
            image_url: None,
        }
    }

    fn in_days(days: i64) -> OffsetDateTime {
        OffsetDateTime::now_utc() + Duration::days(days)
    }

    #[tokio::test]
    async fn listing_flags_past_expiry() {
        let pantry = service();
        let user = Uuid::new_v4();
        let old = pantry.create(user, item("Yoghurt", Some(in_days(-1)))).await.unwrap();
        assert!(!old.is_expired);
        pantry.create(user, item("Rice", None)).await.unwrap();

        let listed = pantry.list_by_user(user).await.unwrap();
        let yoghurt = listed.iter().find(|i| i.id == old.id).unwrap();
        assert!(yoghurt.is_expired);
        let rice = listed.iter().find(|i| i.name == "Rice").unwrap();
        assert!(!rice.is_expired);

        // persisted, not just reported
        assert!(pantry.get_by_id(old.id, user).await.unwrap().is_expired);
    }

    #[tokio::test]
    async fn expiring_soon_window_and_order() {
        let pantry = service();
        let user = Uuid::new_v4();
        pantry.create(user, item("Later", Some(in_days(5)))).await.unwrap();
        pantry.create(user, item("Two", Some(in_days(2)))).await.unwrap();
        pantry.create(user, item("One", Some(in_days(1)))).await.unwrap();
        pantry.create(user, item("Gone", Some(in_days(-2)))).await.unwrap();
        pantry.create(user, item("Undated", None)).await.unwrap();
        pantry
            .create(Uuid::new_v4(), item("Foreign", Some(in_days(1))))
            .await
            .unwrap();

        let names: Vec<String> = pantry
            .list_expiring_soon(user, EXPIRING_SOON_DAYS)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn foreign_item_is_not_found() {
        let pantry = service();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let milk = pantry.create(owner, item("Milk", None)).await.unwrap();

        assert!(matches!(
            pantry.get_by_id(milk.id, stranger).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            pantry
                .update(milk.id, stranger, UpdatePantryItemRequest::default())
                .await
                .unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            pantry.delete(milk.id, stranger).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert_eq!(pantry.get_by_id(milk.id, owner).await.unwrap().name, "Milk");
    }

    #[tokio::test]
    async fn redating_clears_expired_flag() {
        let pantry = service();
        let user = Uuid::new_v4();
        let cheese = pantry.create(user, item("Cheese", Some(in_days(-1)))).await.unwrap();
        pantry.list_by_user(user).await.unwrap();

        let updated = pantry
            .update(
                cheese.id,
                user,
                UpdatePantryItemRequest {
                    expiry_date: Some(Some(in_days(2))),
                    quantity: Some(Some("2".into())),
                    ..UpdatePantryItemRequest::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_expired);
        assert_eq!(updated.quantity.as_deref(), Some("2"));
        assert_eq!(updated.unit.as_deref(), Some("pcs"));

        let soon = pantry.list_expiring_soon(user, 3).await.unwrap();
        assert_eq!(soon.len(), 1);
    }

    #[tokio::test]
    async fn null_clears_expiry_and_absent_keeps_fields() {
        let pantry = service();
        let user = Uuid::new_v4();
        let milk = pantry.create(user, item("Milk", Some(in_days(-2)))).await.unwrap();
        assert!(pantry.list_by_user(user).await.unwrap()[0].is_expired);

        let updated = pantry
            .update(
                milk.id,
                user,
                UpdatePantryItemRequest {
                    expiry_date: Some(None),
                    unit: Some(None),
                    ..UpdatePantryItemRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.expiry_date, None);
        assert!(!updated.is_expired);
        assert_eq!(updated.unit, None);
        assert_eq!(updated.quantity.as_deref(), Some("1"));
        assert!(!pantry.list_by_user(user).await.unwrap()[0].is_expired);
    }

    #[tokio::test]
    async fn batch_rejects_blank_names_before_writing() {
        let pantry = service();
        let user = Uuid::new_v4();
        let err = pantry
            .create_many(user, vec![item("Eggs", None), item("  ", None)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(pantry.list_by_user(user).await.unwrap().is_empty());

        let created = pantry
            .create_many(user, vec![item("Eggs", None), item("Flour", None)])
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
    }

    #[tokio::test]
    async fn delete_all_only_touches_caller() {
        let pantry = service();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        pantry.create(user, item("A", None)).await.unwrap();
        pantry.create(user, item("B", None)).await.unwrap();
        pantry.create(other, item("C", None)).await.unwrap();

        assert_eq!(pantry.delete_all(user).await.unwrap(), 2);
        assert!(pantry.list_by_user(user).await.unwrap().is_empty());
        assert_eq!(pantry.list_by_user(other).await.unwrap().len(), 1);
    }
}

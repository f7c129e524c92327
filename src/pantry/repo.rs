use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pantry::repo_types::{NewPantryItem, PantryItem, PantryPatch};

const PANTRY_COLUMNS: &str =
    "id, user_id, name, quantity, unit, category, expiry_date, image_url, added_at, is_expired";

/// Every lookup is scoped by owner; a foreign id behaves like a missing one.
#[async_trait]
pub trait PantryStore: Send + Sync {
    async fn insert(&self, item: NewPantryItem) -> anyhow::Result<PantryItem>;
    /// All-or-nothing.
    async fn insert_many(&self, items: Vec<NewPantryItem>) -> anyhow::Result<Vec<PantryItem>>;
    /// Newest additions first.
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<PantryItem>>;
    async fn mark_expired(&self, user_id: Uuid, ids: &[Uuid]) -> anyhow::Result<u64>;
    async fn find(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<PantryItem>>;
    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: PantryPatch,
    ) -> anyhow::Result<Option<PantryItem>>;
    async fn delete(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
    async fn delete_all(&self, user_id: Uuid) -> anyhow::Result<u64>;
    /// Unexpired items with `from <= expiry_date <= until`, soonest first.
    async fn list_expiring(
        &self,
        user_id: Uuid,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> anyhow::Result<Vec<PantryItem>>;
}

#[derive(Clone)]
pub struct PgPantryStore {
    db: PgPool,
}

impl PgPantryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn insert_sql() -> String {
    format!(
        r#"
        INSERT INTO pantry_items (user_id, name, quantity, unit, category, expiry_date, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {PANTRY_COLUMNS}
        "#
    )
}

#[async_trait]
impl PantryStore for PgPantryStore {
    async fn insert(&self, item: NewPantryItem) -> anyhow::Result<PantryItem> {
        sqlx::query_as::<_, PantryItem>(&insert_sql())
            .bind(item.user_id)
            .bind(&item.name)
            .bind(&item.quantity)
            .bind(&item.unit)
            .bind(&item.category)
            .bind(item.expiry_date)
            .bind(&item.image_url)
            .fetch_one(&self.db)
            .await
            .context("insert pantry item")
    }

    async fn insert_many(&self, items: Vec<NewPantryItem>) -> anyhow::Result<Vec<PantryItem>> {
        let sql = insert_sql();
        let mut tx = self.db.begin().await.context("begin tx")?;
        let mut out = Vec::with_capacity(items.len());
        for item in &items {
            let row = sqlx::query_as::<_, PantryItem>(&sql)
                .bind(item.user_id)
                .bind(&item.name)
                .bind(&item.quantity)
                .bind(&item.unit)
                .bind(&item.category)
                .bind(item.expiry_date)
                .bind(&item.image_url)
                .fetch_one(&mut *tx)
                .await
                .with_context(|| format!("insert pantry item {}", item.name))?;
            out.push(row);
        }
        tx.commit().await.context("commit tx")?;
        Ok(out)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<PantryItem>> {
        sqlx::query_as::<_, PantryItem>(&format!(
            "SELECT {PANTRY_COLUMNS} FROM pantry_items WHERE user_id = $1 ORDER BY added_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list pantry items")
    }

    async fn mark_expired(&self, user_id: Uuid, ids: &[Uuid]) -> anyhow::Result<u64> {
        let res = sqlx::query(
            "UPDATE pantry_items SET is_expired = TRUE WHERE user_id = $1 AND id = ANY($2)",
        )
        .bind(user_id)
        .bind(ids.to_vec())
        .execute(&self.db)
        .await
        .context("mark pantry items expired")?;
        Ok(res.rows_affected())
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<Option<PantryItem>> {
        sqlx::query_as::<_, PantryItem>(&format!(
            "SELECT {PANTRY_COLUMNS} FROM pantry_items WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find pantry item")
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        p: PantryPatch,
    ) -> anyhow::Result<Option<PantryItem>> {
        sqlx::query_as::<_, PantryItem>(&format!(
            r#"
            UPDATE pantry_items
               SET name        = COALESCE($3, name),
                   quantity    = CASE WHEN $4 THEN $5 ELSE quantity END,
                   unit        = CASE WHEN $6 THEN $7 ELSE unit END,
                   category    = CASE WHEN $8 THEN $9 ELSE category END,
                   expiry_date = CASE WHEN $10 THEN $11 ELSE expiry_date END,
                   image_url   = CASE WHEN $12 THEN $13 ELSE image_url END,
                   is_expired  = COALESCE($14, is_expired)
             WHERE id = $1 AND user_id = $2
            RETURNING {PANTRY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(p.name)
        .bind(p.quantity.is_some())
        .bind(p.quantity.flatten())
        .bind(p.unit.is_some())
        .bind(p.unit.flatten())
        .bind(p.category.is_some())
        .bind(p.category.flatten())
        .bind(p.expiry_date.is_some())
        .bind(p.expiry_date.flatten())
        .bind(p.image_url.is_some())
        .bind(p.image_url.flatten())
        .bind(p.is_expired)
        .fetch_optional(&self.db)
        .await
        .context("update pantry item")
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM pantry_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete pantry item")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_all(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM pantry_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete all pantry items")?;
        Ok(res.rows_affected())
    }

    async fn list_expiring(
        &self,
        user_id: Uuid,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> anyhow::Result<Vec<PantryItem>> {
        sqlx::query_as::<_, PantryItem>(&format!(
            r#"
            SELECT {PANTRY_COLUMNS}
              FROM pantry_items
             WHERE user_id = $1
               AND is_expired = FALSE
               AND expiry_date BETWEEN $2 AND $3
             ORDER BY expiry_date ASC
            "#
        ))
        .bind(user_id)
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await
        .context("list expiring pantry items")
    }
}

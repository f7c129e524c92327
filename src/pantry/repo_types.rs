use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PantryItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expiry_date: Option<OffsetDateTime>,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
    pub is_expired: bool,
}

impl PantryItem {
    /// Past its expiry date but not yet flagged.
    pub fn is_stale(&self, now: OffsetDateTime) -> bool {
        !self.is_expired && matches!(self.expiry_date, Some(d) if d < now)
    }
}

#[derive(Debug, Clone)]
pub struct NewPantryItem {
    pub user_id: Uuid,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub expiry_date: Option<OffsetDateTime>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PantryPatch {
    pub name: Option<String>,
    pub quantity: Option<Option<String>>,
    pub unit: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub expiry_date: Option<Option<OffsetDateTime>>,
    pub image_url: Option<Option<String>>,
    pub is_expired: Option<bool>,
}

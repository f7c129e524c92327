use serde::{de, Deserialize, Deserializer, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
};

use crate::patch::nullable;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePantryItemRequest {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "expiry_date")]
    pub expiry_date: Option<OffsetDateTime>,
    pub image_url: Option<String>,
}

/// Body of `POST /pantry/batch`.
#[derive(Debug, Deserialize)]
pub struct AddIngredientsRequest {
    pub ingredients: Vec<CreatePantryItemRequest>,
}

/// Partial update; an explicit `null` clears a nullable field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePantryItemRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub quantity: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_expiry_date")]
    pub expiry_date: Option<Option<OffsetDateTime>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_expiry_date(raw: &str) -> Result<OffsetDateTime, String> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|d| d.midnight().assume_utc())
        .map_err(|_| format!("invalid expiryDate `{raw}`"))
}

fn expiry_date<'de, D>(d: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(d)?
        .map(|s| parse_expiry_date(&s).map_err(de::Error::custom))
        .transpose()
}

fn nullable_expiry_date<'de, D>(d: D) -> Result<Option<Option<OffsetDateTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    expiry_date(d).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn accepts_timestamp_and_plain_date() {
        assert_eq!(
            parse_expiry_date("2025-03-01T10:30:00Z").unwrap(),
            datetime!(2025-03-01 10:30 UTC)
        );
        assert_eq!(
            parse_expiry_date("2025-03-01").unwrap(),
            datetime!(2025-03-01 0:00 UTC)
        );
        assert!(parse_expiry_date("next tuesday").is_err());
    }

    #[test]
    fn update_tells_null_from_absent() {
        let req: UpdatePantryItemRequest =
            serde_json::from_str(r#"{"expiryDate":null,"unit":null}"#).unwrap();
        assert_eq!(req.expiry_date, Some(None));
        assert_eq!(req.unit, Some(None));
        assert_eq!(req.quantity, None);
        assert_eq!(req.category, None);

        let req: UpdatePantryItemRequest =
            serde_json::from_str(r#"{"expiryDate":"2025-01-02","quantity":"3"}"#).unwrap();
        assert_eq!(req.expiry_date, Some(Some(datetime!(2025-01-02 0:00 UTC))));
        assert_eq!(req.quantity, Some(Some("3".to_string())));

        assert!(serde_json::from_str::<UpdatePantryItemRequest>(r#"{"expiryDate":"soon"}"#).is_err());
    }

    #[test]
    fn expiry_is_optional_in_payloads() {
        let req: CreatePantryItemRequest =
            serde_json::from_str(r#"{"name":"Milk","quantity":"1","unit":"l"}"#).unwrap();
        assert!(req.expiry_date.is_none());

        let req: CreatePantryItemRequest =
            serde_json::from_str(r#"{"name":"Milk","expiryDate":"2025-01-02"}"#).unwrap();
        assert_eq!(req.expiry_date, Some(datetime!(2025-01-02 0:00 UTC)));

        let req: CreatePantryItemRequest =
            serde_json::from_str(r#"{"name":"Milk","expiryDate":null}"#).unwrap();
        assert!(req.expiry_date.is_none());

        assert!(serde_json::from_str::<CreatePantryItemRequest>(
            r#"{"name":"Milk","expiryDate":"soon"}"#
        )
        .is_err());
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Service catalog
// =============================================================================

/// Category of a catalog service.
///
/// Open enum: the six default values are fixed, but users may register
/// arbitrary custom category strings at runtime. Serialized as the plain
/// lowercase string in both directions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceCategory {
    Hosting,
    Design,
    Marketing,
    Maintenance,
    Consulting,
    Other,
    Custom(String),
}

impl ServiceCategory {
    /// The six built-in categories, in display order.
    pub const DEFAULTS: [ServiceCategory; 6] = [
        ServiceCategory::Hosting,
        ServiceCategory::Design,
        ServiceCategory::Marketing,
        ServiceCategory::Maintenance,
        ServiceCategory::Consulting,
        ServiceCategory::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ServiceCategory::Hosting => "hosting",
            ServiceCategory::Design => "design",
            ServiceCategory::Marketing => "marketing",
            ServiceCategory::Maintenance => "maintenance",
            ServiceCategory::Consulting => "consulting",
            ServiceCategory::Other => "other",
            ServiceCategory::Custom(s) => s,
        }
    }

    /// True for one of the six built-in categories.
    pub fn is_default(&self) -> bool {
        !matches!(self, ServiceCategory::Custom(_))
    }
}

impl From<String> for ServiceCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "hosting" => ServiceCategory::Hosting,
            "design" => ServiceCategory::Design,
            "marketing" => ServiceCategory::Marketing,
            "maintenance" => ServiceCategory::Maintenance,
            "consulting" => ServiceCategory::Consulting,
            "other" => ServiceCategory::Other,
            _ => ServiceCategory::Custom(value),
        }
    }
}

impl From<ServiceCategory> for String {
    fn from(value: ServiceCategory) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reusable billable line-item type with a default price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    pub id: String,
    pub name: String,
    pub default_cost: Decimal,
    pub category: ServiceCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// Address
// =============================================================================

/// Client address: either the structured shape or the legacy single-string
/// form still present in older records. Display code should always go
/// through [`Address::to_structured`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Address {
    Structured(StructuredAddress),
    Legacy(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAddress {
    pub street: String,
    pub city: String,
    /// Two-letter state code.
    pub state: String,
    pub zip_code: String,
}

impl Address {
    /// Normalize to the structured shape.
    ///
    /// Legacy strings are split on commas: first segment is the street,
    /// second the city, and the third segment's first token is the state
    /// with the remainder as the zip code.
    pub fn to_structured(&self) -> StructuredAddress {
        match self {
            Address::Structured(s) => s.clone(),
            Address::Legacy(raw) => {
                let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
                let street = parts.first().copied().unwrap_or("").to_string();
                let city = parts.get(1).copied().unwrap_or("").to_string();
                let (state, zip_code) = match parts.get(2) {
                    Some(tail) => {
                        let mut tokens = tail.split_whitespace();
                        let state = tokens.next().unwrap_or("").to_string();
                        let zip = tokens.collect::<Vec<_>>().join(" ");
                        (state, zip)
                    }
                    None => (String::new(), String::new()),
                };
                StructuredAddress {
                    street,
                    city,
                    state,
                    zip_code,
                }
            }
        }
    }
}

impl Default for Address {
    fn default() -> Self {
        Address::Structured(StructuredAddress::default())
    }
}

// =============================================================================
// Clients
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Active,
    Inactive,
}

/// A billed company/account.
///
/// Invariant: `end_date` is present if and only if `status` is inactive.
/// The transition helpers in `services::clients` are the only code that
/// should flip `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub company_name: String,
    #[serde(default)]
    pub address: Address,
    pub account_manager_name: String,
    pub main_contact: String,
    pub email: String,
    pub phone: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub status: ClientStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contact_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub work_logs: Vec<WorkLog>,
}

// =============================================================================
// Work logs
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
}

/// A task / time-tracking entry owned by a client.
///
/// If `start_time` is set and `end_time` is unset the entry is in progress;
/// `duration_minutes` holds time accumulated over prior start/stop cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLog {
    pub id: String,
    pub client_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: i64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_recurrence_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkLog {
    /// True while a tracking session is running.
    pub fn in_progress(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_none()
    }
}

// =============================================================================
// Assignment ledger
// =============================================================================

/// One catalog service billed to one client, with optional overrides.
///
/// `custom_cost` is a real override even when it is zero — resolution must
/// never fall back to the default just because the override is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientServiceAssignment {
    pub id: String,
    pub client_id: String,
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub is_active: bool,
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
}

/// An operations-team user. Admins carry every manager capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountManagerUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_defaults_and_custom() {
        let hosting: ServiceCategory = "hosting".to_string().into();
        assert_eq!(hosting, ServiceCategory::Hosting);
        assert!(hosting.is_default());

        let seo: ServiceCategory = "seo".to_string().into();
        assert_eq!(seo, ServiceCategory::Custom("seo".to_string()));
        assert!(!seo.is_default());
        assert_eq!(String::from(seo), "seo");
    }

    #[test]
    fn test_category_serde_is_plain_string() {
        let json = serde_json::to_string(&ServiceCategory::Custom("seo".into())).unwrap();
        assert_eq!(json, "\"seo\"");
        let back: ServiceCategory = serde_json::from_str("\"maintenance\"").unwrap();
        assert_eq!(back, ServiceCategory::Maintenance);
    }

    #[test]
    fn test_legacy_address_parse() {
        let addr = Address::Legacy("123 Main St, Springfield, IL 62704".to_string());
        let s = addr.to_structured();
        assert_eq!(s.street, "123 Main St");
        assert_eq!(s.city, "Springfield");
        assert_eq!(s.state, "IL");
        assert_eq!(s.zip_code, "62704");
    }

    #[test]
    fn test_legacy_address_parse_partial() {
        let s = Address::Legacy("456 Oak Ave".to_string()).to_structured();
        assert_eq!(s.street, "456 Oak Ave");
        assert_eq!(s.city, "");
        assert_eq!(s.state, "");
        assert_eq!(s.zip_code, "");
    }

    #[test]
    fn test_structured_address_passthrough() {
        let structured = StructuredAddress {
            street: "1 Elm".into(),
            city: "Portland".into(),
            state: "OR".into(),
            zip_code: "97201".into(),
        };
        let addr = Address::Structured(structured.clone());
        assert_eq!(addr.to_structured(), structured);
    }

    #[test]
    fn test_address_serde_untagged() {
        let legacy: Address = serde_json::from_str("\"9 Pine Rd, Austin, TX 78701\"").unwrap();
        assert!(matches!(legacy, Address::Legacy(_)));

        let structured: Address = serde_json::from_str(
            r#"{"street":"1 Elm","city":"Portland","state":"OR","zipCode":"97201"}"#,
        )
        .unwrap();
        assert!(matches!(structured, Address::Structured(_)));
    }
}

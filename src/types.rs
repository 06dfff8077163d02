use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::Hash;

use crate::error::{PropdeskError, Result};

/// Anything that can live in a paged list: it has a stable identity.
pub trait Identified {
    type Id: Eq + Hash + Clone + fmt::Debug + Send + Sync;

    fn id(&self) -> Self::Id;
}

/// One batch returned by a page fetch.
///
/// `success == false` means the server answered but had nothing for us;
/// transport failures never show up here, they are errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub success: bool,
    pub message: Option<String>,
    /// The server said outright that this is the last page.
    pub no_more: bool,
}

impl<T> Page<T> {
    pub fn ok(items: Vec<T>) -> Self {
        Self {
            items,
            success: true,
            message: None,
            no_more: false,
        }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self {
            no_more: true,
            ..Self::ok(items)
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            success: false,
            message: Some(message.into()),
            no_more: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingKind {
    Sale,
    Rent,
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingKind::Sale => f.pad("Sale"),
            ListingKind::Rent => f.pad("Rent"),
        }
    }
}

/// Property listing as returned by `getAllProperty`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Property {
    #[serde(rename = "ID")]
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_listing_kind")]
    pub listing_kind: ListingKind,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub area_sq_ft: Option<f64>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

fn default_listing_kind() -> ListingKind {
    ListingKind::Sale
}

impl Identified for Property {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

/// CRM client owned by a partner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(alias = "ID", alias = "clientId")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub assigned_users: Vec<u64>,
    #[serde(default)]
    pub follow_up: Option<FollowUp>,
    #[serde(default)]
    pub activities: Vec<ClientActivity>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for Client {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Buyer,
    Seller,
    Partner,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buyer" => Ok(Role::Buyer),
            "seller" => Ok(Role::Seller),
            "partner" => Ok(Role::Partner),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Buyer => f.pad("Buyer"),
            Role::Seller => f.pad("Seller"),
            Role::Partner => f.pad("Partner"),
            Role::Admin => f.pad("Admin"),
        }
    }
}

/// Marketplace account (admin user list, assignable partner staff)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "ID")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

impl Identified for User {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

/// A property the buyer reached out about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactedProperty {
    #[serde(alias = "ID")]
    pub id: u64,
    pub property_id: u64,
    pub title: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub contacted_at: Option<DateTime<Utc>>,
}

impl Identified for ContactedProperty {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

/// Someone who viewed one of the seller's listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    pub visitor_id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub property_id: u64,
    #[serde(default)]
    pub visited_at: Option<DateTime<Utc>>,
}

impl Identified for Visitor {
    type Id = String;

    fn id(&self) -> String {
        self.visitor_id.clone()
    }
}

/// Partner message template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTemplate {
    #[serde(alias = "ID")]
    pub id: u64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for ContentTemplate {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowUpStatus {
    Pending,
    Completed,
}

impl FollowUpStatus {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            FollowUpStatus::Pending => "Pending",
            FollowUpStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for FollowUpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_api_str())
    }
}

/// Reminder attached to a client. `date == None` is "someday".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    pub id: u64,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub status: FollowUpStatus,
    pub user_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Call,
    Message,
    Meeting,
    Visit,
    Note,
}

impl ActivityKind {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            ActivityKind::Call => "Call",
            ActivityKind::Message => "Message",
            ActivityKind::Meeting => "Meeting",
            ActivityKind::Visit => "Visit",
            ActivityKind::Note => "Note",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_api_str())
    }
}

/// Entry on a client's activity timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientActivity {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub client_id: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_created_by")]
    pub created_by: CreatedBy,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Author of an activity.
///
/// The API ships this either as a nested object or as a JSON object encoded
/// inside a string field. Both shapes land here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBy {
    #[serde(default, alias = "id")]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub name: String,
}

impl Default for CreatedBy {
    fn default() -> Self {
        Self {
            user_id: None,
            name: "Unknown".to_string(),
        }
    }
}

impl CreatedBy {
    /// Parse the string-encoded form.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PropdeskError::Decode("empty createdBy".into()));
        }
        serde_json::from_str(raw)
            .map_err(|e| PropdeskError::Decode(format!("malformed createdBy: {}", e)))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CreatedByWire {
    Nested(CreatedBy),
    Encoded(String),
}

fn deserialize_created_by<'de, D>(deserializer: D) -> std::result::Result<CreatedBy, D::Error>
where
    D: Deserializer<'de>,
{
    let wire = Option::<CreatedByWire>::deserialize(deserializer)?;
    Ok(match wire {
        Some(CreatedByWire::Nested(created_by)) => created_by,
        Some(CreatedByWire::Encoded(raw)) => CreatedBy::parse(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to unknown activity author");
            CreatedBy::default()
        }),
        None => CreatedBy::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_reads_pascal_case_wire_names() {
        let json = r#"{"ID": 42, "Title": "2BHK near park", "Price": 5500000.0, "City": "Pune", "ListingKind": "Rent"}"#;
        let property: Property = serde_json::from_str(json).unwrap();
        assert_eq!(property.id(), 42);
        assert_eq!(property.city.as_deref(), Some("Pune"));
        assert_eq!(property.listing_kind, ListingKind::Rent);
        assert!(!property.is_featured);
    }

    #[test]
    fn visitor_identity_is_string() {
        let json = r#"{"visitorId": "v-17", "name": "Asha", "propertyId": 3}"#;
        let visitor: Visitor = serde_json::from_str(json).unwrap();
        assert_eq!(visitor.id(), "v-17");
    }

    #[test]
    fn created_by_nested_object() {
        let json = r#"{"id": 1, "type": "Call", "clientId": 9, "description": "rang", "createdBy": {"userId": 5, "name": "Ravi"}}"#;
        let activity: ClientActivity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.created_by.user_id, Some(5));
        assert_eq!(activity.created_by.name, "Ravi");
    }

    #[test]
    fn created_by_string_encoded() {
        let json = r#"{"id": 1, "type": "Note", "clientId": 9, "createdBy": "{\"userId\": 7, \"name\": \"Meera\"}"}"#;
        let activity: ClientActivity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.created_by.user_id, Some(7));
        assert_eq!(activity.created_by.name, "Meera");
    }

    #[test]
    fn created_by_malformed_falls_back() {
        let json = r#"{"id": 1, "type": "Visit", "clientId": 9, "createdBy": "{not json"}"#;
        let activity: ClientActivity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.created_by, CreatedBy::default());
    }

    #[test]
    fn created_by_parse_reports_errors() {
        assert!(CreatedBy::parse("").is_err());
        assert!(CreatedBy::parse("[1,2]").is_err());
        let parsed = CreatedBy::parse(r#"{"name": "Ravi"}"#).unwrap();
        assert_eq!(parsed.user_id, None);
    }

    #[test]
    fn follow_up_without_date_is_someday() {
        let json = r#"{"id": 3, "date": null, "status": "Pending", "userId": 2}"#;
        let follow_up: FollowUp = serde_json::from_str(json).unwrap();
        assert_eq!(follow_up.date, None);
        assert_eq!(follow_up.status, FollowUpStatus::Pending);
    }
}

// Data models for the auth/role core and the listing workflow.
//
// All models serialize camelCase to match the hosted backend's row shape.
// Every value here is a cached projection of backend state, never the
// source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric role id used by the role-assignment table.
pub type RoleId = i64;

// ─── Identity / Role / Session ───────────────────────────────────

/// Read-only cached copy of the backend auth service's user record.
///
/// `metadata` carries the claims the auth service projects out of the
/// session token (including an optional `role` claim); `raw_token` is the
/// opaque credential the backend issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub raw_token: String,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: impl Into<String>, raw_token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into().to_lowercase(),
            metadata: serde_json::Map::new(),
            raw_token: raw_token.into(),
        }
    }

    /// The `role` claim from the token metadata, if the backend embedded one.
    pub fn role_claim(&self) -> Option<&str> {
        self.metadata.get("role").and_then(|v| v.as_str())
    }
}

/// Authorization level derived from an identity.
///
/// The one authoritative representation: call sites consume this enum,
/// never a raw boolean or string. `Admin` implies all `User` capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Broker,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Broker => "broker",
            Role::Admin => "admin",
        }
    }

    /// Whether this role may run moderation transitions.
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Whether this role grants at least the capabilities of `other`.
    pub fn at_least(&self, other: Role) -> bool {
        *self >= other
    }

    /// Parse a token role claim. Only `admin` and `user` claims are
    /// recognized; anything else falls through to the table lookups.
    pub fn from_claim(claim: &str) -> Option<Role> {
        match claim {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A token-backed proof of an authenticated identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub identity: Identity,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Row in the dedicated admin-membership table, keyed by email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted client-side role/identity snapshot.
///
/// Only ever an optimistic-render hint: reconciled against a fresh
/// resolution on the next load and cleared unconditionally on sign-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSnapshot {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub cached_at: DateTime<Utc>,
}

// ─── Listings ────────────────────────────────────────────────────

/// Moderation status of a listing. `Pending` is the initial state; all
/// three states are mutually reachable by an ADMIN actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
            ListingStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A property-for-sale record subject to the moderation workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    /// Asking price in whole dollars.
    pub price: i64,
    pub description: String,
    pub location: String,
    pub status: ListingStatus,
    /// Set only on transition to `rejected`; cleared on `approved`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Build a new `pending` listing from a draft, stamping ownership.
    pub fn new(draft: ListingDraft, owner_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title,
            price: draft.price,
            description: draft.description,
            location: draft.location,
            status: ListingStatus::Pending,
            rejection_reason: None,
            owner_id: owner_id.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Create payload for a new listing. Status and ownership are stamped by
/// the service, not supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub title: String,
    pub price: i64,
    pub description: String,
    pub location: String,
}

/// Content-edit payload. Deliberately has no `status` field, so owner
/// edits cannot reach the moderation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.location.is_none()
    }
}

// ─── Assets ──────────────────────────────────────────────────────

/// What kind of file an asset is; decides the storage bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Document,
}

/// Metadata row for an uploaded image or document, owned by its listing.
/// At most one asset per listing may have `is_primary = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingAsset {
    pub id: String,
    pub listing_id: String,
    pub storage_path: String,
    pub position: i32,
    pub is_primary: bool,
    pub file_type: AssetKind,
}

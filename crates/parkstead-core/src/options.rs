// ParksteadOptions — configuration for the auth/role core and the listing
// services, with nested sections and defaults for every knob.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{AssetKind, RoleId};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParksteadOptions {
    /// App name for branding in logs and emails.
    pub app_name: String,

    /// Bounded timeout for a full role-resolution pass, in milliseconds.
    /// On expiry the fallback role is used and the late result discarded.
    pub role_resolution_timeout_ms: u64,

    /// Safety timeout for the initial session fetch, in milliseconds.
    /// Forces `Loading -> Unauthenticated` when the backend never answers.
    pub init_timeout_ms: u64,

    /// Redirect URL embedded in password-reset emails.
    pub password_reset_redirect_url: String,

    pub roles: RoleIdConfig,
    pub moderation: ModerationConfig,
    pub uploads: UploadConfig,
}

impl Default for ParksteadOptions {
    fn default() -> Self {
        Self {
            app_name: "Parkstead".to_string(),
            role_resolution_timeout_ms: 2_000,
            init_timeout_ms: 5_000,
            password_reset_redirect_url: "https://parkstead.com/reset-password".to_string(),
            roles: RoleIdConfig::default(),
            moderation: ModerationConfig::default(),
            uploads: UploadConfig::default(),
        }
    }
}

impl ParksteadOptions {
    pub fn role_resolution_timeout(&self) -> Duration {
        Duration::from_millis(self.role_resolution_timeout_ms)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }
}

/// Mapping between the role-assignment table's numeric ids and roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleIdConfig {
    /// Role id written for new identities at sign-up.
    pub user_role_id: RoleId,
    /// Role id that resolves to ADMIN.
    pub admin_role_id: RoleId,
    /// Role id that resolves to BROKER.
    pub broker_role_id: RoleId,
}

impl Default for RoleIdConfig {
    fn default() -> Self {
        Self {
            user_role_id: 1,
            admin_role_id: 2,
            broker_role_id: 3,
        }
    }
}

/// Moderation workflow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModerationConfig {
    /// Reason recorded when a rejection is submitted without one.
    pub default_rejection_reason: String,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            default_rejection_reason: "No reason provided".to_string(),
        }
    }
}

/// Asset upload configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadConfig {
    /// Maximum number of asset uploads in flight at once.
    pub max_concurrent_uploads: usize,
    /// Bucket for listing images.
    pub image_bucket: String,
    /// Bucket for listing documents.
    pub document_bucket: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_uploads: 4,
            image_bucket: "listing-images".to_string(),
            document_bucket: "listing-documents".to_string(),
        }
    }
}

impl UploadConfig {
    /// Bucket name for an asset kind.
    pub fn bucket_for(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Image => &self.image_bucket,
            AssetKind::Document => &self.document_bucket,
        }
    }
}

// In-memory role-lookup tables. The role-assignment fake supports
// scripted per-call responses with latency, which is how the integration
// suite makes resolution races deterministic.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use parkstead_core::backend::directory::{AdminDirectory, RoleAssignments};
use parkstead_core::backend::BackendResult;
use parkstead_core::error::ParksteadError;
use parkstead_core::models::{AdminRecord, RoleId};

/// In-memory [`AdminDirectory`].
pub struct MemoryAdminDirectory {
    rows: RwLock<Vec<AdminRecord>>,
    lookup_delay: RwLock<Option<Duration>>,
    fail_lookups: AtomicBool,
}

impl MemoryAdminDirectory {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            lookup_delay: RwLock::new(None),
            fail_lookups: AtomicBool::new(false),
        }
    }

    /// Add an admin row for an email.
    pub async fn add(&self, email: &str) {
        self.rows.write().await.push(AdminRecord {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_lowercase(),
            created_at: Utc::now(),
        });
    }

    pub async fn remove(&self, email: &str) {
        let email = email.to_lowercase();
        self.rows.write().await.retain(|row| row.email != email);
    }

    pub async fn set_lookup_delay(&self, delay: Option<Duration>) {
        *self.lookup_delay.write().await = delay;
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryAdminDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdminDirectory for MemoryAdminDirectory {
    async fn find_by_email(&self, email: &str) -> BackendResult<Option<AdminRecord>> {
        let delay = *self.lookup_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(ParksteadError::Backend(
                "admin directory unavailable".to_string(),
            ));
        }
        let email = email.to_lowercase();
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|row| row.email == email)
            .cloned())
    }
}

impl std::fmt::Debug for MemoryAdminDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAdminDirectory").finish()
    }
}

/// In-memory [`RoleAssignments`].
pub struct MemoryRoleAssignments {
    rows: RwLock<HashMap<String, Vec<RoleId>>>,
    /// Scripted responses popped one per lookup call, each with its own
    /// latency. When empty, lookups fall back to `rows`.
    scripted: Mutex<VecDeque<(Vec<RoleId>, Duration)>>,
    fail_lookups: AtomicBool,
    fail_assign: AtomicBool,
}

impl MemoryRoleAssignments {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            scripted: Mutex::new(VecDeque::new()),
            fail_lookups: AtomicBool::new(false),
            fail_assign: AtomicBool::new(false),
        }
    }

    /// Replace a user's assignment rows.
    pub async fn set_roles(&self, user_id: &str, role_ids: Vec<RoleId>) {
        self.rows
            .write()
            .await
            .insert(user_id.to_string(), role_ids);
    }

    pub async fn assignments_for(&self, user_id: &str) -> Vec<RoleId> {
        self.rows
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Queue a scripted lookup response: the next call sleeps `delay`
    /// then returns `role_ids`, regardless of the stored rows.
    pub fn script_lookup(&self, role_ids: Vec<RoleId>, delay: Duration) {
        self.scripted.lock().unwrap().push_back((role_ids, delay));
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_assign(&self, fail: bool) {
        self.fail_assign.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryRoleAssignments {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleAssignments for MemoryRoleAssignments {
    async fn list_role_ids_for_user(&self, user_id: &str) -> BackendResult<Vec<RoleId>> {
        let scripted = self.scripted.lock().unwrap().pop_front();
        if let Some((role_ids, delay)) = scripted {
            tokio::time::sleep(delay).await;
            return Ok(role_ids);
        }
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(ParksteadError::Backend(
                "role assignments unavailable".to_string(),
            ));
        }
        Ok(self
            .rows
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn assign(&self, user_id: &str, role_id: RoleId) -> BackendResult<()> {
        if self.fail_assign.load(Ordering::SeqCst) {
            return Err(ParksteadError::Backend(
                "role assignment write rejected".to_string(),
            ));
        }
        self.rows
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(role_id);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryRoleAssignments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRoleAssignments").finish()
    }
}

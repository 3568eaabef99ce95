//! Entity-level local store.
//!
//! Implements the local half of every storage operation on top of the
//! [`KeyValueStore`] port. Records are JSON blobs under `lh_`-namespaced
//! keys; project lists are scoped by the signed-in user's normalized
//! email.

use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::kv::KeyValueStore;
use chrono::Utc;
use learnhub_types::{
    Activity, Badge, Project, Resource, Role, Settings, User, UserAccount, level_for_xp,
    normalize_email,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static MINT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Time-based synthetic id, disambiguated for same-millisecond mints.
fn mint_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let seq = MINT_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{millis}_{seq}")
}

/// The combined `lh_data` blob. Unknown fields are carried through
/// rewrites untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DataBlob {
    #[serde(default)]
    badges: Vec<Badge>,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

/// Snapshot of the four raw local settings keys, as the migration routine
/// reads them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawLocalSettings {
    pub theme: Option<String>,
    pub font_size: Option<String>,
    pub notifications: Option<String>,
    pub language: Option<String>,
}

impl RawLocalSettings {
    /// True when none of the four keys exist.
    pub fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.font_size.is_none()
            && self.notifications.is_none()
            && self.language.is_none()
    }
}

/// Local persistence adapter over a [`KeyValueStore`].
pub struct LocalStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.kv.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        self.kv.set(key, &serde_json::to_string(value)?)
    }

    // ── Accounts ──

    /// Looks up an account by normalized email and checks the password.
    ///
    /// On success the password-stripped public record is persisted as the
    /// current user and returned.
    pub fn login(&self, email: &str, password: &str) -> StoreResult<User> {
        let email = normalize_email(email);
        let accounts: Vec<UserAccount> = self.read_json(keys::USERS)?.unwrap_or_default();
        let account = accounts
            .iter()
            .find(|a| a.email == email)
            .ok_or(StoreError::UserNotFound)?;
        if account.password != password {
            return Err(StoreError::InvalidCredential);
        }
        let user = account.to_user();
        self.write_json(keys::CURRENT_USER, &user)?;
        Ok(user)
    }

    /// Appends a new account and signs it in. Fails with
    /// [`StoreError::DuplicateAccount`] when the normalized email is
    /// already taken, leaving the account list untouched.
    pub fn signup(&self, name: &str, email: &str, password: &str, role: Role) -> StoreResult<User> {
        let email = normalize_email(email);
        let mut accounts: Vec<UserAccount> = self.read_json(keys::USERS)?.unwrap_or_default();
        if accounts.iter().any(|a| a.email == email) {
            return Err(StoreError::DuplicateAccount);
        }
        let account = UserAccount {
            name: name.to_string(),
            email,
            password: password.to_string(),
            role,
        };
        let user = account.to_user();
        accounts.push(account);
        self.write_json(keys::USERS, &accounts)?;
        self.write_json(keys::CURRENT_USER, &user)?;
        Ok(user)
    }

    pub fn logout(&self) -> StoreResult<()> {
        self.kv.remove(keys::CURRENT_USER)
    }

    pub fn current_user(&self) -> StoreResult<Option<User>> {
        self.read_json(keys::CURRENT_USER)
    }

    // ── Projects ──

    /// Inserts (minting a time-based synthetic id) or updates in place by
    /// id. An update whose id matches nothing writes nothing.
    pub fn save_project(&self, mut project: Project) -> StoreResult<Project> {
        let user = self.current_user()?.ok_or(StoreError::NoCurrentUser)?;
        let key = keys::projects(&user.email);
        let mut projects: Vec<Project> = self.read_json(&key)?.unwrap_or_default();
        match project.id {
            Some(ref id) => {
                if let Some(slot) = projects.iter_mut().find(|p| p.id.as_deref() == Some(id.as_str())) {
                    *slot = project.clone();
                }
            }
            None => {
                project.id = Some(mint_id("proj"));
                projects.push(project.clone());
            }
        }
        self.write_json(&key, &projects)?;
        Ok(project)
    }

    /// Projects of the signed-in user, in insertion order. Empty when
    /// nobody is signed in.
    pub fn projects(&self) -> StoreResult<Vec<Project>> {
        match self.current_user()? {
            Some(user) => Ok(self.read_json(&keys::projects(&user.email))?.unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    pub fn delete_project(&self, project_id: &str) -> StoreResult<()> {
        let user = self.current_user()?.ok_or(StoreError::NoCurrentUser)?;
        let key = keys::projects(&user.email);
        let mut projects: Vec<Project> = self.read_json(&key)?.unwrap_or_default();
        projects.retain(|p| p.id.as_deref() != Some(project_id));
        self.write_json(&key, &projects)
    }

    // ── Activities ──

    /// Inserts (minting a time-based synthetic id) or updates in place by
    /// id, under the activity's project key.
    pub fn save_activity(&self, mut activity: Activity) -> StoreResult<Activity> {
        let key = keys::activities(&activity.project_id);
        let mut activities: Vec<Activity> = self.read_json(&key)?.unwrap_or_default();
        match activity.id {
            Some(ref id) => {
                if let Some(slot) = activities.iter_mut().find(|a| a.id.as_deref() == Some(id.as_str())) {
                    *slot = activity.clone();
                }
            }
            None => {
                activity.id = Some(mint_id("act"));
                activities.push(activity.clone());
            }
        }
        self.write_json(&key, &activities)?;
        Ok(activity)
    }

    pub fn activities(&self, project_id: &str) -> StoreResult<Vec<Activity>> {
        Ok(self.read_json(&keys::activities(project_id))?.unwrap_or_default())
    }

    // ── Resources ──

    pub fn save_resource(&self, mut resource: Resource) -> StoreResult<Resource> {
        let key = keys::resources(&resource.project_id);
        let mut resources: Vec<Resource> = self.read_json(&key)?.unwrap_or_default();
        match resource.id {
            Some(ref id) => {
                if let Some(slot) = resources.iter_mut().find(|r| r.id.as_deref() == Some(id.as_str())) {
                    *slot = resource.clone();
                }
            }
            None => {
                resource.id = Some(mint_id("res"));
                resources.push(resource.clone());
            }
        }
        self.write_json(&key, &resources)?;
        Ok(resource)
    }

    pub fn resources(&self, project_id: &str) -> StoreResult<Vec<Resource>> {
        Ok(self.read_json(&keys::resources(project_id))?.unwrap_or_default())
    }

    // ── Badges ──

    /// Stores a badge unless its id is already present; a duplicate award
    /// is silently ignored. The earned-at timestamp is stamped on first
    /// store.
    pub fn save_badge(&self, mut badge: Badge) -> StoreResult<Badge> {
        let mut blob: DataBlob = self.read_json(keys::DATA)?.unwrap_or_default();
        if blob.badges.iter().any(|b| b.id == badge.id) {
            debug!(badge = %badge.id, "duplicate badge award ignored");
            return Ok(badge);
        }
        if badge.earned_at.is_none() {
            badge.earned_at = Some(Utc::now());
        }
        blob.badges.push(badge.clone());
        self.write_json(keys::DATA, &blob)?;
        Ok(badge)
    }

    pub fn badges(&self) -> StoreResult<Vec<Badge>> {
        Ok(self
            .read_json::<DataBlob>(keys::DATA)?
            .unwrap_or_default()
            .badges)
    }

    // ── XP ──

    /// Adds XP to the stored public user record and recomputes the level.
    /// No-op when nobody is signed in.
    pub fn add_xp(&self, delta: i64) -> StoreResult<()> {
        let Some(mut user) = self.current_user()? else {
            return Ok(());
        };
        user.xp_total += delta;
        user.level = level_for_xp(user.xp_total);
        self.write_json(keys::CURRENT_USER, &user)
    }

    // ── Settings ──

    /// Writes the four individual settings keys.
    pub fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        self.kv.set(keys::THEME, &settings.theme)?;
        let font_size = settings
            .ui_preferences
            .get("fontSize")
            .and_then(Value::as_str)
            .unwrap_or("medium");
        self.kv.set(keys::FONT_SIZE, font_size)?;
        let flag = if settings.notifications.email { "true" } else { "false" };
        self.kv.set(keys::NOTIFICATIONS, flag)?;
        self.kv.set(keys::LANGUAGE, &settings.language)
    }

    /// Reads settings, defaulting each missing key individually. The
    /// stored notifications flag only drives the email preference; the
    /// rest of the preference set keeps its defaults.
    pub fn settings(&self) -> StoreResult<Settings> {
        let mut settings = Settings::default();
        if let Some(theme) = self.kv.get(keys::THEME)? {
            settings.theme = theme;
        }
        if let Some(language) = self.kv.get(keys::LANGUAGE)? {
            settings.language = language;
        }
        if let Some(flag) = self.kv.get(keys::NOTIFICATIONS)? {
            settings.notifications.email = flag == "true";
        }
        let font_size = self
            .kv
            .get(keys::FONT_SIZE)?
            .unwrap_or_else(|| "medium".to_string());
        settings.ui_preferences = serde_json::json!({ "fontSize": font_size });
        Ok(settings)
    }

    /// Raw values of the four settings keys, for the migration routine.
    pub fn raw_settings(&self) -> StoreResult<RawLocalSettings> {
        Ok(RawLocalSettings {
            theme: self.kv.get(keys::THEME)?,
            font_size: self.kv.get(keys::FONT_SIZE)?,
            notifications: self.kv.get(keys::NOTIFICATIONS)?,
            language: self.kv.get(keys::LANGUAGE)?,
        })
    }

    // ── Migration marker ──

    pub fn migration_completed(&self) -> StoreResult<bool> {
        Ok(self.kv.get(keys::MIGRATION_COMPLETED)?.as_deref() == Some("true"))
    }

    /// Removes every `lh_` key except the migration marker and date, then
    /// sets both. This is the only path that marks the migration
    /// completed.
    pub fn clear_local_data(&self) -> StoreResult<()> {
        for key in self.kv.keys()? {
            if key.starts_with(keys::PREFIX)
                && key != keys::MIGRATION_COMPLETED
                && key != keys::MIGRATION_DATE
            {
                self.kv.remove(&key)?;
            }
        }
        self.kv.set(keys::MIGRATION_COMPLETED, "true")?;
        self.kv.set(keys::MIGRATION_DATE, &Utc::now().to_rfc3339())
    }
}

//! Shared entity records for the LearnHub data layer.
//!
//! Every persistence backend speaks these normalized shapes; each adapter
//! maps them to its own native representation (namespaced JSON keys
//! locally, table rows remotely) at the boundary. Free-form payloads
//! (phase data, metadata, UI preferences) stay as [`serde_json::Value`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// XP needed per level step.
pub const XP_PER_LEVEL: i64 = 100;

/// Derives the level for an XP total: `floor(total / 100) + 1`.
pub fn level_for_xp(total_xp: i64) -> i64 {
    total_xp / XP_PER_LEVEL + 1
}

/// Normalizes an email for use as a lookup key: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User role. The wire representation matches the hosted `profiles.role`
/// column values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[default]
    #[serde(rename = "Aluno")]
    Aluno,
    #[serde(rename = "Professor")]
    Professor,
    #[serde(rename = "Admin")]
    Admin,
}

/// Public user record returned by auth operations. Never carries a
/// password.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Backend-issued id in Remote mode; absent in Local mode, where the
    /// normalized email is the natural key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub xp_total: i64,
    #[serde(default = "default_level")]
    pub level: i64,
}

fn default_level() -> i64 {
    1
}

/// Full local account record, password included. Lives only in the local
/// account list; converted to a [`User`] before leaving the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub name: String,
    /// Stored normalized; see [`normalize_email`].
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl UserAccount {
    /// Password-stripped public view.
    pub fn to_user(&self) -> User {
        User {
            id: None,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            xp_total: 0,
            level: 1,
        }
    }
}

/// A learning project with its per-phase working data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Absent on a not-yet-saved draft. Local mode mints a time-based
    /// synthetic id; Remote mode uses the backend-issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_project_status")]
    pub status: String,
    #[serde(default)]
    pub phase_data: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Progress percentage, 0-100.
    #[serde(default)]
    pub progress: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_project_status() -> String {
    "active".to_string()
}

impl Project {
    /// A fresh draft with the given name and default everything else.
    pub fn draft(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            status: default_project_status(),
            phase_data: Value::Null,
            tags: Vec::new(),
            progress: 0,
            created_at: None,
            updated_at: None,
        }
    }
}

/// A single activity (nudge) inside a project phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub category: String,
    /// Catalog identifier of the activity within its phase/category.
    #[serde(default)]
    pub activity_ref: String,
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub completed: bool,
    /// Stamped at save time whenever `completed` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub attachments: Vec<Value>,
}

/// An earned achievement. The id is caller-supplied and is the dedup key
/// per owner: awarding the same id twice stores nothing the second time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    /// Experience points granted by the award.
    #[serde(default)]
    pub xp: i64,
    #[serde(default = "default_badge_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Value,
}

fn default_badge_category() -> String {
    "special".to_string()
}

/// Notification preference set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    pub email: bool,
    pub push: bool,
    pub nudges: bool,
    pub achievements: bool,
    pub feedback: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            email: true,
            push: false,
            nudges: true,
            achievements: true,
            feedback: true,
        }
    }
}

/// Who gets to see a slice of the user's data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Team,
    Private,
}

/// Privacy visibility set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyPrefs {
    pub profile_visibility: Visibility,
    pub projects_visibility: Visibility,
    pub achievements_visibility: Visibility,
}

impl Default for PrivacyPrefs {
    fn default() -> Self {
        Self {
            profile_visibility: Visibility::Public,
            projects_visibility: Visibility::Team,
            achievements_visibility: Visibility::Public,
        }
    }
}

/// Per-user settings, upserted as one record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: String,
    pub language: String,
    #[serde(default)]
    pub notifications: NotificationPrefs,
    #[serde(default)]
    pub privacy: PrivacyPrefs,
    #[serde(default)]
    pub ui_preferences: Value,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            language: "pt-BR".to_string(),
            notifications: NotificationPrefs::default(),
            privacy: PrivacyPrefs::default(),
            ui_preferences: Value::Object(serde_json::Map::new()),
        }
    }
}

/// A study resource attached to a project phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub phase: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One append-only audit record. The actor, client identification and
/// timestamp are attached by the remote adapter; Local mode drops these
/// entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub action: String,
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

impl ActivityLogEntry {
    pub fn new(action: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: None,
            metadata: Value::Object(serde_json::Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn level_starts_at_one() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
    }

    #[test]
    fn level_steps_every_hundred() {
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(105), 2);
        assert_eq!(level_for_xp(350), 4);
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ana.Silva@Example.COM "), "ana.silva@example.com");
    }

    #[test]
    fn role_wire_names_are_fixed() {
        assert_eq!(serde_json::to_string(&Role::Aluno).unwrap(), "\"Aluno\"");
        assert_eq!(serde_json::from_str::<Role>("\"Professor\"").unwrap(), Role::Professor);
    }

    #[test]
    fn account_to_user_drops_password() {
        let account = UserAccount {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "s3cret".into(),
            role: Role::Aluno,
        };
        let user = account.to_user();
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(user.name, "Ana");
        assert_eq!(user.level, 1);
    }

    #[test]
    fn settings_defaults_match_first_run() {
        let settings = Settings::default();
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.language, "pt-BR");
        assert!(settings.notifications.email);
        assert!(!settings.notifications.push);
        assert_eq!(settings.privacy.projects_visibility, Visibility::Team);
    }

    #[test]
    fn user_deserializes_with_missing_counters() {
        let user: User =
            serde_json::from_str(r#"{"email":"ana@example.com","name":"Ana","role":"Aluno"}"#)
                .unwrap();
        assert_eq!(user.xp_total, 0);
        assert_eq!(user.level, 1);
    }
}

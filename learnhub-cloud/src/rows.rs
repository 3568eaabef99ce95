//! Table row shapes and their entity mappings.
//!
//! Backend column names (`phase_data`, `progress_percentage`, `xp_total`,
//! `badge_id`, …) stay inside this module; the rest of the workspace only
//! sees the normalized `learnhub_types` records.

use chrono::{DateTime, Utc};
use learnhub_types::{
    Activity, ActivityLogEntry, Badge, NotificationPrefs, PrivacyPrefs, Project, Resource, Role,
    Settings, User,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// `profiles` table row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: Uuid,
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

impl From<ProfileRow> for User {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: Some(row.id.to_string()),
            email: row.email,
            name: row.name,
            role: row.role,
            xp_total: row.xp_total,
            level: row.level,
        }
    }
}

/// `projects` table row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub phase_data: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub progress_percentage: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectRow {
    /// Insert shape for a draft; the backend assigns id and timestamps.
    pub fn insert_from(project: &Project, user_id: Uuid) -> Self {
        Self {
            id: None,
            user_id,
            name: project.name.clone(),
            description: project.description.clone(),
            status: project.status.clone(),
            phase_data: project.phase_data.clone(),
            tags: project.tags.clone(),
            progress_percentage: project.progress,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn into_project(self) -> Project {
        Project {
            id: self.id,
            name: self.name,
            description: self.description,
            status: self.status,
            phase_data: self.phase_data,
            tags: self.tags,
            progress: self.progress_percentage,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// `activities` table row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivityRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub project_id: String,
    pub user_id: Uuid,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub activity_id: String,
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub attachments: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ActivityRow {
    pub fn insert_from(activity: &Activity, user_id: Uuid) -> Self {
        Self {
            id: None,
            project_id: activity.project_id.clone(),
            user_id,
            phase: activity.phase.clone(),
            category: activity.category.clone(),
            activity_id: activity.activity_ref.clone(),
            title: activity.title.clone(),
            detail: activity.detail.clone(),
            completed: activity.completed,
            completed_at: activity.completed_at,
            notes: activity.notes.clone(),
            attachments: activity.attachments.clone(),
            created_at: None,
        }
    }

    pub fn into_activity(self) -> Activity {
        Activity {
            id: self.id,
            project_id: self.project_id,
            phase: self.phase,
            category: self.category,
            activity_ref: self.activity_id,
            title: self.title,
            detail: self.detail,
            completed: self.completed,
            completed_at: self.completed_at,
            notes: self.notes,
            attachments: self.attachments,
        }
    }
}

/// `badges` table row. `badge_id` is the caller-supplied natural key,
/// unique per owner; `id` is the backend's own primary key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BadgeRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: Uuid,
    pub badge_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub xp: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_at: Option<DateTime<Utc>>,
}

impl BadgeRow {
    pub fn insert_from(badge: &Badge, user_id: Uuid) -> Self {
        Self {
            id: None,
            user_id,
            badge_id: badge.id.clone(),
            title: badge.title.clone(),
            description: badge.description.clone(),
            icon: badge.icon.clone(),
            xp: badge.xp,
            category: badge.category.clone(),
            metadata: badge.metadata.clone(),
            earned_at: badge.earned_at,
        }
    }

    pub fn into_badge(self) -> Badge {
        Badge {
            id: self.badge_id,
            title: self.title,
            description: self.description,
            icon: self.icon,
            xp: self.xp,
            category: self.category,
            earned_at: self.earned_at,
            metadata: self.metadata,
        }
    }
}

/// `user_settings` table row, keyed by the owner's id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettingsRow {
    pub id: Uuid,
    pub theme: String,
    pub language: String,
    #[serde(default)]
    pub notifications: NotificationPrefs,
    #[serde(default)]
    pub privacy: PrivacyPrefs,
    #[serde(default)]
    pub ui_preferences: Value,
}

impl SettingsRow {
    pub fn upsert_from(settings: &Settings, user_id: Uuid) -> Self {
        Self {
            id: user_id,
            theme: settings.theme.clone(),
            language: settings.language.clone(),
            notifications: settings.notifications,
            privacy: settings.privacy,
            ui_preferences: settings.ui_preferences.clone(),
        }
    }

    pub fn into_settings(self) -> Settings {
        Settings {
            theme: self.theme,
            language: self.language,
            notifications: self.notifications,
            privacy: self.privacy,
            ui_preferences: self.ui_preferences,
        }
    }
}

/// `resources` table row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub project_id: String,
    pub user_id: Uuid,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ResourceRow {
    pub fn insert_from(resource: &Resource, user_id: Uuid) -> Self {
        Self {
            id: None,
            project_id: resource.project_id.clone(),
            user_id,
            phase: resource.phase.clone(),
            resource_type: resource.resource_type.clone(),
            title: resource.title.clone(),
            description: resource.description.clone(),
            url: resource.url.clone(),
            content: resource.content.clone(),
            metadata: resource.metadata.clone(),
            tags: resource.tags.clone(),
            created_at: None,
        }
    }

    pub fn into_resource(self) -> Resource {
        Resource {
            id: self.id,
            project_id: self.project_id,
            phase: self.phase,
            resource_type: self.resource_type,
            title: self.title,
            description: self.description,
            url: self.url,
            content: self.content,
            metadata: self.metadata,
            tags: self.tags,
        }
    }
}

/// `activity_logs` insert shape. Append-only; never read back.
#[derive(Clone, Debug, Serialize)]
pub struct ActivityLogRow {
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub metadata: Value,
    pub user_agent: String,
}

impl ActivityLogRow {
    pub fn from_entry(entry: &ActivityLogEntry, user_id: Uuid, client_info: &str) -> Self {
        Self {
            user_id,
            action: entry.action.clone(),
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id.clone(),
            metadata: entry.metadata.clone(),
            user_agent: client_info.to_string(),
        }
    }
}

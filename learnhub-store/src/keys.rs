//! Namespaced key builders for the local store.
//!
//! Every LearnHub record lives under the `lh_` prefix so that
//! [`crate::LocalStore::clear_local_data`] can sweep the namespace without
//! touching unrelated keys the embedder may keep in the same store.

/// Namespace prefix shared by every local key.
pub const PREFIX: &str = "lh_";

/// Current signed-in public user record.
pub const CURRENT_USER: &str = "lh_user";
/// Full account list, passwords included.
pub const USERS: &str = "lh_users";
/// Combined badges/misc blob.
pub const DATA: &str = "lh_data";
pub const THEME: &str = "lh_theme";
pub const FONT_SIZE: &str = "lh_font_size";
pub const NOTIFICATIONS: &str = "lh_notifications";
pub const LANGUAGE: &str = "lh_language";
/// Set once local data has been migrated and explicitly cleared.
pub const MIGRATION_COMPLETED: &str = "lh_migration_completed";
pub const MIGRATION_DATE: &str = "lh_migration_date";

/// Per-user project list key, scoped by normalized email.
pub fn projects(email: &str) -> String {
    format!("lh_projects_{email}")
}

/// Per-project activity list key.
pub fn activities(project_id: &str) -> String {
    format!("lh_activities_{project_id}")
}

/// Per-project resource list key.
pub fn resources(project_id: &str) -> String {
    format!("lh_resources_{project_id}")
}

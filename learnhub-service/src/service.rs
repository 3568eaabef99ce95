//! The storage facade.

use crate::config::{BackendMode, StorageConfig};
use crate::error::{StorageError, StorageResult};
use chrono::Utc;
use learnhub_cloud::{RemoteClient, RemoteError, Session};
use learnhub_store::{KeyValueStore, LocalStore};
use learnhub_types::{
    Activity, ActivityLogEntry, Badge, Project, Resource, Role, Settings, User, level_for_xp,
    normalize_email,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Single entry point for all persistence. Every method branches on the
/// backend mode fixed at construction.
///
/// The local store is always present: in Remote mode it is the source
/// (and flag holder) for the one-shot migration.
pub struct StorageService {
    pub(crate) mode: BackendMode,
    pub(crate) local: LocalStore,
    pub(crate) remote: Option<RemoteClient>,
}

impl StorageService {
    /// Builds a facade from config and an injected key-value store.
    pub fn new(config: StorageConfig, kv: Arc<dyn KeyValueStore>) -> StorageResult<Self> {
        let remote = match config.mode {
            BackendMode::Remote => {
                let remote_config = config.remote.ok_or_else(|| {
                    StorageError::Misconfigured(
                        "remote mode requires connection parameters".to_string(),
                    )
                })?;
                Some(RemoteClient::new(remote_config))
            }
            BackendMode::Local => None,
        };
        Ok(Self {
            mode: config.mode,
            local: LocalStore::new(kv),
            remote,
        })
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    pub(crate) fn remote(&self) -> StorageResult<&RemoteClient> {
        self.remote.as_ref().ok_or_else(|| {
            StorageError::Misconfigured("no remote backend in local mode".to_string())
        })
    }

    /// Startup hook. In Remote mode a persisted access token, if given, is
    /// validated against the auth service so the session context reflects
    /// an existing session. Returns the current user either way.
    pub async fn init(&self, persisted_token: Option<&str>) -> StorageResult<Option<User>> {
        if let (BackendMode::Remote, Some(token)) = (self.mode, persisted_token) {
            if self.remote()?.restore_session(token).await?.is_none() {
                debug!("persisted token rejected, starting signed out");
            }
        }
        self.get_current_user().await
    }

    /// Auth-state change subscription (Remote mode only). The receiver
    /// always holds the latest session, `None` when signed out.
    pub fn subscribe_auth(&self) -> Option<watch::Receiver<Option<Session>>> {
        self.remote.as_ref().map(|c| c.session_context().subscribe())
    }

    // ── Auth ──

    pub async fn login(&self, email: &str, password: &str) -> StorageResult<User> {
        match self.mode {
            BackendMode::Local => Ok(self.local.login(email, password)?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let email = normalize_email(email);
                let session = client.sign_in(&email, password).await.map_err(|e| match e {
                    RemoteError::AuthFailed(_) => StorageError::InvalidCredential,
                    other => other.into(),
                })?;
                // A missing or unreadable profile row falls back to
                // defaults rather than failing the login.
                let profile = client.profile(&session).await.unwrap_or(None);
                Ok(profile.unwrap_or_else(|| User {
                    id: Some(session.user_id.to_string()),
                    email: session.email.clone(),
                    name: String::new(),
                    role: Role::default(),
                    xp_total: 0,
                    level: 1,
                }))
            }
        }
    }

    /// Creates an account and signs it in.
    ///
    /// In Remote mode this is a non-transactional two-step write: the
    /// backend identity is created first, then the linked profile row. If
    /// the profile insert fails the identity already exists and stays;
    /// the error is surfaced and no compensation is attempted.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> StorageResult<User> {
        match self.mode {
            BackendMode::Local => Ok(self.local.signup(name, email, password, role)?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let email = normalize_email(email);
                let session = client.sign_up(&email, password, name, role).await?;
                Ok(client.insert_profile(&session, name, role).await?)
            }
        }
    }

    pub async fn logout(&self) -> StorageResult<()> {
        match self.mode {
            BackendMode::Local => Ok(self.local.logout()?),
            BackendMode::Remote => {
                self.remote()?.sign_out().await?;
                Ok(())
            }
        }
    }

    pub async fn get_current_user(&self) -> StorageResult<Option<User>> {
        match self.mode {
            BackendMode::Local => Ok(self.local.current_user()?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let Some(session) = client.session_context().current().await else {
                    return Ok(None);
                };
                Ok(client.profile(&session).await.unwrap_or(None))
            }
        }
    }

    // ── Projects ──

    /// Inserts when no id is supplied, otherwise updates in place by id.
    /// A Remote update is owner-scoped: another owner's project is never
    /// written and the miss surfaces as [`StorageError::NotFound`].
    pub async fn save_project(&self, project: Project) -> StorageResult<Project> {
        match self.mode {
            BackendMode::Local => Ok(self.local.save_project(project)?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let session = client.session_context().require().await?;
                match project.id.clone() {
                    Some(id) => client
                        .update_project(&session, &id, &project)
                        .await?
                        .ok_or_else(|| StorageError::NotFound(format!("project {id}"))),
                    None => Ok(client.insert_project(&session, &project).await?),
                }
            }
        }
    }

    /// Remote results come back newest-update first; Local order is
    /// insertion order. Remote failures degrade to an empty list.
    pub async fn get_projects(&self) -> StorageResult<Vec<Project>> {
        match self.mode {
            BackendMode::Local => Ok(self.local.projects()?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let Some(session) = client.session_context().current().await else {
                    return Ok(Vec::new());
                };
                match client.projects(&session).await {
                    Ok(projects) => Ok(projects),
                    Err(e) => {
                        warn!("project list fetch failed: {e}");
                        Ok(Vec::new())
                    }
                }
            }
        }
    }

    /// Hard delete, owner-scoped in Remote mode. Deleting another owner's
    /// project removes nothing and is not an error.
    pub async fn delete_project(&self, project_id: &str) -> StorageResult<()> {
        match self.mode {
            BackendMode::Local => Ok(self.local.delete_project(project_id)?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let session = client.session_context().require().await?;
                Ok(client.delete_project(&session, project_id).await?)
            }
        }
    }

    // ── Activities ──

    /// Inserts or updates in place by id. The completion timestamp is
    /// restamped from the completed flag on every save.
    pub async fn save_activity(&self, mut activity: Activity) -> StorageResult<Activity> {
        activity.completed_at = if activity.completed {
            Some(Utc::now())
        } else {
            None
        };
        match self.mode {
            BackendMode::Local => Ok(self.local.save_activity(activity)?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let session = client.session_context().require().await?;
                match activity.id.clone() {
                    Some(id) => client
                        .update_activity(&session, &id, &activity)
                        .await?
                        .ok_or_else(|| StorageError::NotFound(format!("activity {id}"))),
                    None => Ok(client.insert_activity(&session, &activity).await?),
                }
            }
        }
    }

    /// Remote failures degrade to an empty list.
    pub async fn get_activities(&self, project_id: &str) -> StorageResult<Vec<Activity>> {
        match self.mode {
            BackendMode::Local => Ok(self.local.activities(project_id)?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let Some(session) = client.session_context().current().await else {
                    return Ok(Vec::new());
                };
                match client.activities(&session, project_id).await {
                    Ok(activities) => Ok(activities),
                    Err(e) => {
                        warn!("activity list fetch failed: {e}");
                        Ok(Vec::new())
                    }
                }
            }
        }
    }

    // ── Resources ──

    pub async fn save_resource(&self, resource: Resource) -> StorageResult<Resource> {
        match self.mode {
            BackendMode::Local => Ok(self.local.save_resource(resource)?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let session = client.session_context().require().await?;
                match resource.id.clone() {
                    Some(id) => client
                        .update_resource(&session, &id, &resource)
                        .await?
                        .ok_or_else(|| StorageError::NotFound(format!("resource {id}"))),
                    None => Ok(client.insert_resource(&session, &resource).await?),
                }
            }
        }
    }

    /// Remote failures degrade to an empty list.
    pub async fn get_resources(&self, project_id: &str) -> StorageResult<Vec<Resource>> {
        match self.mode {
            BackendMode::Local => Ok(self.local.resources(project_id)?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let Some(session) = client.session_context().current().await else {
                    return Ok(Vec::new());
                };
                match client.resources(&session, project_id).await {
                    Ok(resources) => Ok(resources),
                    Err(e) => {
                        warn!("resource list fetch failed: {e}");
                        Ok(Vec::new())
                    }
                }
            }
        }
    }

    // ── Badges & XP ──

    /// Awards a badge. A duplicate award of the same badge id is silently
    /// ignored, but the XP update below fires either way, including when
    /// the insert was suppressed as a duplicate. Re-awarding therefore
    /// inflates the XP total.
    pub async fn save_badge(&self, badge: Badge) -> StorageResult<Badge> {
        let xp = badge.xp;
        let stored = match self.mode {
            BackendMode::Local => self.local.save_badge(badge)?,
            BackendMode::Remote => {
                let client = self.remote()?;
                let session = client.session_context().require().await?;
                match client.insert_badge(&session, &badge).await {
                    Ok(stored) => stored,
                    Err(e) if e.is_conflict() => {
                        debug!(badge = %badge.id, "duplicate badge insert suppressed");
                        badge
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };
        self.update_user_xp(xp).await?;
        Ok(stored)
    }

    /// Remote failures degrade to an empty list.
    pub async fn get_badges(&self) -> StorageResult<Vec<Badge>> {
        match self.mode {
            BackendMode::Local => Ok(self.local.badges()?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let Some(session) = client.session_context().current().await else {
                    return Ok(Vec::new());
                };
                match client.badges(&session).await {
                    Ok(badges) => Ok(badges),
                    Err(e) => {
                        warn!("badge list fetch failed: {e}");
                        Ok(Vec::new())
                    }
                }
            }
        }
    }

    /// Adds XP to the current identity and recomputes the level. No-op
    /// when nobody is signed in.
    pub async fn update_user_xp(&self, delta: i64) -> StorageResult<()> {
        match self.mode {
            BackendMode::Local => Ok(self.local.add_xp(delta)?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let Some(session) = client.session_context().current().await else {
                    return Ok(());
                };
                let current = client
                    .profile(&session)
                    .await?
                    .map(|user| user.xp_total)
                    .unwrap_or(0);
                let total = current + delta;
                client
                    .set_profile_xp(&session, total, level_for_xp(total))
                    .await?;
                Ok(())
            }
        }
    }

    // ── Settings ──

    pub async fn save_settings(&self, settings: &Settings) -> StorageResult<()> {
        match self.mode {
            BackendMode::Local => Ok(self.local.save_settings(settings)?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let session = client.session_context().require().await?;
                Ok(client.upsert_settings(&session, settings).await?)
            }
        }
    }

    /// Never fails the caller: a missing row, missing keys, a missing
    /// session or a backend failure all come back as defaults.
    pub async fn get_settings(&self) -> StorageResult<Settings> {
        match self.mode {
            BackendMode::Local => Ok(self.local.settings()?),
            BackendMode::Remote => {
                let client = self.remote()?;
                let Some(session) = client.session_context().current().await else {
                    return Ok(Settings::default());
                };
                match client.settings(&session).await {
                    Ok(Some(settings)) => Ok(settings),
                    Ok(None) => Ok(Settings::default()),
                    Err(e) => {
                        warn!("settings fetch failed: {e}");
                        Ok(Settings::default())
                    }
                }
            }
        }
    }

    // ── Audit log ──

    /// Fire-and-forget audit insert. Remote-only: Local mode and a
    /// missing session are no-ops, and insert failures are logged and
    /// swallowed.
    pub async fn log_action(&self, entry: ActivityLogEntry) -> StorageResult<()> {
        let BackendMode::Remote = self.mode else {
            return Ok(());
        };
        let client = self.remote()?;
        let Some(session) = client.session_context().current().await else {
            return Ok(());
        };
        if let Err(e) = client.insert_log(&session, &entry).await {
            warn!(action = %entry.action, "audit log insert failed: {e}");
        }
        Ok(())
    }
}

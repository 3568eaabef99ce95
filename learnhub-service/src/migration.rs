//! One-shot migration of local records into the hosted backend.
//!
//! Best effort and non-transactional: items are copied one at a time, a
//! duplicate-key conflict skips that single item, and any other failure
//! aborts the remainder while keeping what already copied. Local data is
//! never deleted here; [`StorageService::clear_local_data`] is the
//! separate explicit step, and the only one that marks the migration
//! completed.

use crate::config::BackendMode;
use crate::error::StorageResult;
use crate::service::StorageService;
use learnhub_types::{NotificationPrefs, PrivacyPrefs, Settings};
use tracing::{info, warn};

/// Yes/no decision point put to the user before any data is copied.
pub trait MigrationPrompt: Send + Sync {
    /// Returns true to proceed with the migration.
    fn confirm(&self) -> bool;
}

/// Lets a plain closure act as the prompt.
impl<F: Fn() -> bool + Send + Sync> MigrationPrompt for F {
    fn confirm(&self) -> bool {
        self()
    }
}

/// Outcome of a migration attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Preconditions not met: not in Remote mode, or nobody is signed in.
    Unavailable,
    /// The local completed marker is already set.
    AlreadyCompleted,
    /// The user declined. Nothing was touched and the routine will ask
    /// again on the next qualifying call.
    Declined,
    Completed(MigrationReport),
}

/// Per-phase counts for a completed run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub projects_migrated: usize,
    /// Projects skipped as already-present remote duplicates.
    pub projects_skipped: usize,
    pub badges_migrated: usize,
    pub badges_skipped: usize,
    pub settings_migrated: bool,
}

impl StorageService {
    /// Copies local projects, badges and settings into the hosted
    /// backend, phase by phase, items strictly in sequence. See the
    /// module docs for the failure model.
    pub async fn migrate_local_to_remote(
        &self,
        prompt: &dyn MigrationPrompt,
    ) -> StorageResult<MigrationStatus> {
        if self.mode != BackendMode::Remote {
            info!("migration skipped: local backend");
            return Ok(MigrationStatus::Unavailable);
        }
        let client = self.remote()?;
        let Some(session) = client.session_context().current().await else {
            info!("migration skipped: no active session");
            return Ok(MigrationStatus::Unavailable);
        };
        if self.local.migration_completed()? {
            return Ok(MigrationStatus::AlreadyCompleted);
        }
        if !prompt.confirm() {
            info!("migration declined by the user");
            return Ok(MigrationStatus::Declined);
        }

        info!("starting local data migration");
        let mut report = MigrationReport::default();

        // Phase 1: projects of the stored local user.
        for project in self.local.projects()? {
            info!(project = %project.name, "migrating project");
            let mut copy = project.clone();
            copy.id = None;
            match client.insert_project(&session, &copy).await {
                Ok(_) => report.projects_migrated += 1,
                Err(e) if e.is_conflict() => {
                    warn!(project = %project.name, "already present remotely, skipping");
                    report.projects_skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Phase 2: badges, earned timestamps preserved.
        for badge in self.local.badges()? {
            info!(badge = %badge.title, "migrating badge");
            match client.insert_badge(&session, &badge).await {
                Ok(_) => report.badges_migrated += 1,
                Err(e) if e.is_conflict() => {
                    warn!(badge = %badge.title, "already present remotely, skipping");
                    report.badges_skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Phase 3: one combined settings record, if any local key exists.
        let raw = self.local.raw_settings()?;
        if !raw.is_empty() {
            info!("migrating settings");
            let settings = Settings {
                theme: raw.theme.unwrap_or_else(|| "dark".to_string()),
                language: raw.language.unwrap_or_else(|| "pt-BR".to_string()),
                notifications: NotificationPrefs {
                    email: raw.notifications.as_deref() == Some("true"),
                    ..NotificationPrefs::default()
                },
                privacy: PrivacyPrefs::default(),
                ui_preferences: serde_json::json!({
                    "fontSize": raw.font_size.unwrap_or_else(|| "medium".to_string()),
                }),
            };
            client.upsert_settings(&session, &settings).await?;
            report.settings_migrated = true;
        }

        info!(?report, "migration finished");
        Ok(MigrationStatus::Completed(report))
    }

    /// Removes every namespaced local key except the migration marker and
    /// date, then sets both. Never invoked automatically; this is the
    /// only path that marks the migration completed.
    pub fn clear_local_data(&self) -> StorageResult<()> {
        Ok(self.local.clear_local_data()?)
    }
}

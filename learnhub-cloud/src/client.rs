//! HTTP client for the hosted auth + table service.
//!
//! Follows the service's REST conventions: every request carries the
//! public `apikey` header, authenticated requests add a bearer token,
//! table reads filter by column (`?user_id=eq.<uuid>`) and writes ask for
//! the stored representation back. A unique-violation insert comes back
//! as HTTP 409 and is mapped to [`RemoteError::Conflict`] so callers can
//! decide whether to suppress it.

use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::rows::{
    ActivityLogRow, ActivityRow, BadgeRow, ProfileRow, ProjectRow, ResourceRow, SettingsRow,
};
use crate::session::{Session, SessionContext};
use learnhub_types::{Activity, ActivityLogEntry, Badge, Project, Resource, Role, Settings, User};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Auth user shape shared by the signup, token and user endpoints.
#[derive(serde::Deserialize)]
struct AuthUser {
    id: Uuid,
    email: String,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

/// HTTP client for the hosted backend.
pub struct RemoteClient {
    http: Client,
    config: RemoteConfig,
    session: Arc<SessionContext>,
}

impl RemoteClient {
    pub fn new(config: RemoteConfig) -> Self {
        Self::with_session(config, Arc::new(SessionContext::new()))
    }

    /// Builds a client sharing an existing session context.
    pub fn with_session(config: RemoteConfig, session: Arc<SessionContext>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            config,
            session,
        }
    }

    pub fn session_context(&self) -> &Arc<SessionContext> {
        &self.session
    }

    // ── Auth ──

    /// Creates a backend identity and signs it in. The linked profile row
    /// is a separate insert; the two steps are not atomic.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> RemoteResult<Session> {
        let url = format!("{}/auth/v1/signup", self.config.base_url);
        let resp = self
            .http
            .post(&url)
            .header("apikey", &self.config.api_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "name": name, "role": role },
            }))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(RemoteError::Conflict(Self::error_message(resp).await));
        }
        if !status.is_success() {
            return Err(RemoteError::AuthFailed(Self::error_message(resp).await));
        }

        let token: TokenResponse = resp.json().await?;
        let session = Session {
            access_token: token.access_token,
            user_id: token.user.id,
            email: token.user.email,
        };
        self.session.set(session.clone()).await;
        Ok(session)
    }

    /// Exchanges email/password credentials for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> RemoteResult<Session> {
        let url = format!(
            "{}/auth/v1/token?grant_type=password",
            self.config.base_url
        );
        let resp = self
            .http
            .post(&url)
            .header("apikey", &self.config.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(RemoteError::AuthFailed(Self::error_message(resp).await));
        }

        let token: TokenResponse = resp.json().await?;
        let session = Session {
            access_token: token.access_token,
            user_id: token.user.id,
            email: token.user.email,
        };
        self.session.set(session.clone()).await;
        Ok(session)
    }

    /// Signs out. The backend call is best effort; the local session is
    /// cleared regardless.
    pub async fn sign_out(&self) -> RemoteResult<()> {
        if let Some(session) = self.session.current().await {
            let url = format!("{}/auth/v1/logout", self.config.base_url);
            let result = self
                .http
                .post(&url)
                .header("apikey", &self.config.api_key)
                .bearer_auth(&session.access_token)
                .send()
                .await;
            if let Err(e) = result {
                warn!("remote sign-out failed: {e}");
            }
        }
        self.session.clear().await;
        Ok(())
    }

    /// Validates a persisted access token against the auth service and, on
    /// success, installs the session. Used at startup to pick up an
    /// existing session.
    pub async fn restore_session(&self, access_token: &str) -> RemoteResult<Option<Session>> {
        let url = format!("{}/auth/v1/user", self.config.base_url);
        let resp = self
            .http
            .get(&url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!("persisted token rejected by the auth service");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RemoteError::AuthFailed(Self::error_message(resp).await));
        }

        let user: AuthUser = resp.json().await?;
        let session = Session {
            access_token: access_token.to_string(),
            user_id: user.id,
            email: user.email,
        };
        self.session.set(session.clone()).await;
        Ok(Some(session))
    }

    // ── Profiles ──

    /// Inserts the profile row linked to a newly created identity.
    pub async fn insert_profile(
        &self,
        session: &Session,
        name: &str,
        role: Role,
    ) -> RemoteResult<User> {
        let row: ProfileRow = self
            .insert_returning(
                session,
                "profiles",
                &serde_json::json!({
                    "id": session.user_id,
                    "email": session.email,
                    "name": name,
                    "role": role,
                }),
            )
            .await?;
        Ok(row.into())
    }

    /// Fetches the session user's profile row; `None` when absent.
    pub async fn profile(&self, session: &Session) -> RemoteResult<Option<User>> {
        let rows: Vec<ProfileRow> = self
            .select(
                session,
                "profiles",
                &[("id", session.user_id.to_string())],
                None,
            )
            .await?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    /// Writes the XP counters back to the profile row.
    pub async fn set_profile_xp(
        &self,
        session: &Session,
        xp_total: i64,
        level: i64,
    ) -> RemoteResult<()> {
        let _rows: Vec<Value> = self
            .update_returning(
                session,
                "profiles",
                &[("id", session.user_id.to_string())],
                &serde_json::json!({ "xp_total": xp_total, "level": level }),
            )
            .await?;
        Ok(())
    }

    // ── Projects ──

    pub async fn insert_project(
        &self,
        session: &Session,
        project: &Project,
    ) -> RemoteResult<Project> {
        let row: ProjectRow = self
            .insert_returning(
                session,
                "projects",
                &ProjectRow::insert_from(project, session.user_id),
            )
            .await?;
        Ok(row.into_project())
    }

    /// Owner-scoped in-place update; `None` when the id/owner filter
    /// matched no row (another owner's project is never touched).
    pub async fn update_project(
        &self,
        session: &Session,
        id: &str,
        project: &Project,
    ) -> RemoteResult<Option<Project>> {
        let rows: Vec<ProjectRow> = self
            .update_returning(
                session,
                "projects",
                &[
                    ("id", id.to_string()),
                    ("user_id", session.user_id.to_string()),
                ],
                &serde_json::json!({
                    "name": project.name,
                    "description": project.description,
                    "status": project.status,
                    "phase_data": project.phase_data,
                    "tags": project.tags,
                    "progress_percentage": project.progress,
                }),
            )
            .await?;
        Ok(rows.into_iter().next().map(ProjectRow::into_project))
    }

    /// Projects of the session user, newest update first.
    pub async fn projects(&self, session: &Session) -> RemoteResult<Vec<Project>> {
        let rows: Vec<ProjectRow> = self
            .select(
                session,
                "projects",
                &[("user_id", session.user_id.to_string())],
                Some("updated_at.desc"),
            )
            .await?;
        Ok(rows.into_iter().map(ProjectRow::into_project).collect())
    }

    /// Owner-scoped hard delete. Deleting a row that is not yours removes
    /// nothing and is not an error.
    pub async fn delete_project(&self, session: &Session, id: &str) -> RemoteResult<()> {
        self.delete_rows(
            session,
            "projects",
            &[
                ("id", id.to_string()),
                ("user_id", session.user_id.to_string()),
            ],
        )
        .await
    }

    // ── Activities ──

    pub async fn insert_activity(
        &self,
        session: &Session,
        activity: &Activity,
    ) -> RemoteResult<Activity> {
        let row: ActivityRow = self
            .insert_returning(
                session,
                "activities",
                &ActivityRow::insert_from(activity, session.user_id),
            )
            .await?;
        Ok(row.into_activity())
    }

    /// Owner-scoped in-place update; `None` when the filter matched no
    /// row.
    pub async fn update_activity(
        &self,
        session: &Session,
        id: &str,
        activity: &Activity,
    ) -> RemoteResult<Option<Activity>> {
        let rows: Vec<ActivityRow> = self
            .update_returning(
                session,
                "activities",
                &[
                    ("id", id.to_string()),
                    ("user_id", session.user_id.to_string()),
                ],
                &serde_json::json!({
                    "phase": activity.phase,
                    "category": activity.category,
                    "activity_id": activity.activity_ref,
                    "title": activity.title,
                    "detail": activity.detail,
                    "completed": activity.completed,
                    "completed_at": activity.completed_at,
                    "notes": activity.notes,
                    "attachments": activity.attachments,
                }),
            )
            .await?;
        Ok(rows.into_iter().next().map(ActivityRow::into_activity))
    }

    /// Activities of a project, newest first.
    pub async fn activities(
        &self,
        session: &Session,
        project_id: &str,
    ) -> RemoteResult<Vec<Activity>> {
        let rows: Vec<ActivityRow> = self
            .select(
                session,
                "activities",
                &[("project_id", project_id.to_string())],
                Some("created_at.desc"),
            )
            .await?;
        Ok(rows.into_iter().map(ActivityRow::into_activity).collect())
    }

    // ── Badges ──

    /// Inserts a badge row. A duplicate natural key for the same owner
    /// comes back as [`RemoteError::Conflict`]; suppressing it is the
    /// caller's decision.
    pub async fn insert_badge(&self, session: &Session, badge: &Badge) -> RemoteResult<Badge> {
        let row: BadgeRow = self
            .insert_returning(
                session,
                "badges",
                &BadgeRow::insert_from(badge, session.user_id),
            )
            .await?;
        Ok(row.into_badge())
    }

    /// Badges of the session user, most recently earned first.
    pub async fn badges(&self, session: &Session) -> RemoteResult<Vec<Badge>> {
        let rows: Vec<BadgeRow> = self
            .select(
                session,
                "badges",
                &[("user_id", session.user_id.to_string())],
                Some("earned_at.desc"),
            )
            .await?;
        Ok(rows.into_iter().map(BadgeRow::into_badge).collect())
    }

    // ── Settings ──

    /// Upserts the one settings row keyed by the session user.
    pub async fn upsert_settings(
        &self,
        session: &Session,
        settings: &Settings,
    ) -> RemoteResult<()> {
        let resp = self
            .http
            .post(self.rest_url("user_settings"))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&session.access_token)
            .header(
                "Prefer",
                "resolution=merge-duplicates,return=representation",
            )
            .json(&SettingsRow::upsert_from(settings, session.user_id))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// The session user's settings row; `None` when absent.
    pub async fn settings(&self, session: &Session) -> RemoteResult<Option<Settings>> {
        let rows: Vec<SettingsRow> = self
            .select(
                session,
                "user_settings",
                &[("id", session.user_id.to_string())],
                None,
            )
            .await?;
        Ok(rows.into_iter().next().map(SettingsRow::into_settings))
    }

    // ── Resources ──

    pub async fn insert_resource(
        &self,
        session: &Session,
        resource: &Resource,
    ) -> RemoteResult<Resource> {
        let row: ResourceRow = self
            .insert_returning(
                session,
                "resources",
                &ResourceRow::insert_from(resource, session.user_id),
            )
            .await?;
        Ok(row.into_resource())
    }

    /// Owner-scoped in-place update; `None` when the filter matched no
    /// row.
    pub async fn update_resource(
        &self,
        session: &Session,
        id: &str,
        resource: &Resource,
    ) -> RemoteResult<Option<Resource>> {
        let rows: Vec<ResourceRow> = self
            .update_returning(
                session,
                "resources",
                &[
                    ("id", id.to_string()),
                    ("user_id", session.user_id.to_string()),
                ],
                &serde_json::json!({
                    "phase": resource.phase,
                    "type": resource.resource_type,
                    "title": resource.title,
                    "description": resource.description,
                    "url": resource.url,
                    "content": resource.content,
                    "metadata": resource.metadata,
                    "tags": resource.tags,
                }),
            )
            .await?;
        Ok(rows.into_iter().next().map(ResourceRow::into_resource))
    }

    /// Resources of a project, newest first.
    pub async fn resources(
        &self,
        session: &Session,
        project_id: &str,
    ) -> RemoteResult<Vec<Resource>> {
        let rows: Vec<ResourceRow> = self
            .select(
                session,
                "resources",
                &[("project_id", project_id.to_string())],
                Some("created_at.desc"),
            )
            .await?;
        Ok(rows.into_iter().map(ResourceRow::into_resource).collect())
    }

    // ── Audit log ──

    /// Appends one audit record. The facade treats this as fire and
    /// forget.
    pub async fn insert_log(
        &self,
        session: &Session,
        entry: &ActivityLogEntry,
    ) -> RemoteResult<()> {
        let resp = self
            .http
            .post(self.rest_url("activity_logs"))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&session.access_token)
            .json(&ActivityLogRow::from_entry(
                entry,
                session.user_id,
                &self.config.client_info,
            ))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    // ── Request plumbing ──

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, table)
    }

    async fn insert_returning<T: DeserializeOwned>(
        &self,
        session: &Session,
        table: &str,
        body: &impl Serialize,
    ) -> RemoteResult<T> {
        let resp = self
            .http
            .post(self.rest_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&session.access_token)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let rows: Vec<T> = Self::check(resp).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::Api(format!("{table} insert returned no rows")))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        session: &Session,
        table: &str,
        filters: &[(&str, String)],
        order: Option<&str>,
    ) -> RemoteResult<Vec<T>> {
        let mut req = self
            .http
            .get(self.rest_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&session.access_token)
            .query(&[("select", "*")]);
        for (column, value) in filters {
            req = req.query(&[(*column, format!("eq.{value}"))]);
        }
        if let Some(order) = order {
            req = req.query(&[("order", order)]);
        }
        let resp = req.send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn update_returning<T: DeserializeOwned>(
        &self,
        session: &Session,
        table: &str,
        filters: &[(&str, String)],
        body: &impl Serialize,
    ) -> RemoteResult<Vec<T>> {
        let mut req = self
            .http
            .patch(self.rest_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&session.access_token)
            .header("Prefer", "return=representation")
            .json(body);
        for (column, value) in filters {
            req = req.query(&[(*column, format!("eq.{value}"))]);
        }
        let resp = req.send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn delete_rows(
        &self,
        session: &Session,
        table: &str,
        filters: &[(&str, String)],
    ) -> RemoteResult<()> {
        let mut req = self
            .http
            .delete(self.rest_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&session.access_token);
        for (column, value) in filters {
            req = req.query(&[(*column, format!("eq.{value}"))]);
        }
        let resp = req.send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Maps a table response status: 409 becomes [`RemoteError::Conflict`],
    /// any other failure becomes [`RemoteError::Api`] with the backend's
    /// message.
    async fn check(resp: reqwest::Response) -> RemoteResult<reqwest::Response> {
        let status = resp.status();
        if status == StatusCode::CONFLICT {
            return Err(RemoteError::Conflict(Self::error_message(resp).await));
        }
        if !status.is_success() {
            return Err(RemoteError::Api(Self::error_message(resp).await));
        }
        Ok(resp)
    }

    /// Pulls the human-readable message out of an error body, falling back
    /// to the status line.
    async fn error_message(resp: reqwest::Response) -> String {
        let status = resp.status();
        match resp.json::<Value>().await {
            Ok(body) => body
                .get("message")
                .or_else(|| body.get("error_description"))
                .or_else(|| body.get("msg"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string()),
            Err(_) => status.to_string(),
        }
    }
}

use learnhub_cloud::client::RemoteClient;
use learnhub_cloud::config::RemoteConfig;
use learnhub_cloud::error::RemoteError;
use learnhub_cloud::session::Session;
use learnhub_types::{Badge, Project, Role};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: &str = "5f8f0a77-6f5c-4b7a-9c39-2d5d41f6a111";

fn setup(server: &MockServer) -> RemoteClient {
    let mut config = RemoteConfig::new(server.uri(), "anon-key");
    config.timeout_secs = 5;
    RemoteClient::new(config)
}

async fn signed_in(server: &MockServer) -> RemoteClient {
    let client = setup(server);
    client
        .session_context()
        .set(Session {
            access_token: "at".to_string(),
            user_id: Uuid::parse_str(USER_ID).unwrap(),
            email: "ana@example.com".to_string(),
        })
        .await;
    client
}

fn token_response() -> serde_json::Value {
    serde_json::json!({
        "access_token": "at-new",
        "token_type": "bearer",
        "user": { "id": USER_ID, "email": "ana@example.com" }
    })
}

fn project_row() -> serde_json::Value {
    serde_json::json!({
        "id": "7c9a1f00-0000-4000-8000-000000000001",
        "user_id": USER_ID,
        "name": "X",
        "description": "",
        "status": "active",
        "phase_data": null,
        "tags": [],
        "progress_percentage": 0,
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-02T00:00:00Z"
    })
}

// --- Auth ---

#[tokio::test]
async fn sign_in_installs_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response()))
        .mount(&server)
        .await;

    let client = setup(&server);
    let session = client.sign_in("ana@example.com", "s3cret").await.unwrap();
    assert_eq!(session.email, "ana@example.com");
    assert_eq!(session.user_id.to_string(), USER_ID);
    assert!(client.session_context().current().await.is_some());
}

#[tokio::test]
async fn sign_in_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error_description": "Invalid login credentials"})),
        )
        .mount(&server)
        .await;

    let client = setup(&server);
    let err = client.sign_in("ana@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, RemoteError::AuthFailed(_)));
    assert!(err.to_string().contains("Invalid login credentials"));
    assert!(client.session_context().current().await.is_none());
}

#[tokio::test]
async fn sign_up_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response()))
        .mount(&server)
        .await;

    let client = setup(&server);
    let session = client
        .sign_up("ana@example.com", "s3cret", "Ana", Role::Aluno)
        .await
        .unwrap();
    assert_eq!(session.user_id.to_string(), USER_ID);
    assert!(client.session_context().current().await.is_some());
}

#[tokio::test]
async fn sign_up_existing_email_is_a_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({"msg": "User already registered"})),
        )
        .mount(&server)
        .await;

    let client = setup(&server);
    let err = client
        .sign_up("ana@example.com", "s3cret", "Ana", Role::Aluno)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn restore_session_accepts_a_live_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": USER_ID,
            "email": "ana@example.com"
        })))
        .mount(&server)
        .await;

    let client = setup(&server);
    let session = client.restore_session("saved-token").await.unwrap().unwrap();
    assert_eq!(session.access_token, "saved-token");
    assert!(client.session_context().current().await.is_some());
}

#[tokio::test]
async fn restore_session_rejects_a_stale_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = setup(&server);
    assert!(client.restore_session("stale").await.unwrap().is_none());
    assert!(client.session_context().current().await.is_none());
}

#[tokio::test]
async fn sign_out_clears_the_session_even_when_the_call_fails() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;
    // No logout mock mounted: the request 404s, the session still goes.
    client.sign_out().await.unwrap();
    assert!(client.session_context().current().await.is_none());
}

// --- Profiles ---

#[tokio::test]
async fn profile_maps_the_row_to_a_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{USER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": USER_ID,
            "email": "ana@example.com",
            "name": "Ana",
            "role": "Aluno",
            "xp_total": 150,
            "level": 2
        }])))
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let session = client.session_context().require().await.unwrap();
    let user = client.profile(&session).await.unwrap().unwrap();
    assert_eq!(user.name, "Ana");
    assert_eq!(user.xp_total, 150);
    assert_eq!(user.id.as_deref(), Some(USER_ID));
}

#[tokio::test]
async fn missing_profile_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let session = client.session_context().require().await.unwrap();
    assert!(client.profile(&session).await.unwrap().is_none());
}

// --- Projects ---

#[tokio::test]
async fn insert_project_returns_the_stored_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/projects"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([project_row()])))
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let session = client.session_context().require().await.unwrap();
    let saved = client
        .insert_project(&session, &Project::draft("X"))
        .await
        .unwrap();
    assert_eq!(saved.id.as_deref(), Some("7c9a1f00-0000-4000-8000-000000000001"));
    assert!(saved.updated_at.is_some());
}

#[tokio::test]
async fn projects_are_ordered_by_latest_update() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/projects"))
        .and(query_param("user_id", format!("eq.{USER_ID}")))
        .and(query_param("order", "updated_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([project_row()])))
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let session = client.session_context().require().await.unwrap();
    let projects = client.projects(&session).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "X");
}

#[tokio::test]
async fn update_project_for_another_owner_matches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/projects"))
        .and(query_param("id", "eq.other-project"))
        .and(query_param("user_id", format!("eq.{USER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let session = client.session_context().require().await.unwrap();
    let updated = client
        .update_project(&session, "other-project", &Project::draft("X"))
        .await
        .unwrap();
    assert!(updated.is_none());
}

#[tokio::test]
async fn delete_project_is_owner_scoped() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/projects"))
        .and(query_param("id", "eq.p-1"))
        .and(query_param("user_id", format!("eq.{USER_ID}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let session = client.session_context().require().await.unwrap();
    client.delete_project(&session, "p-1").await.unwrap();
}

// --- Badges ---

#[tokio::test]
async fn duplicate_badge_insert_is_a_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/badges"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"badges_user_id_badge_id_key\""
        })))
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let session = client.session_context().require().await.unwrap();
    let badge = Badge {
        id: "first-project".to_string(),
        title: "First Project".to_string(),
        description: String::new(),
        icon: String::new(),
        xp: 10,
        category: "special".to_string(),
        earned_at: None,
        metadata: serde_json::Value::Null,
    };
    let err = client.insert_badge(&session, &badge).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(err.to_string().contains("duplicate key"));
}

// --- Settings ---

#[tokio::test]
async fn missing_settings_row_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let session = client.session_context().require().await.unwrap();
    assert!(client.settings(&session).await.unwrap().is_none());
}

// --- Audit log ---

#[tokio::test]
async fn insert_log_posts_one_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/activity_logs"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let session = client.session_context().require().await.unwrap();
    let entry = learnhub_types::ActivityLogEntry::new("project_created", "project");
    client.insert_log(&session, &entry).await.unwrap();
}

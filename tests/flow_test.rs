use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::Mutex};

use sporlme::{
    api::AppState,
    config::Config,
    error::AuthError,
    flow::{AuthFlow, FlowOutcome, RequestContext},
    management::{KeyValueStore, MemoryStore, VERIFIER_KEY},
    server,
    types::Profile,
    utils,
};

// Mock of the accounts service and Web API that records what it receives.
#[derive(Clone)]
struct MockProvider {
    token_status: StatusCode,
    token_body: Value,
    access_token: String,
    profile_status: StatusCode,
    profile_body: Value,
    top_status: StatusCode,
    token_forms: Arc<Mutex<Vec<HashMap<String, String>>>>,
    resource_auth: Arc<Mutex<Vec<String>>>,
    top_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl MockProvider {
    fn new() -> Self {
        Self {
            token_status: StatusCode::OK,
            token_body: json!({ "access_token": "T" }),
            access_token: "T".to_string(),
            profile_status: StatusCode::OK,
            profile_body: json!({ "id": "u1", "display_name": "Jane" }),
            top_status: StatusCode::OK,
            token_forms: Arc::new(Mutex::new(Vec::new())),
            resource_auth: Arc::new(Mutex::new(Vec::new())),
            top_queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    async fn token_calls(&self) -> usize {
        self.token_forms.lock().await.len()
    }

    async fn resource_calls(&self) -> usize {
        self.resource_auth.lock().await.len()
    }

    async fn start(&self) -> SocketAddr {
        let app = Router::new()
            .route("/api/token", post(token))
            .route("/v1/me", get(me))
            .route("/v1/me/top/tracks", get(top_tracks))
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }
}

async fn token(
    State(mock): State<MockProvider>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    mock.token_forms.lock().await.push(form);
    (mock.token_status, Json(mock.token_body.clone()))
}

async fn authorized(mock: &MockProvider, headers: &HeaderMap) -> bool {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let ok = auth == format!("Bearer {}", mock.access_token);
    mock.resource_auth.lock().await.push(auth);
    ok
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": { "status": 401, "message": "Invalid access token" } })),
    )
}

async fn me(State(mock): State<MockProvider>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&mock, &headers).await {
        return unauthorized();
    }
    (mock.profile_status, Json(mock.profile_body.clone()))
}

async fn top_tracks(
    State(mock): State<MockProvider>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&mock, &headers).await {
        return unauthorized();
    }
    mock.top_queries.lock().await.push(query);
    if mock.top_status != StatusCode::OK {
        return (
            mock.top_status,
            Json(json!({ "error": { "status": mock.top_status.as_u16(), "message": "Insufficient client scope" } })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "items": [
                { "id": "t1", "name": "First", "artists": [{ "name": "A" }], "album": { "name": "LP" } },
                { "id": "t2", "name": "Second", "artists": [{ "name": "B" }, { "name": "C" }] }
            ],
            "total": 2
        })),
    )
}

fn config_for(addr: SocketAddr) -> Config {
    Config::new("abc123", "http://localhost:8081/callback")
        .unwrap()
        .with_provider_base(&format!("http://{addr}"))
        .unwrap()
}

fn callback(params: &[(&str, &str)]) -> RequestContext {
    RequestContext::new(
        params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

#[tokio::test]
async fn test_no_code_redirects_once_and_stores_verifier() {
    let mock = MockProvider::new();
    let addr = mock.start().await;
    let store = Arc::new(MemoryStore::new());
    let flow = AuthFlow::new(config_for(addr), store.clone());

    let outcome = flow.handle(&RequestContext::empty()).await.unwrap();

    let url = match outcome {
        FlowOutcome::Redirect(url) => url,
        other => panic!("expected redirect, got {:?}", other),
    };
    assert_eq!(url.path(), "/authorize");

    let verifier = store.get(VERIFIER_KEY).await.unwrap().unwrap();
    assert!((43..=128).contains(&verifier.len()));
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));

    // the transmitted challenge is derived from the stored verifier
    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(query["code_challenge"], utils::generate_code_challenge(&verifier));
    assert_eq!(query["code_challenge_method"], "S256");

    assert_eq!(mock.token_calls().await, 0);
    assert_eq!(mock.resource_calls().await, 0);
}

#[tokio::test]
async fn test_code_is_exchanged_and_profile_fetched() {
    let mock = MockProvider::new();
    let addr = mock.start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(VERIFIER_KEY, "V").await.unwrap();
    let flow = AuthFlow::new(config_for(addr), store.clone());

    let outcome = flow.handle(&callback(&[("code", "XYZ")])).await.unwrap();

    let session = match outcome {
        FlowOutcome::SignedIn(session) => session,
        other => panic!("expected signed in, got {:?}", other),
    };
    let expected: Profile =
        serde_json::from_value(json!({ "id": "u1", "display_name": "Jane" })).unwrap();
    assert_eq!(session.profile, expected);
    assert_eq!(session.top_tracks, None);
    assert_eq!(session.top_tracks_error, None);

    let forms = mock.token_forms.lock().await;
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["code_verifier"], "V");
    assert_eq!(forms[0]["code"], "XYZ");
    assert_eq!(forms[0]["grant_type"], "authorization_code");
    assert_eq!(forms[0]["client_id"], "abc123");
    assert_eq!(forms[0]["redirect_uri"], "http://localhost:8081/callback");

    assert_eq!(*mock.resource_auth.lock().await, vec!["Bearer T".to_string()]);

    // the verifier is single use
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_rejected_exchange_is_reported_without_fetch() {
    let mut mock = MockProvider::new();
    mock.token_status = StatusCode::BAD_REQUEST;
    mock.token_body = json!({ "error": "invalid_grant", "error_description": "Invalid authorization code" });
    let addr = mock.start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(VERIFIER_KEY, "V").await.unwrap();
    let flow = AuthFlow::new(config_for(addr), store.clone());

    let err = flow.handle(&callback(&[("code", "C")])).await.unwrap_err();

    match &err {
        AuthError::Exchange(msg) => {
            assert!(msg.contains("400"));
            assert!(msg.contains("invalid_grant"));
        }
        other => panic!("expected exchange failure, got {:?}", other),
    }
    assert_eq!(err.category(), "Sign-in failed");
    assert_eq!(mock.token_forms.lock().await[0]["code_verifier"], "V");
    assert_eq!(mock.resource_calls().await, 0);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_token_body_without_access_token_is_an_exchange_failure() {
    let mut mock = MockProvider::new();
    mock.token_body = json!({ "token_type": "Bearer" });
    let addr = mock.start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(VERIFIER_KEY, "V").await.unwrap();
    let flow = AuthFlow::new(config_for(addr), store);

    let err = flow.handle(&callback(&[("code", "C")])).await.unwrap_err();

    assert!(matches!(err, AuthError::Exchange(_)));
    assert_eq!(mock.resource_calls().await, 0);
}

#[tokio::test]
async fn test_denied_authorization_is_not_treated_as_missing_code() {
    let mock = MockProvider::new();
    let addr = mock.start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(VERIFIER_KEY, "V").await.unwrap();
    let flow = AuthFlow::new(config_for(addr), store.clone());

    let err = flow
        .handle(&callback(&[("error", "access_denied")]))
        .await
        .unwrap_err();

    match err {
        AuthError::Denied { error, description } => {
            assert_eq!(error, "access_denied");
            assert_eq!(description, None);
        }
        other => panic!("expected denial, got {:?}", other),
    }
    assert!(store.is_empty().await);
    assert_eq!(mock.token_calls().await, 0);
    assert_eq!(mock.resource_calls().await, 0);
}

#[tokio::test]
async fn test_callback_without_stored_verifier_fails() {
    let mock = MockProvider::new();
    let addr = mock.start().await;
    let flow = AuthFlow::new(config_for(addr), MemoryStore::shared());

    let err = flow.handle(&callback(&[("code", "XYZ")])).await.unwrap_err();

    assert!(matches!(err, AuthError::MissingVerifier));
    assert_eq!(mock.token_calls().await, 0);
}

#[tokio::test]
async fn test_invalid_token_is_a_resource_failure() {
    let mut mock = MockProvider::new();
    mock.token_body = json!({ "access_token": "stale" });
    let addr = mock.start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(VERIFIER_KEY, "V").await.unwrap();
    let flow = AuthFlow::new(config_for(addr), store);

    let err = flow.handle(&callback(&[("code", "XYZ")])).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.category(), "Could not load profile");
    assert_eq!(*mock.resource_auth.lock().await, vec!["Bearer stale".to_string()]);
}

#[tokio::test]
async fn test_top_tracks_are_fetched_when_requested() {
    let mock = MockProvider::new();
    let addr = mock.start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(VERIFIER_KEY, "V").await.unwrap();
    let flow = AuthFlow::new(config_for(addr), store).with_top_tracks(Some(5));

    let outcome = flow.handle(&callback(&[("code", "XYZ")])).await.unwrap();

    let FlowOutcome::SignedIn(session) = outcome else {
        panic!("expected signed in");
    };
    let top = session.top_tracks.unwrap();
    assert_eq!(top.items.len(), 2);
    assert_eq!(top.items[1].artist_names(), "B, C");
    assert_eq!(session.top_tracks_error, None);
    assert_eq!(mock.top_queries.lock().await[0]["limit"], "5");
    assert_eq!(mock.resource_calls().await, 2);
}

#[tokio::test]
async fn test_failed_top_tracks_keep_the_profile() {
    let mut mock = MockProvider::new();
    mock.top_status = StatusCode::FORBIDDEN;
    let addr = mock.start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(VERIFIER_KEY, "V").await.unwrap();
    let flow = AuthFlow::new(config_for(addr), store).with_top_tracks(Some(5));

    let outcome = flow.handle(&callback(&[("code", "XYZ")])).await.unwrap();

    let FlowOutcome::SignedIn(session) = outcome else {
        panic!("expected signed in");
    };
    assert_eq!(session.profile.id, "u1");
    assert_eq!(session.top_tracks, None);
    let err = session.top_tracks_error.unwrap();
    assert!(err.contains("403"), "{err}");
    assert!(err.contains("Insufficient client scope"), "{err}");
}

#[tokio::test]
async fn test_non_bearer_token_is_an_exchange_failure() {
    let mut mock = MockProvider::new();
    mock.token_body = json!({ "access_token": "T", "token_type": "mac" });
    let addr = mock.start().await;
    let store = Arc::new(MemoryStore::new());
    store.set(VERIFIER_KEY, "V").await.unwrap();
    let flow = AuthFlow::new(config_for(addr), store);

    let err = flow.handle(&callback(&[("code", "C")])).await.unwrap_err();

    match err {
        AuthError::Exchange(msg) => assert!(msg.contains("unsupported token type mac"), "{msg}"),
        other => panic!("expected exchange failure, got {:?}", other),
    }
    assert_eq!(mock.resource_calls().await, 0);
}

#[tokio::test]
async fn test_unreachable_token_endpoint_is_an_exchange_failure() {
    // reserve a port, then close it so nothing is listening there
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let store = Arc::new(MemoryStore::new());
    store.set(VERIFIER_KEY, "V").await.unwrap();
    let flow = AuthFlow::new(config_for(dead), store.clone());

    let err = flow.handle(&callback(&[("code", "C")])).await.unwrap_err();

    match &err {
        AuthError::Exchange(msg) => assert!(msg.contains("token request failed"), "{msg}"),
        other => panic!("expected exchange failure, got {:?}", other),
    }
    assert_eq!(err.category(), "Sign-in failed");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_callback_server_redirects_then_renders_profile() {
    let mock = MockProvider::new();
    let provider = mock.start().await;
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(AuthFlow::new(config_for(provider), store.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let local = listener.local_addr().unwrap();
    let server_state = state.clone();
    tokio::spawn(async move {
        server::serve(listener, server_state).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    // first visit: no code, browser is sent to the provider
    let res = client
        .get(format!("http://{local}/callback"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::SEE_OTHER);
    let location = res.headers()[reqwest::header::LOCATION].to_str().unwrap();
    assert!(location.starts_with(&format!("http://{provider}/authorize?")));
    assert!(store.get(VERIFIER_KEY).await.unwrap().is_some());
    assert!(state.result.lock().await.is_none());

    // provider calls back with a code
    let res = client
        .get(format!("http://{local}/callback?code=XYZ"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let html = res.text().await.unwrap();
    assert!(html.contains("Jane"));

    let result = state.result.lock().await.take().unwrap();
    assert_eq!(result.unwrap().profile.id, "u1");

    // replaying the code fails: the verifier was consumed
    let res = client
        .get(format!("http://{local}/callback?code=XYZ"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(res.text().await.unwrap().contains("Sign-in failed"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let mock = MockProvider::new();
    let provider = mock.start().await;
    let state = AppState::new(AuthFlow::new(config_for(provider), MemoryStore::shared()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let local = listener.local_addr().unwrap();
    tokio::spawn(async move {
        server::serve(listener, state).await.unwrap();
    });

    let body: Value = reqwest::get(format!("http://{local}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["name"], "sporlme");
}

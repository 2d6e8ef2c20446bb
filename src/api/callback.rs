use std::{collections::HashMap, sync::Arc};

use axum::{
    Extension,
    extract::Query,
    response::{Html, IntoResponse, Redirect, Response},
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::{
    api::page,
    error::AuthError,
    flow::{AuthFlow, FlowOutcome, RequestContext, Session},
};

/// Final result of a sign-in, handed from the server to whoever is waiting for it.
pub type SignInSlot = Arc<Mutex<Option<Result<Session, AuthError>>>>;

/// State shared by the handlers of the callback server.
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<AuthFlow>,
    pub result: SignInSlot,
}

impl AppState {
    pub fn new(flow: AuthFlow) -> Self {
        Self {
            flow: Arc::new(flow),
            result: Arc::new(Mutex::new(None)),
        }
    }
}

/// Serves the redirect URI.
///
/// Without a code the browser is sent to the provider; with a code the
/// profile is rendered. Any failure renders an error page.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(state): Extension<AppState>,
) -> Response {
    let ctx = RequestContext::new(params);

    match state.flow.handle(&ctx).await {
        Ok(FlowOutcome::Redirect(url)) => Redirect::to(url.as_str()).into_response(),
        Ok(FlowOutcome::SignedIn(session)) => {
            let html = page::profile_page(&session);
            *state.result.lock().await = Some(Ok(session));
            Html(html).into_response()
        }
        Err(err) => {
            warn!("sign-in failed: {}", err);
            let response = (err.http_status(), Html(page::error_page(&err))).into_response();
            *state.result.lock().await = Some(Err(err));
            response
        }
    }
}

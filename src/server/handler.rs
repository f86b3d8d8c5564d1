//! Route handlers

use crate::access_control::{DenyReason, RuleSummary};
use crate::classifier::Request;
use crate::credentials::Transport;
use crate::kernel::{Decision, Outcome, SharedKernel};
use crate::taxonomy::ActionSet;
use crate::upstream::{CredentialProbe, CredentialStatus};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, instrument};

/// Shared state for route handlers
#[derive(Clone)]
pub struct AppState {
    pub kernel: Arc<SharedKernel>,
    pub probe: Arc<dyn CredentialProbe>,
}

impl AppState {
    pub fn new(kernel: Arc<SharedKernel>, probe: Arc<dyn CredentialProbe>) -> Self {
        Self { kernel, probe }
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/authorize", post(authorize))
        .route("/v1/actions", get(actions))
        .route("/v1/credentials/status", get(credentials_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON form of a [`Decision`]. Names the selected credential, never its secret.
#[derive(Debug, Serialize)]
pub struct DecisionBody {
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    pub actions: ActionSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    /// Authorization scheme to present upstream with the credential
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_scheme: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonBody>,
}

#[derive(Debug, Serialize)]
pub struct ReasonBody {
    pub code: &'static str,
    pub message: String,
}

impl From<&DenyReason> for ReasonBody {
    fn from(reason: &DenyReason) -> Self {
        Self {
            code: reason.code(),
            message: reason.to_string(),
        }
    }
}

impl DecisionBody {
    pub fn new(decision: &Decision, transport: Transport) -> Self {
        Self {
            outcome: decision.outcome,
            repo: decision.repo.as_ref().map(|r| r.full_name()),
            actions: decision.actions.clone(),
            rule: decision.matched_rule.clone(),
            credential: decision.credential.as_ref().map(|c| c.name().to_string()),
            auth_scheme: decision
                .credential
                .as_ref()
                .map(|c| c.auth_header(transport).scheme()),
            reason: decision.reason.as_ref().map(ReasonBody::from),
        }
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /v1/authorize`: 200 on allow, 403 on deny, 400 on a malformed body
async fn authorize(
    State(state): State<AppState>,
    payload: Result<Json<Request>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "Rejected malformed request");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response();
        }
    };

    let decision = state.kernel.authorize(&request);
    let status = if decision.is_allowed() {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    };

    let body = DecisionBody::new(&decision, request.transport());
    (status, Json(body)).into_response()
}

#[derive(Debug, Serialize)]
struct Catalog {
    namespaces: BTreeMap<String, ActionSet>,
    bundles: BTreeMap<String, ActionSet>,
}

/// `GET /v1/actions`: namespaces with their primitives, bundles with their expansion
async fn actions(State(state): State<AppState>) -> Json<Catalog> {
    let kernel = state.kernel.current();
    let taxonomy = kernel.taxonomy();

    Json(Catalog {
        namespaces: taxonomy
            .namespaces()
            .map(|(ns, set)| (ns.to_string(), set.clone()))
            .collect(),
        bundles: taxonomy
            .bundles()
            .map(|(name, set)| (name.to_string(), set.clone()))
            .collect(),
    })
}

#[derive(Debug, Serialize)]
struct StatusReport {
    credentials: Vec<CredentialStatus>,
}

/// `GET /v1/credentials/status`: probe every configured credential upstream
#[instrument(skip(state))]
async fn credentials_status(State(state): State<AppState>) -> Json<StatusReport> {
    let kernel = state.kernel.current();

    let mut credentials = Vec::new();
    for credential in kernel.credentials().iter() {
        credentials.push(state.probe.probe(credential).await);
    }

    Json(StatusReport { credentials })
}

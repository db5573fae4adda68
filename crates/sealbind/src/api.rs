//! JSON paste API: the only surface clients talk to
//!
//! Gate order on creation: rate limit first (cheap, and a rejected request
//! must not burn a single-use PoW challenge), then PoW verification, then
//! payload validation inside the service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sealbin_core::config::SealbinConfig;
use sealbin_core::wire::{
    CreatePasteRequest, CreatePasteResponse, DeletePasteRequest, ErrorResponse, PasteMeta,
    PowIssueResponse, RetrievePasteResponse,
};
use sealbin_core::{encoding, SealbinError};
use sealbin_pow::{MemoryChallengeStore, PowGate};
use sealbin_store::{CreateRequest, MemoryStore, PasteService, RateLimiter};

use crate::metrics::ApiMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    service: PasteService<MemoryStore>,
    pow: PowGate<MemoryChallengeStore>,
    limiter: RateLimiter,
    metrics: ApiMetrics,
}

impl AppState {
    pub fn new(config: &SealbinConfig, metrics: ApiMetrics) -> Self {
        Self {
            inner: Arc::new(Inner {
                service: PasteService::new(config.limits.clone(), MemoryStore::new()),
                pow: PowGate::new(config.pow.clone(), MemoryChallengeStore::new()),
                limiter: RateLimiter::new(&config.rate_limit),
                metrics,
            }),
        }
    }

    pub fn service(&self) -> &PasteService<MemoryStore> {
        &self.inner.service
    }

    pub fn pow(&self) -> &PowGate<MemoryChallengeStore> {
        &self.inner.pow
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/pow", get(issue_pow))
        .route("/api/paste", axum::routing::post(create_paste))
        .route("/api/paste/{id}", get(get_paste).delete(delete_paste))
        .with_state(state)
}

/// Typed error → HTTP response. Only the taxonomy label and a generic
/// message ever leave the process.
struct ApiError(SealbinError);

impl From<SealbinError> for ApiError {
    fn from(e: SealbinError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SealbinError::Validation(_) => StatusCode::BAD_REQUEST,
            SealbinError::Authentication
            | SealbinError::PowRequired
            | SealbinError::PowInvalid
            | SealbinError::InvalidToken => StatusCode::FORBIDDEN,
            SealbinError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SealbinError::NotFound => StatusCode::NOT_FOUND,
            SealbinError::Backend(_) | SealbinError::Io(_) | SealbinError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self.0);
        }

        let body = ErrorResponse {
            error: self.0.label().to_string(),
            message: generic_message(&self.0).to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Human-readable but deliberately generic; validation detail is safe, the
/// rest is fixed text.
fn generic_message(e: &SealbinError) -> &str {
    match e {
        SealbinError::Validation(detail) => detail,
        SealbinError::Authentication => "authentication failed",
        SealbinError::PowRequired => "fetch a challenge from /api/pow and retry",
        SealbinError::PowInvalid => "solution rejected; fetch a fresh challenge and retry",
        SealbinError::RateLimited => "too many requests; back off and retry",
        SealbinError::NotFound => "no such paste",
        SealbinError::InvalidToken => "deletion not authorized",
        SealbinError::Backend(_) | SealbinError::Io(_) | SealbinError::Other(_) => {
            "internal error"
        }
    }
}

async fn issue_pow(State(state): State<AppState>) -> Json<PowIssueResponse> {
    match state.pow().issue() {
        Some(challenge) => {
            state.inner.metrics.pow_issued.inc();
            Json(PowIssueResponse::Challenge {
                challenge: challenge.challenge,
                difficulty: challenge.difficulty,
                expires_at: unix_secs(challenge.expires_at),
            })
        }
        None => Json(PowIssueResponse::disabled()),
    }
}

async fn create_paste(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<CreatePasteRequest>,
) -> Result<(StatusCode, Json<CreatePasteResponse>), ApiError> {
    if !state.limiter().allow(&addr.ip().to_string()) {
        state.inner.metrics.rate_limited.inc();
        return Err(SealbinError::RateLimited.into());
    }

    let solution = req
        .pow
        .as_ref()
        .map(|s| (s.challenge.as_str(), s.nonce));
    state.pow().verify(solution).map_err(|e| {
        state.inner.metrics.pow_rejected.inc();
        match e {
            sealbin_pow::PowError::Required => SealbinError::PowRequired,
            sealbin_pow::PowError::Invalid => SealbinError::PowInvalid,
        }
    })?;

    let ciphertext = decode_field(&req.ct, "ct")?;
    let iv = decode_field(&req.iv, "iv")?;
    let delete_auth = decode_field(&req.delete_auth, "deleteAuth")?;

    let views_allowed = if req.meta.single_view {
        Some(1)
    } else {
        req.meta.views_allowed
    };

    let created = state.service().create(CreateRequest {
        ciphertext,
        iv,
        mime: req.meta.mime,
        expire_at: UNIX_EPOCH + Duration::from_secs(req.meta.expire_ts),
        views_allowed,
        delete_auth: Some(delete_auth),
    })?;
    state.inner.metrics.pastes_created.inc();

    Ok((
        StatusCode::CREATED,
        Json(CreatePasteResponse {
            id: created.id,
            delete_token: created.delete_token,
        }),
    ))
}

async fn get_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RetrievePasteResponse>, ApiError> {
    let view = state.service().retrieve(&id)?;
    state.inner.metrics.pastes_retrieved.inc();

    Ok(Json(RetrievePasteResponse {
        ct: encoding::encode(&view.ciphertext),
        iv: encoding::encode(&view.iv),
        meta: PasteMeta {
            expire_ts: unix_secs(view.expire_at),
            mime: view.mime,
            views_allowed: view.views_allowed,
            single_view: view.views_allowed == Some(1),
        },
        views_left: view.views_left,
    }))
}

async fn delete_paste(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DeletePasteRequest>,
) -> Result<StatusCode, ApiError> {
    state.service().delete(&id, &req.delete_auth)?;
    state.inner.metrics.pastes_deleted.inc();
    Ok(StatusCode::NO_CONTENT)
}

fn decode_field(value: &str, field: &str) -> Result<Vec<u8>, ApiError> {
    encoding::decode(value)
        .map_err(|_| SealbinError::Validation(format!("{field} is not valid base64url")).into())
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

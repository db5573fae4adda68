//! Thin HTTP client over the paste API's JSON wire types.

use anyhow::{bail, Context, Result};
use sealbin_core::wire::{
    CreatePasteRequest, CreatePasteResponse, DeletePasteRequest, ErrorResponse, PowIssueResponse,
    RetrievePasteResponse,
};

pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// `GET /api/pow`: a fresh challenge, or the disabled signal.
    pub async fn fetch_pow(&self) -> Result<PowIssueResponse> {
        let resp = self
            .http
            .get(format!("{}/api/pow", self.base))
            .send()
            .await
            .context("fetching PoW challenge")?;
        parse_response(resp).await
    }

    pub async fn create_paste(&self, req: &CreatePasteRequest) -> Result<CreatePasteResponse> {
        let resp = self
            .http
            .post(format!("{}/api/paste", self.base))
            .json(req)
            .send()
            .await
            .context("submitting paste")?;
        parse_response(resp).await
    }

    pub async fn retrieve_paste(&self, id: &str) -> Result<RetrievePasteResponse> {
        let resp = self
            .http
            .get(format!("{}/api/paste/{id}", self.base))
            .send()
            .await
            .context("fetching paste")?;
        parse_response(resp).await
    }

    pub async fn delete_paste(&self, id: &str, req: &DeletePasteRequest) -> Result<()> {
        let resp = self
            .http
            .delete(format!("{}/api/paste/{id}", self.base))
            .json(req)
            .send()
            .await
            .context("deleting paste")?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(api_error(resp).await)
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    if !resp.status().is_success() {
        return Err(api_error(resp).await);
    }
    resp.json().await.context("decoding server response")
}

/// Turn a non-2xx response into an error carrying the server's taxonomy
/// label when the body parses, or the bare status when it doesn't.
async fn api_error(resp: reqwest::Response) -> anyhow::Error {
    let status = resp.status();
    match resp.json::<ErrorResponse>().await {
        Ok(body) => anyhow::anyhow!("server rejected request ({}): {}", body.error, body.message),
        Err(_) => anyhow::anyhow!("server returned {status}"),
    }
}

/// Guard against a silently misconfigured server URL.
pub fn check_base_url(base: &str) -> Result<()> {
    if !base.starts_with("http://") && !base.starts_with("https://") {
        bail!("server URL must start with http:// or https://, got {base:?}");
    }
    Ok(())
}

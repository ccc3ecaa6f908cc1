//! Live-network collaborator.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};

use super::types::{FetchRequest, FetchResponse};

/// The worker only ever reaches the network through this trait, so tests can
/// script per-URL outcomes and embedders can route through their own stack.
/// No retry, timeout, or cancellation logic lives behind it.
#[async_trait]
pub trait NetworkFetch: Send + Sync {
  async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// reqwest-backed client used in production.
#[derive(Clone)]
pub struct HttpClient {
  client: reqwest::Client,
}

impl HttpClient {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;
    Ok(Self { client })
  }
}

#[async_trait]
impl NetworkFetch for HttpClient {
  async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
    let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
      .map_err(|e| eyre!("Invalid method {}: {}", request.method.as_str(), e))?;

    let response = self
      .client
      .request(method, request.url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", request.url, e))?;

    let status = response.status().as_u16();
    let headers = response
      .headers()
      .iter()
      .filter_map(|(name, value)| {
        value
          .to_str()
          .ok()
          .map(|v| (name.as_str().to_string(), v.to_string()))
      })
      .collect();
    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read body from {}: {}", request.url, e))?
      .to_vec();

    Ok(FetchResponse { status, headers, body })
  }
}

//! Request and response types shared by the network client and the stores.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// Request method. Only GET traffic participates in caching; everything else
/// exists so the interceptor can route it untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
  Get,
  Head,
  Post,
  Put,
  Patch,
  Delete,
  Options,
}

impl Method {
  pub fn as_str(&self) -> &'static str {
    match self {
      Method::Get => "GET",
      Method::Head => "HEAD",
      Method::Post => "POST",
      Method::Put => "PUT",
      Method::Patch => "PATCH",
      Method::Delete => "DELETE",
      Method::Options => "OPTIONS",
    }
  }

  pub fn is_get(&self) -> bool {
    matches!(self, Method::Get)
  }
}

/// Identity of an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
  pub method: Method,
  pub url: Url,
}

impl FetchRequest {
  pub fn new(method: Method, url: &str) -> Result<Self> {
    let url = Url::parse(url).map_err(|e| eyre!("Invalid request URL {}: {}", url, e))?;
    Ok(Self { method, url })
  }

  /// Shorthand for the common case.
  pub fn get(url: &str) -> Result<Self> {
    Self::new(Method::Get, url)
  }

  /// Storage identity for this request.
  pub fn key(&self) -> RequestKey {
    RequestKey::for_request(self)
  }
}

/// A fully buffered response. Bodies are owned bytes, so cloning one yields
/// an independent copy for storage while the original goes to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
  pub status: u16,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl FetchResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Stable storage identity for a request: method and URL hashed into a
/// fixed-length key, with the URL kept alongside for readability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestKey {
  pub hash: String,
  pub url: String,
}

impl RequestKey {
  pub fn for_request(request: &FetchRequest) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(request.method.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(request.url.as_str().as_bytes());
    Self {
      hash: hex::encode(hasher.finalize()),
      url: request.url.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_request_key_is_stable() {
    let a = FetchRequest::get("https://news.example.com/api/news/top").unwrap();
    let b = FetchRequest::get("https://news.example.com/api/news/top").unwrap();
    assert_eq!(a.key(), b.key());
  }

  #[test]
  fn test_request_key_separates_method_and_url() {
    let get = FetchRequest::get("https://news.example.com/api/news/top").unwrap();
    let post = FetchRequest::new(Method::Post, "https://news.example.com/api/news/top").unwrap();
    let other = FetchRequest::get("https://news.example.com/api/news/latest").unwrap();
    assert_ne!(get.key().hash, post.key().hash);
    assert_ne!(get.key().hash, other.key().hash);
  }

  #[test]
  fn test_success_status_range() {
    let ok = FetchResponse { status: 204, headers: Vec::new(), body: Vec::new() };
    let not_found = FetchResponse { status: 404, headers: Vec::new(), body: Vec::new() };
    assert!(ok.is_success());
    assert!(!not_found.is_success());
  }
}

//! Test doubles for the collaborator seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};

use crate::net::{FetchRequest, FetchResponse, NetworkFetch};
use crate::worker::HostController;

pub fn text_response(body: &str) -> FetchResponse {
  response_with_status(200, body)
}

pub fn response_with_status(status: u16, body: &str) -> FetchResponse {
  FetchResponse {
    status,
    headers: vec![("content-type".to_string(), "text/plain".to_string())],
    body: body.as_bytes().to_vec(),
  }
}

/// Scripted network: per-URL responses, failures for unknown URLs, a global
/// offline switch, and a fetch counter so tests can assert whether the
/// network was touched at all.
#[derive(Default)]
pub struct FakeNetwork {
  responses: Mutex<HashMap<String, FetchResponse>>,
  offline: AtomicBool,
  fetches: AtomicUsize,
}

impl FakeNetwork {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_response(self, url: &str, response: FetchResponse) -> Self {
    self
      .responses
      .lock()
      .unwrap()
      .insert(url.to_string(), response);
    self
  }

  pub fn set_offline(&self, offline: bool) {
    self.offline.store(offline, Ordering::SeqCst);
  }

  pub fn fetch_count(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl NetworkFetch for FakeNetwork {
  async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
    self.fetches.fetch_add(1, Ordering::SeqCst);
    if self.offline.load(Ordering::SeqCst) {
      return Err(eyre!("network unreachable"));
    }
    self
      .responses
      .lock()
      .unwrap()
      .get(request.url.as_str())
      .cloned()
      .ok_or_else(|| eyre!("no route to {}", request.url))
  }
}

/// Host hook that records which lifecycle transitions were requested.
#[derive(Default)]
pub struct RecordingHost {
  skip_waiting: AtomicBool,
  claim_clients: AtomicBool,
}

impl RecordingHost {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn skipped_waiting(&self) -> bool {
    self.skip_waiting.load(Ordering::SeqCst)
  }

  pub fn claimed_clients(&self) -> bool {
    self.claim_clients.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl HostController for RecordingHost {
  async fn skip_waiting(&self) -> Result<()> {
    self.skip_waiting.store(true, Ordering::SeqCst);
    Ok(())
  }

  async fn claim_clients(&self) -> Result<()> {
    self.claim_clients.store(true, Ordering::SeqCst);
    Ok(())
  }
}

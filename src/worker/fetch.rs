//! Fetch interceptor: request classification and strategy dispatch.

use color_eyre::Result;
use tracing::debug;

use crate::cache::{cache_first, network_first, NamedStores, ResponseSource, Served};
use crate::config::{WorkerConfig, EXTENSION_SCHEMES};
use crate::net::{FetchRequest, NetworkFetch};

/// How an intercepted request is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
  /// Part of the app shell: cache-first against the static store.
  StaticAsset,
  /// GET under the news API prefix: network-first against the dynamic store.
  DynamicNews,
  /// Everything else, including non-GET API calls: straight to the network.
  Default,
}

/// Classify a request. Shell membership wins over the API-prefix rule when
/// a URL satisfies both.
pub fn classify(config: &WorkerConfig, request: &FetchRequest) -> RequestClass {
  if config.is_shell_asset(&request.url) {
    return RequestClass::StaticAsset;
  }
  if request.method.is_get() && request.url.path().starts_with(&config.api_prefix) {
    return RequestClass::DynamicNews;
  }
  RequestClass::Default
}

/// What the interceptor decided for a request.
#[derive(Debug)]
pub enum FetchDecision {
  /// The worker produced the response.
  Respond(Served),
  /// Extension-internal traffic; the host handles it on its own.
  Ignore,
}

/// Route one request. Extension-internal schemes are ignored before any
/// classification; the rest go through the strategy their class selects.
pub async fn handle_fetch<S, N>(
  config: &WorkerConfig,
  stores: &S,
  network: &N,
  request: &FetchRequest,
) -> Result<FetchDecision>
where
  S: NamedStores,
  N: NetworkFetch,
{
  if EXTENSION_SCHEMES.contains(&request.url.scheme()) {
    return Ok(FetchDecision::Ignore);
  }

  let key = request.key();
  let served = match classify(config, request) {
    RequestClass::StaticAsset => {
      cache_first(stores, &config.static_store_name(), &key, || {
        network.fetch(request)
      })
      .await?
    }
    RequestClass::DynamicNews => {
      network_first(stores, &config.dynamic_store_name(), &key, || {
        network.fetch(request)
      })
      .await?
    }
    RequestClass::Default => {
      debug!("passing {} {} through", request.method.as_str(), request.url);
      Served {
        response: network.fetch(request).await?,
        source: ResponseSource::Network,
      }
    }
  };

  Ok(FetchDecision::Respond(served))
}

//! Offline-first caching worker for a news-reading application.
//!
//! The crate mirrors the install / activate / fetch lifecycle of a browser
//! service worker as explicit async handlers:
//!
//! - [`worker::install`] pre-populates a versioned store with the app shell
//! - [`worker::activate`] deletes stores left over from previous versions
//!   and takes over already-open pages
//! - [`worker::handle_fetch`] classifies each request and serves it
//!   cache-first, network-first, or straight from the network
//!
//! The host platform (storage, live network, lifecycle control) is reached
//! only through trait seams, so embedders and tests supply their own
//! collaborators. Configuration is an explicit [`WorkerConfig`] value passed
//! into every handler; nothing is read from ambient scope.

pub mod cache;
pub mod config;
pub mod event;
pub mod net;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::WorkerConfig;
pub use worker::ServiceWorker;

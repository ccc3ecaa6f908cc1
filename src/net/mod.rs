//! Network side of the worker: request/response types and the live-fetch
//! collaborator.

mod client;
mod types;

pub use client::{HttpClient, NetworkFetch};
pub use types::{FetchRequest, FetchResponse, Method, RequestKey};

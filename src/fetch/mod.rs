//! HTTP client abstraction layer
//!
//! Platform sources and the playlist proxy talk to the outside world only
//! through [`HttpClient`], so the production `reqwest` client can be swapped
//! for [`MockHttpClient`] in tests.

mod client;
mod error;
mod mock;
mod reqwest_client;
mod types;

pub use client::HttpClient;
pub use error::FetchError;
pub use mock::{MockHttpClient, MockResponse};
pub use reqwest_client::ReqwestClient;
pub use types::{HttpRequest, HttpResponse, Method, MOBILE_USER_AGENT};

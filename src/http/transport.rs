//! Transport seam between the fetcher and the network
//!
//! Everything above this trait only needs "GET a URL with query parameters
//! and hand back the status and body". The reqwest client implements it for
//! live services; tests substitute scripted responses.

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;

/// A fully-read HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL of the request (including the encoded query string)
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Raw body bytes
    pub body: Bytes,
}

impl RawResponse {
    /// Create a response with status 200
    pub fn ok(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into an `HttpStatus` error carrying the body
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            let body = String::from_utf8_lossy(&self.body).into_owned();
            Err(Error::http_status(self.status, body))
        }
    }

    /// Number of body bytes downloaded
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Body decoded as UTF-8
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.body)
            .map_err(|e| Error::protocol(&self.url, format!("body is not UTF-8: {e}")))
    }
}

/// Issues GET requests against a SensorThings service
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with `query` appended, returning the fully-read response.
    ///
    /// Implementations return a transport error for network failures.
    /// Callers still check [`RawResponse::error_for_status`] before decoding.
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse> {
        (**self).get(url, query).await
    }
}

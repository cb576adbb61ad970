//! Executes `HttpRequest`s against the network.
//!
//! # Design
//! `LacrmClient` is generic over `Transport` so the request pipeline can be
//! exercised without a network (see the recording transport in the client
//! tests). The default `UreqTransport` is blocking and returns 4xx/5xx
//! responses as data, body bytes untouched; only failures to get any response
//! become errors.

use std::fmt;

use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Performs one HTTP POST per call.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

/// Blocking transport backed by a shared `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let builder = request
            .headers
            .iter()
            .fold(self.agent.post(&request.url), |builder, (name, value)| {
                builder.header(name.as_str(), value.as_str())
            });

        let mut response = builder.send(request.body.as_bytes())?;

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
        let body = response.body_mut().read_to_vec()?;
        debug!(status, bytes = body.len(), "received CRM response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

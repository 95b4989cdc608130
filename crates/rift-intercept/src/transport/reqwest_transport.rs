//! Real transport backed by `reqwest::blocking`.

use super::Transport;
use crate::error::TransportError;
use crate::request::{PreparedRequest, RequestKwargs};
use crate::response::HttpResponse;
use once_cell::sync::OnceCell;
use std::time::Duration;

/// Blocking HTTP transport. The client is built on first use.
#[derive(Default)]
pub struct ReqwestTransport {
    client: OnceCell<reqwest::blocking::Client>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self {
            client: OnceCell::with_value(client),
        }
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, TransportError> {
        self.client.get_or_try_init(|| {
            reqwest::blocking::Client::builder()
                .build()
                .map_err(|e| TransportError::Other(format!("failed to create HTTP client: {}", e)))
        })
    }
}

fn map_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::Connection(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: &PreparedRequest,
        kwargs: &RequestKwargs,
    ) -> Result<HttpResponse, TransportError> {
        let method: http::Method = request
            .method
            .parse()
            .map_err(|_| TransportError::Other(format!("invalid method {}", request.method)))?;

        let mut builder = self
            .client()?
            .request(method, &request.url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.to_vec());
        }
        if let Some(secs) = kwargs.get("timeout").and_then(|v| v.as_f64()) {
            builder = builder.timeout(Duration::from_secs_f64(secs));
        }

        let response = builder.send().map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().map_err(map_error)?;
        Ok(HttpResponse::new(status).with_headers(headers).with_body(body))
    }
}

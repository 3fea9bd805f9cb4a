//! Blocking HTTP transport used by request expressions.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use crate::ast::Method;

/// Default timeout applied to the whole request, body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    /// `None` disables the timeout.
    pub timeout: Option<Duration>,
    /// Largest response body accepted, in bytes.  `None` reads bodies of any size.
    pub max_body: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout: Some(DEFAULT_TIMEOUT),
            max_body: None,
        }
    }
}

/// Fully evaluated request, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Lower-case header names.  Repeated headers are joined with ", ".
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Transport failure while performing a request.
#[derive(Debug)]
pub struct RequestError {
    pub method: Method,
    pub url: String,
    pub cause: ureq::Error,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request error: {} {}: {}",
            self.method, self.url, self.cause
        )
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

pub struct HttpClient {
    agent: ureq::Agent,
    config: HttpConfig,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish()
    }
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> HttpClient {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(config.timeout)
            .http_status_as_error(false)
            .build();
        HttpClient {
            agent: ureq::Agent::new_with_config(agent_config),
            config,
        }
    }

    /// Perform `req` and read the whole response.  Non-2xx statuses are not errors.
    pub fn send(&self, req: &HttpRequest) -> Result<HttpResponse, RequestError> {
        info!(method = %req.method, url = %req.url, "sending request");
        let result = self
            .dispatch(req)
            .and_then(|resp| read_response(resp, self.config.max_body));
        match result {
            Ok(resp) => {
                info!(method = %req.method, url = %req.url, status = resp.status, "received response");
                Ok(resp)
            }
            Err(cause) => {
                warn!(method = %req.method, url = %req.url, error = %cause, "request failed");
                Err(RequestError {
                    method: req.method,
                    url: req.url.clone(),
                    cause,
                })
            }
        }
    }

    fn dispatch(&self, req: &HttpRequest) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let url = req.url.as_str();
        match req.method {
            Method::Get | Method::Delete => {
                let builder = match req.method {
                    Method::Delete => self.agent.delete(url),
                    _ => self.agent.get(url),
                };
                let builder = req
                    .headers
                    .iter()
                    .fold(builder, |b, (k, v)| b.header(k.as_str(), v.as_str()));
                match &req.body {
                    Some(body) => builder.force_send_body().send(body.as_bytes()),
                    None => builder.call(),
                }
            }
            Method::Post | Method::Put | Method::Patch => {
                let builder = match req.method {
                    Method::Put => self.agent.put(url),
                    Method::Patch => self.agent.patch(url),
                    _ => self.agent.post(url),
                };
                let builder = req
                    .headers
                    .iter()
                    .fold(builder, |b, (k, v)| b.header(k.as_str(), v.as_str()));
                match &req.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        }
    }
}

fn read_response(
    mut resp: ureq::http::Response<ureq::Body>,
    max_body: Option<u64>,
) -> Result<HttpResponse, ureq::Error> {
    let status = resp.status().as_u16();
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in resp.headers() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_owned())
            .and_modify(|v| {
                v.push_str(", ");
                v.push_str(&value);
            })
            .or_insert_with(|| value.clone());
    }
    let body = resp
        .body_mut()
        .with_config()
        .limit(max_body.unwrap_or(u64::MAX))
        .read_to_string()?;
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

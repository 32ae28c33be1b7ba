use super::{ApiError, Fetch};
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Basic auth for the REST api (a login plus a personal access token).
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub token: String,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("token", &"<redacted>")
      .finish()
  }
}

pub struct HttpFetcher {
  client: reqwest::blocking::Client,
  api_root: String,
  credentials: Option<Credentials>,
}

impl HttpFetcher {
  pub fn new(
    api_root: &str,
    credentials: Option<Credentials>,
    timeout: Duration,
  ) -> Result<Self> {
    let client = reqwest::blocking::Client::builder()
      .user_agent("github_activity/0.1.0")
      .timeout(timeout)
      .build()?;

    Ok(Self {
      client,
      api_root: api_root.to_owned(),
      credentials,
    })
  }

  pub fn url(&self, path: &str) -> String {
    join_url(&self.api_root, path)
  }
}

fn join_url(api_root: &str, path: &str) -> String {
  format!(
    "{}/{}",
    api_root.trim_end_matches('/'),
    path.trim_start_matches('/')
  )
}

impl Fetch for HttpFetcher {
  fn fetch_json(&self, path: &str) -> Result<Value, ApiError> {
    let url = self.url(path);
    debug!(%url, "fetching");

    let transport_err = |e: reqwest::Error| ApiError::Transport {
      url: url.clone(),
      message: e.to_string(),
    };

    let mut req = self.client.get(&url);
    if let Some(Credentials { username, token }) = &self.credentials {
      req = req.basic_auth(username, Some(token));
    }

    let res = req.send().map_err(transport_err)?;

    let status = res.status();
    if !status.is_success() {
      return Err(ApiError::Status {
        url: url.clone(),
        status: status.as_u16(),
      });
    }

    let body = res.text().map_err(transport_err)?;
    body_to_json(status.as_u16(), &body).map_err(|e| ApiError::Transport {
      url: url.clone(),
      message: e.to_string(),
    })
  }
}

/// `204 No Content` (or any empty body) is returned as `Value::Null`.
fn body_to_json(status: u16, body: &str) -> serde_json::Result<Value> {
  if status == 204 || body.trim().is_empty() {
    return Ok(Value::Null);
  }
  serde_json::from_str(body)
}

use super::{ApiError, Fetch};
use serde_json::Value;
use std::{collections::HashMap, sync::Mutex};

#[derive(Clone, Debug)]
pub enum Canned {
  Json(Value),
  Status(u16),
  Transport,
}

/// Serves canned responses keyed by path and records every request.
/// Unknown paths respond with 404.
#[derive(Default)]
pub struct FakeFetcher {
  responses: HashMap<String, Canned>,
  calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn json(mut self, path: &str, value: Value) -> Self {
    self.responses.insert(path.to_owned(), Canned::Json(value));
    self
  }

  /// A success without a body, as in `204 No Content`.
  pub fn no_content(self, path: &str) -> Self {
    self.json(path, Value::Null)
  }

  pub fn status(mut self, path: &str, status: u16) -> Self {
    self.responses.insert(path.to_owned(), Canned::Status(status));
    self
  }

  pub fn transport_failure(mut self, path: &str) -> Self {
    self.responses.insert(path.to_owned(), Canned::Transport);
    self
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  pub fn call_count(&self, path: &str) -> usize {
    self.calls().iter().filter(|p| p.as_str() == path).count()
  }
}

impl Fetch for FakeFetcher {
  fn fetch_json(&self, path: &str) -> Result<Value, ApiError> {
    self.calls.lock().unwrap().push(path.to_owned());
    let url = format!("fake://{}", path);
    match self.responses.get(path) {
      Some(Canned::Json(value)) => Ok(value.clone()),
      Some(Canned::Status(status)) => Err(ApiError::Status {
        url,
        status: *status,
      }),
      Some(Canned::Transport) => Err(ApiError::Transport {
        url,
        message: "connection reset".to_owned(),
      }),
      None => Err(ApiError::Status { url, status: 404 }),
    }
  }
}

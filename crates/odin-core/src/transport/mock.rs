//! In-memory connection for tests.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

use super::Connection;
use crate::error::{Error, Result};

/// Connection answering GETs from canned responses and recording PUTs
#[derive(Default)]
pub struct MockConnection {
    responses: Mutex<HashMap<String, Value>>,
    put_responses: Mutex<HashMap<String, Value>>,
    puts: Mutex<Vec<(String, Value)>>,
    gets: Mutex<Vec<String>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer GETs of `path` with `response`
    pub fn with_response(self, path: &str, response: Value) -> Self {
        self.set_response(path, response);
        self
    }

    /// Answer PUTs to `path` with `response` instead of an empty object
    pub fn with_put_response(self, path: &str, response: Value) -> Self {
        self.put_responses
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
        self
    }

    pub fn set_response(&self, path: &str, response: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    pub fn puts(&self) -> Vec<(String, Value)> {
        self.puts.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn get(&self, path: &str, _headers: &[(&str, &str)]) -> Result<Value> {
        self.gets.lock().unwrap().push(path.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Status {
                path: path.to_string(),
                status: 404,
                body: String::from("not found"),
            })
    }

    async fn put(&self, path: &str, value: &Value) -> Result<Value> {
        self.puts
            .lock()
            .unwrap()
            .push((path.to_string(), value.clone()));
        Ok(self
            .put_responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| json!({})))
    }
}

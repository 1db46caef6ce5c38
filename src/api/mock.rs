use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::{ApiRequest, ApiResponse, HttpTransport, Method};
use crate::error::AppError;

#[derive(Clone)]
enum Reply {
    Respond(ApiResponse),
    Delayed(Duration, ApiResponse),
    Fail(String),
}

struct Route {
    method: Method,
    path: String,
    replies: VecDeque<Reply>,
}

/// Scripted transport: replies are queued per `(method, path)` and the last
/// one keeps repeating. Every request is recorded.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) -> &Self {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        match routes.iter_mut().find(|r| r.method == method && r.path == path) {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                method,
                path: path.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
        self
    }

    pub fn on(&self, method: Method, path: &str, response: ApiResponse) -> &Self {
        self.push(method, path, Reply::Respond(response))
    }

    pub fn on_json(&self, method: Method, path: &str, status: u16, body: serde_json::Value) -> &Self {
        self.on(method, path, ApiResponse::json_value(status, &body))
    }

    pub fn on_bytes(&self, method: Method, path: &str, bytes: &[u8]) -> &Self {
        self.on(method, path, ApiResponse::new(200, bytes.to_vec()))
    }

    pub fn on_delayed(
        &self,
        method: Method,
        path: &str,
        delay: Duration,
        status: u16,
        body: serde_json::Value,
    ) -> &Self {
        self.push(
            method,
            path,
            Reply::Delayed(delay, ApiResponse::json_value(status, &body)),
        )
    }

    pub fn on_network_error(&self, method: Method, path: &str, message: &str) -> &Self {
        self.push(method, path, Reply::Fail(message.to_string()))
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path() == path)
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn next_reply(&self, method: Method, path: &str) -> Option<Reply> {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        let route = routes.iter_mut().find(|r| r.method == method && r.path == path)?;
        if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let method = request.method;
        let path = request.path();
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        match self.next_reply(method, &path) {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Delayed(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(Reply::Fail(message)) => Err(AppError::Network(message)),
            None => Ok(ApiResponse::json_value(
                404,
                &json!({ "message": format!("no mock route for {} {}", method, path) }),
            )),
        }
    }
}

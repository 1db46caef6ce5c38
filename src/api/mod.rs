pub mod dto;
pub mod mock;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::storage::{self, SessionStore, TOKEN_KEY};

pub use mock::MockTransport;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        filename: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

/// Ordered multipart fields, the equivalent of a browser `FormData`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_text(name, value);
        self
    }

    pub fn file(mut self, name: &str, filename: &str, mime: Option<&str>, bytes: Vec<u8>) -> Self {
        self.fields.retain(|(n, _)| n != name);
        self.fields.push((
            name.to_string(),
            FormValue::File {
                filename: filename.to_string(),
                mime: mime.map(str::to_string),
                bytes,
            },
        ));
        self
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        let value = FormValue::Text(value.into());
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Text value of a field; empty string when missing or a file.
    pub fn get(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| match v {
                FormValue::Text(text) => Some(text.as_str()),
                FormValue::File { .. } => None,
            })
            .unwrap_or("")
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|(n, v)| n == name && matches!(v, FormValue::File { .. }))
    }

    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Text fields as a JSON object, for endpoints that take JSON instead of multipart.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.fields {
            if let FormValue::Text(text) = value {
                map.insert(name.clone(), serde_json::Value::String(text.clone()));
            }
        }
        serde_json::Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    Multipart(FormData),
}

impl Body {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, AppError> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl FetchOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Body) -> Self {
        Self {
            method: Method::Post,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn put(body: Body) -> Self {
        Self {
            method: Method::Put,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            ..Self::default()
        }
    }

    pub fn with_method(method: Method, body: Option<Body>) -> Self {
        Self {
            method,
            body,
            ..Self::default()
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Already serialised JSON text.
    Json(String),
    Multipart(FormData),
}

/// A fully resolved request handed to the transport.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn path(&self) -> String {
        Url::parse(&self.url)
            .map(|u| u.path().to_string())
            .unwrap_or_default()
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        Url::parse(&self.url).ok().and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
        })
    }

    pub fn json_body(&self) -> Option<serde_json::Value> {
        match &self.body {
            Some(RequestBody::Json(text)) => serde_json::from_str(text).ok(),
            _ => None,
        }
    }
}

/// Raw response; callers decide whether to read JSON or keep the bytes.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn json_value(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: value.to_string().into_bytes(),
        }
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Server-provided `{message}` (or `{error}`) of an error body.
    pub fn error_message(&self, fallback: &str) -> String {
        serde_json::from_slice::<dto::MessageResponse>(&self.body)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .filter(|msg| !msg.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Server-provided `{message}` of a success body, if any.
    pub fn message(&self) -> Option<String> {
        serde_json::from_slice::<dto::MessageResponse>(&self.body)
            .ok()
            .and_then(|body| body.message)
    }

    pub fn into_result(self, fallback: &str) -> Result<Self, AppError> {
        if self.ok() {
            Ok(self)
        } else {
            Err(AppError::Http {
                status: self.status,
                message: self.error_message(fallback),
            })
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AppError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Network(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client })
    }

    fn multipart(form: FormData) -> Result<reqwest::multipart::Form, AppError> {
        let mut out = reqwest::multipart::Form::new();
        for (name, value) in form.fields {
            out = match value {
                FormValue::Text(text) => out.text(name, text),
                FormValue::File {
                    filename,
                    mime,
                    bytes,
                } => {
                    let mut part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
                    if let Some(mime) = mime {
                        part = part.mime_str(&mime)?;
                    }
                    out.part(name, part)
                }
            };
        }
        Ok(out)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Json(text)) => builder.body(text),
            Some(RequestBody::Multipart(form)) => builder.multipart(Self::multipart(form)?),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

/// Invoked after an auth failure wiped the session; the host must restart at the login screen.
pub trait ReloadHook: Send + Sync {
    fn reload(&self);
}

#[derive(Default)]
pub struct ReloadCounter {
    count: AtomicUsize,
}

impl ReloadCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ReloadHook for ReloadCounter {
    fn reload(&self) {
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        warn!("session cleared, reload requested (#{})", n);
    }
}

/// Authenticated access to the EMS REST API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
    reload: Arc<dyn ReloadHook>,
    /// Set by the first auth failure; shared by every clone of the client.
    session_lost: Arc<AtomicBool>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SessionStore>,
        reload: Arc<dyn ReloadHook>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            store,
            reload,
            session_lost: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn uploads_url(&self) -> String {
        format!("{}/uploads/", self.base_url)
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn reload_hook(&self) -> &Arc<dyn ReloadHook> {
        &self.reload
    }

    /// True after an auth failure until a new token is stored by login.
    pub fn session_lost(&self) -> bool {
        self.session_lost.load(Ordering::SeqCst)
    }

    /// Re-arms authenticated requests once a fresh token is stored.
    pub fn restore_session(&self) {
        if self.session_lost.swap(false, Ordering::SeqCst) {
            debug!("session restored");
        }
    }

    pub fn url(&self, path: &str, query: &[(String, String)]) -> Result<String, AppError> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| AppError::Url(format!("{}: {}", raw, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }

    fn build_request(
        &self,
        path: &str,
        options: FetchOptions,
        token: Option<String>,
    ) -> Result<ApiRequest, AppError> {
        let url = self.url(path, &options.query)?;
        let mut headers = options.headers;
        headers.push((REQUEST_ID_HEADER.to_string(), Uuid::new_v4().to_string()));
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        let body = match options.body {
            Some(Body::Json(value)) => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                Some(RequestBody::Json(serde_json::to_string(&value)?))
            }
            Some(Body::Multipart(form)) => Some(RequestBody::Multipart(form)),
            None => None,
        };

        Ok(ApiRequest {
            method: options.method,
            url,
            headers,
            body,
        })
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let method = request.method;
        let url = request.url.clone();
        let request_id = request.header(REQUEST_ID_HEADER).unwrap_or("-").to_string();
        debug!("[{}] {} {}", request_id, method, url);

        match self.transport.send(request).await {
            Ok(response) => {
                debug!("[{}] {} {} -> {}", request_id, method, url, response.status);
                Ok(response)
            }
            Err(e) => {
                error!("[{}] fetch error: {} {}: {}", request_id, method, url, e);
                Err(e)
            }
        }
    }

    /// Sends a request with the stored bearer token. A 401/403 wipes the
    /// session, fires the reload hook and rejects the call. Once the session
    /// is lost, further calls are rejected without reaching the server and
    /// the reload hook fires only for the first failure.
    pub async fn fetch_with_auth(
        &self,
        path: &str,
        options: FetchOptions,
    ) -> Result<ApiResponse, AppError> {
        if self.session_lost() {
            debug!("session lost; not sending {}", path);
            return Err(AppError::Unauthorized);
        }
        let token = self.store.get(TOKEN_KEY);
        let request = self.build_request(path, options, token)?;
        let response = self.dispatch(request).await?;

        if response.status == 401 || response.status == 403 {
            if self.session_lost.swap(true, Ordering::SeqCst) {
                debug!("auth failure ({}) on {} after session loss", response.status, path);
                return Err(AppError::Unauthorized);
            }
            warn!("auth failure ({}) on {}; clearing session", response.status, path);
            if let Err(e) = storage::clear_session(self.store.as_ref()) {
                error!("failed to clear session: {}", e);
            }
            self.reload.reload();
            return Err(AppError::Unauthorized);
        }

        Ok(response)
    }

    /// Unauthenticated request with no global auth-failure handling (login).
    pub async fn fetch(&self, path: &str, options: FetchOptions) -> Result<ApiResponse, AppError> {
        let request = self.build_request(path, options, None)?;
        self.dispatch(request).await
    }

    /// GET + status check + JSON decode.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: FetchOptions,
        fallback: &str,
    ) -> Result<T, AppError> {
        self.fetch_with_auth(path, options)
            .await?
            .into_result(fallback)?
            .json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, ROLE_KEY, USERNAME_KEY};
    use serde_json::json;

    fn client(transport: Arc<MockTransport>, store: Arc<MemoryStore>) -> (ApiClient, Arc<ReloadCounter>) {
        let reload = Arc::new(ReloadCounter::new());
        (
            ApiClient::new("http://ems.test/", transport, store, reload.clone()),
            reload,
        )
    }

    #[tokio::test]
    async fn attaches_bearer_and_json_content_type() {
        let transport = Arc::new(MockTransport::new());
        transport.on_json(Method::Post, "/api/subjects", 201, json!({"message": "ok"}));
        let store = Arc::new(MemoryStore::with_entries([(TOKEN_KEY, "tok")]));
        let (api, _) = client(transport.clone(), store);

        let body = Body::Json(json!({"name": "Math"}));
        let response = api
            .fetch_with_auth("/api/subjects", FetchOptions::post(body))
            .await
            .unwrap();
        assert!(response.ok());

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("Authorization"), Some("Bearer tok"));
        assert_eq!(sent[0].header("Content-Type"), Some("application/json"));
        assert!(sent[0].header(REQUEST_ID_HEADER).is_some());
        assert_eq!(sent[0].json_body(), Some(json!({"name": "Math"})));
    }

    #[tokio::test]
    async fn multipart_body_keeps_its_own_content_type() {
        let transport = Arc::new(MockTransport::new());
        transport.on_json(Method::Post, "/api/students", 201, json!({}));
        let (api, _) = client(transport.clone(), Arc::new(MemoryStore::new()));

        let form = FormData::new().text("name_km", "សុខ");
        api.fetch_with_auth("/api/students", FetchOptions::post(Body::Multipart(form.clone())))
            .await
            .unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.header("Content-Type"), None);
        assert_eq!(sent.header("Authorization"), None);
        assert_eq!(sent.body, Some(RequestBody::Multipart(form)));
    }

    #[tokio::test]
    async fn forbidden_clears_session_and_reloads_once() {
        let transport = Arc::new(MockTransport::new());
        transport.on_json(Method::Get, "/api/users", 403, json!({"message": "Admin access required!"}));
        let store = Arc::new(MemoryStore::with_entries([
            (TOKEN_KEY, "tok"),
            (ROLE_KEY, "teacher"),
            (USERNAME_KEY, "dara"),
        ]));
        let (api, reload) = client(transport, store.clone());

        let err = api.fetch_with_auth("/api/users", FetchOptions::get()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert_eq!(reload.count(), 1);
        assert_eq!(store.get(TOKEN_KEY), None);
        assert_eq!(store.get(ROLE_KEY), None);
        assert_eq!(store.get(USERNAME_KEY), None);
    }

    #[tokio::test]
    async fn query_values_are_url_encoded() {
        let transport = Arc::new(MockTransport::new());
        let (api, _) = client(transport, Arc::new(MemoryStore::new()));
        let url = api
            .url(
                "/api/classes",
                &[("search".to_string(), "Grade 5&6".to_string())],
            )
            .unwrap();
        assert_eq!(url, "http://ems.test/api/classes?search=Grade+5%266");
    }

    #[test]
    fn error_message_prefers_server_text() {
        let resp = ApiResponse::json_value(409, &json!({"message": "Student is already enrolled in this class."}));
        assert_eq!(resp.error_message("x"), "Student is already enrolled in this class.");
        let resp = ApiResponse::new(500, b"<html>".to_vec());
        assert_eq!(resp.error_message("An error occurred."), "An error occurred.");
    }
}

//! HTTP client wrapper for requests to the festival API

use std::sync::Arc;

use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::credentials::TokenProvider;
use crate::error::{format_error_body, Error, Result};

/// Shared transport: base URL, connection pool and token source
#[derive(Clone)]
pub struct HttpClient {
    base_url: Url,
    client: Client,
    credentials: Arc<dyn TokenProvider>,
}

impl HttpClient {
    /// `base_url` must already end in `/` (see [`crate::config::normalize_base_url`]).
    pub fn new(base_url: Url, client: Client, credentials: Arc<dyn TokenProvider>) -> Self {
        Self {
            base_url,
            client,
            credentials,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path such as `needs/12/` against the base URL
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Start building a request
    pub fn request(&self, method: Method, path: &str) -> FetchBuilder<'_> {
        FetchBuilder::new(self, path, method)
    }

    pub fn get(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::PUT, path)
    }

    pub fn patch(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::PATCH, path)
    }

    pub fn delete(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::DELETE, path)
    }
}

/// Helper for building and executing a single request
pub struct FetchBuilder<'a> {
    http: &'a HttpClient,
    path: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    fn new(http: &'a HttpClient, path: &str, method: Method) -> Self {
        Self {
            http,
            path: path.to_string(),
            method,
            headers: HeaderMap::new(),
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Add a header to the request. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add a query parameter
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    fn build(&self) -> Result<RequestBuilder> {
        let mut url = self.http.url(&self.path)?;
        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                pairs.append_pair(key, value);
            }
        }

        let mut headers = self.headers.clone();
        if self.body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if let Some(token) = self.http.credentials.token() {
            if let Ok(value) = HeaderValue::from_str(&format!("Token {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        debug!("{} {}", self.method, url);
        let mut req = self
            .http
            .client
            .request(self.method.clone(), url)
            .headers(headers);
        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }
        Ok(req)
    }

    /// Send the request and return the response whatever its status
    pub async fn execute_raw(&self) -> Result<Response> {
        let req = self.build()?;
        Ok(req.send().await?)
    }

    /// Send the request and decode a successful JSON response.
    ///
    /// `fallback` is the message used when a failed response carries no
    /// usable error body.
    pub async fn execute<T: DeserializeOwned>(&self, fallback: &str) -> Result<T> {
        let response = ensure_success(self.execute_raw().await?, fallback).await?;
        Ok(response.json::<T>().await?)
    }

    /// Send the request and discard a successful response body
    pub async fn execute_empty(&self, fallback: &str) -> Result<()> {
        ensure_success(self.execute_raw().await?, fallback).await?;
        Ok(())
    }
}

/// Pass 2xx responses through; turn anything else into [`Error::Api`].
pub async fn ensure_success(response: Response, fallback: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let bytes = response.bytes().await?;
    let body: Value =
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::Object(Default::default()));
    let message = format_error_body(&body, fallback);
    debug!("Request failed with status {}: {}", status, message);
    Err(Error::Api { status, message })
}

/// A collection response, either a bare array or a paginated envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Plain(Vec<T>),
    Paginated { results: Vec<T> },
}

impl<T> ListEnvelope<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Plain(rows) => rows,
            ListEnvelope::Paginated { results } => results,
        }
    }
}

/// Read an id that may arrive as a number or a numeric string
pub(crate) fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The backend sends decimals as strings; older rows may hold numbers.
pub(crate) fn decimal_from_any<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(de::Error::custom),
        Some(other) => Err(de::Error::custom(format!("invalid decimal: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_accepts_both_shapes() {
        let plain: ListEnvelope<Value> = serde_json::from_value(json!([{"id": 1}])).unwrap();
        assert_eq!(plain.into_vec().len(), 1);

        let paged: ListEnvelope<Value> =
            serde_json::from_value(json!({"count": 2, "results": [{"id": 1}, {"id": 2}]}))
                .unwrap();
        assert_eq!(paged.into_vec().len(), 2);
    }

    #[test]
    fn ids_accept_numeric_strings() {
        assert_eq!(coerce_id(&json!(7)), Some(7));
        assert_eq!(coerce_id(&json!(" 7 ")), Some(7));
        assert_eq!(coerce_id(&json!("seven")), None);
        assert_eq!(coerce_id(&Value::Null), None);
    }
}

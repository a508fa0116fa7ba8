use std::env;
use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Url, header};
use sacco_util::{PortalConfig, TokenStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::ApiError;
use crate::endpoints;
use crate::http::{decode_body, error_message, extract_token, is_public_path};

/// Hostnames allowed to use plain HTTP for local development.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

/// Thin wrapper around a configured `reqwest::Client` for portal API access.
///
/// The client builds requests against a validated base URL and attaches the
/// stored bearer token to every path outside the public allow-list.
#[derive(Debug, Clone)]
pub struct SaccoClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
    public_paths: Vec<String>,
    tokens: Arc<dyn TokenStore>,
}

impl SaccoClient {
    /// Construct a client from configuration and a token store.
    pub fn new(config: &PortalConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(config.timeout())
            .build()
            .map_err(|error| ApiError::ClientBuild(error.to_string()))?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("sacco-portal/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
            public_paths: config.public_paths.clone(),
            tokens,
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and API-relative path.
    ///
    /// The bearer token is attached unless the path is public or no token is stored.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "building request");

        let mut builder = self
            .http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent);
        if !is_public_path(path, &self.public_paths)
            && let Some(token) = self.tokens.load()?
        {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Send a request and decode the (possibly enveloped) JSON response.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let mut builder = self.request(method.clone(), path)?;
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(|error| ApiError::Network(error.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| ApiError::Network(format!("failed to read response body: {}", error)))?;
        debug!(%method, path, status = status.as_u16(), "response received");

        if status == reqwest::StatusCode::UNAUTHORIZED && !is_public_path(path, &self.public_paths) {
            warn!(%method, path, "session expired; clearing stored token");
            if let Err(error) = self.tokens.clear() {
                warn!(%error, "failed to clear stored token");
            }
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), error_message(status.as_u16(), &text)));
        }
        decode_body(&text)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(Method::GET, path, None).await
    }

    pub(crate) async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|error| ApiError::Decode(format!("could not encode request: {}", error)))?;
        self.execute(method, path, Some(body)).await
    }

    /// Authenticate and store the returned session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let body = json!({ "username": username, "password": password });
        let response: Value = self.send(Method::POST, endpoints::AUTH_LOGIN, &body).await?;
        let token =
            extract_token(&response).ok_or_else(|| ApiError::Decode("login response did not include a token".into()))?;
        self.tokens.store(&token)?;
        info!(username, "signed in");
        Ok(())
    }

    /// Forget the stored session token.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.tokens.clear()?;
        info!("signed out");
        Ok(())
    }

    pub fn has_session(&self) -> Result<bool, ApiError> {
        Ok(self.tokens.load()?.is_some())
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
fn validate_base_url(base: &str) -> Result<(), ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };
    let parsed_base_url = Url::parse(base).map_err(|error| invalid(error.to_string()))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| invalid("base URL must include a host".into()))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed_base_url.scheme() != "https" {
        return Err(invalid(format!(
            "must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        )));
    }
    Ok(())
}

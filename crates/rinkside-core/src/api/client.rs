//! API client for the hosted backend.
//!
//! One `ApiClient` speaks to the three services a project exposes:
//! the REST data API (`/rest/v1`), the auth API (`/auth/v1`) and object
//! storage (`/storage/v1`). Data access goes through the `Store` trait.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::SessionData;
use crate::store::{ObjectStore, Query, Record, Store};

use super::{storage, ApiError};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const REST_PATH: &str = "/rest/v1";
const AUTH_PATH: &str = "/auth/v1";
const STORAGE_PATH: &str = "/storage/v1";

/// Ask the REST API to echo written rows back
const RETURN_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUser,
}

/// Sign-up answers with a session when email confirmation is off,
/// otherwise with the bare user object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

/// Result of registering a new account.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user_id: Uuid,
    /// Present when the account is usable immediately
    pub session: Option<SessionData>,
}

/// API client for the hosted backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for a project URL and its public API key
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            token: Some(token),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}{}/{}", self.base_url, REST_PATH, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}{}/{}", self.base_url, AUTH_PATH, path)
    }

    fn storage_url(&self, path: &str) -> String {
        format!("{}{}/{}", self.base_url, STORAGE_PATH, path)
    }

    /// Public URL for an object in a public bucket
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        self.storage_url(&format!("object/public/{}/{}", bucket, path))
    }

    /// Every request carries the project key; the bearer is the user's
    /// access token when signed in, otherwise the key itself.
    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert("apikey", header::HeaderValue::from_str(&self.api_key)?);
        let bearer = self.token.as_deref().unwrap_or(&self.api_key);
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", bearer))?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            // Rate limited - signal to retry
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a request, backing off and retrying when rate limited.
    /// `build` is called once per attempt.
    async fn execute<F>(&self, method: &Method, url: &str, build: F) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder + Send + Sync,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let request = self
                .client
                .request(method.clone(), url)
                .headers(self.auth_headers()?);
            let response = build(request)
                .send()
                .await
                .map_err(ApiError::NetworkError)
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response body", what))?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", what, e)).into())
    }

    // ===== Auth =====

    fn session_from(token: TokenResponse, fallback_email: &str) -> SessionData {
        SessionData {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user_id: token.user.id,
            email: token.user.email.unwrap_or_else(|| fallback_email.to_string()),
            expires_at: Utc::now() + chrono::Duration::seconds(token.expires_in),
        }
    }

    /// Sign in with email and password and return session data
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionData> {
        let url = self.auth_url("token?grant_type=password");
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self
            .execute(&Method::POST, &url, |req| req.json(&body))
            .await
            .context("Sign in failed")?;
        let token: TokenResponse = Self::parse_json(response, "sign in").await?;
        debug!(user_id = %token.user.id, "Signed in");
        Ok(Self::session_from(token, email))
    }

    /// Exchange a refresh token for a new session
    pub async fn refresh_session(&self, session: &SessionData) -> Result<SessionData> {
        let url = self.auth_url("token?grant_type=refresh_token");
        let body = serde_json::json!({ "refresh_token": session.refresh_token });

        let response = self
            .execute(&Method::POST, &url, |req| req.json(&body))
            .await
            .context("Session refresh failed")?;
        let token: TokenResponse = Self::parse_json(response, "refresh").await?;
        Ok(Self::session_from(token, &session.email))
    }

    /// Register a new account
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let url = self.auth_url("signup");
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self
            .execute(&Method::POST, &url, |req| req.json(&body))
            .await
            .context("Sign up failed")?;
        let parsed: SignUpResponse = Self::parse_json(response, "sign up").await?;
        Ok(match parsed {
            SignUpResponse::Session(token) => SignUpOutcome {
                user_id: token.user.id,
                session: Some(Self::session_from(token, email)),
            },
            SignUpResponse::User(user) => SignUpOutcome {
                user_id: user.id,
                session: None,
            },
        })
    }

    /// Revoke the current session server-side
    pub async fn sign_out(&self) -> Result<()> {
        if self.token.is_none() {
            return Ok(());
        }
        let url = self.auth_url("logout");
        self.execute(&Method::POST, &url, |req| req)
            .await
            .context("Sign out failed")?;
        Ok(())
    }
}

impl ObjectStore for ApiClient {
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        storage::check_image(content_type, bytes.len())?;
        let url = self.storage_url(&format!("object/{}/{}", bucket, path));

        self.execute(&Method::POST, &url, |req| {
            req.header(header::CONTENT_TYPE, content_type)
                .header("x-upsert", "true")
                .body(bytes.clone())
        })
        .await
        .with_context(|| format!("Failed to upload {} to bucket {}", path, bucket))?;

        debug!(bucket = bucket, path = path, "Uploaded object");
        Ok(self.public_url(bucket, path))
    }

    async fn remove_object(&self, bucket: &str, path: &str) -> Result<()> {
        let url = self.storage_url(&format!("object/{}", bucket));
        let body = serde_json::json!({ "prefixes": [path] });
        self.execute(&Method::DELETE, &url, |req| req.json(&body))
            .await
            .with_context(|| format!("Failed to remove {} from bucket {}", path, bucket))?;
        Ok(())
    }
}

impl Store for ApiClient {
    async fn select<T: Record>(&self, query: &Query) -> Result<Vec<T>> {
        let url = self.rest_url(T::TABLE);
        let params = query.to_params();
        let response = self
            .execute(&Method::GET, &url, |req| req.query(&params))
            .await
            .with_context(|| format!("Failed to fetch {}", T::TABLE))?;
        Self::parse_json(response, T::TABLE).await
    }

    async fn insert<T: Record, N: Serialize + Sync>(&self, rows: &[N]) -> Result<Vec<T>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.rest_url(T::TABLE);
        let response = self
            .execute(&Method::POST, &url, |req| {
                req.header("Prefer", RETURN_REPRESENTATION).json(rows)
            })
            .await
            .with_context(|| format!("Failed to insert into {}", T::TABLE))?;
        Self::parse_json(response, T::TABLE).await
    }

    async fn update<T: Record>(&self, query: &Query, patch: Value) -> Result<Vec<T>> {
        query.ensure_filtered(T::TABLE)?;
        let url = self.rest_url(T::TABLE);
        let params: Vec<(String, String)> = query.to_params();
        let response = self
            .execute(&Method::PATCH, &url, |req| {
                req.header("Prefer", RETURN_REPRESENTATION)
                    .query(&params)
                    .json(&patch)
            })
            .await
            .with_context(|| format!("Failed to update {}", T::TABLE))?;
        Self::parse_json(response, T::TABLE).await
    }

    async fn delete(&self, table: &'static str, query: &Query) -> Result<u64> {
        query.ensure_filtered(table)?;
        let url = self.rest_url(table);
        let params = query.to_params();
        let response = self
            .execute(&Method::DELETE, &url, |req| {
                req.header("Prefer", RETURN_REPRESENTATION).query(&params)
            })
            .await
            .with_context(|| format!("Failed to delete from {}", table))?;
        let removed: Vec<Value> = Self::parse_json(response, table).await?;
        debug!(table = table, count = removed.len(), "Deleted rows");
        Ok(removed.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = ApiClient::new("https://abcd.supabase.co/", "anon").unwrap();
        assert_eq!(client.rest_url("teams"), "https://abcd.supabase.co/rest/v1/teams");
        assert_eq!(
            client.auth_url("token?grant_type=password"),
            "https://abcd.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            client.public_url("media", "teams/1/logo.png"),
            "https://abcd.supabase.co/storage/v1/object/public/media/teams/1/logo.png"
        );
    }

    #[test]
    fn test_auth_headers_fall_back_to_key() {
        let client = ApiClient::new("https://abcd.supabase.co", "anon-key").unwrap();
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers.get("apikey").unwrap(), "anon-key");
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer anon-key");

        let signed_in = client.with_token("user-token".to_string());
        let headers = signed_in.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer user-token");
        assert!(signed_in.has_token());
    }

    #[test]
    fn test_parse_token_response() {
        let json = r#"{"access_token":"jwt","token_type":"bearer","expires_in":3600,"expires_at":1760000000,"refresh_token":"r1","user":{"id":"22b210e3-d325-41be-b761-31e18bfe2c73","email":"coach@rinkside.app","role":"authenticated"}}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        let session = ApiClient::session_from(token, "fallback@example.com");
        assert_eq!(session.email, "coach@rinkside.app");
        assert_eq!(session.refresh_token, "r1");
        assert!(!session.is_expired());
        assert!(session.minutes_until_expiry() >= 59);
    }

    #[test]
    fn test_parse_sign_up_variants() {
        let pending = r#"{"id":"22b210e3-d325-41be-b761-31e18bfe2c73","email":"new@rinkside.app","confirmation_sent_at":"2025-09-01T00:00:00Z"}"#;
        assert!(matches!(
            serde_json::from_str::<SignUpResponse>(pending).unwrap(),
            SignUpResponse::User(_)
        ));

        let immediate = r#"{"access_token":"jwt","expires_in":3600,"refresh_token":"r","user":{"id":"22b210e3-d325-41be-b761-31e18bfe2c73","email":"new@rinkside.app"}}"#;
        assert!(matches!(
            serde_json::from_str::<SignUpResponse>(immediate).unwrap(),
            SignUpResponse::Session(_)
        ));
    }
}

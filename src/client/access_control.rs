//! Access Control REST client implementation

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use super::AccessControlApi;
use super::models::{
    AccessToken, AuthenticationProvider, CreateTeamRequest, CreateUserRequest, DirectoryEntry,
    LdapServer, MembershipRequest, RemoteTeam, RemoteUser, Role, UpdateTeamRequest,
    UpdateUserRequest,
};
use crate::config::Credentials;
use crate::error::{ApiError, Result};

/// Path of the Access Control API below the server URL
const API_PATH: &str = "/cxrestapi/auth";

/// Client-side request rate
const RATE_LIMIT_PER_SECOND: u32 = 10;

/// Access Control REST client
pub struct AccessControlClient {
    http: HttpClient,
    base_url: String,
    credentials: Credentials,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl AccessControlClient {
    /// Create a new client. No request is made until the first call.
    pub fn new(credentials: Credentials) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(credentials.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let quota = Quota::per_second(
            NonZeroU32::new(RATE_LIMIT_PER_SECOND).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            http,
            base_url: format!("{}{}", credentials.base_url, API_PATH),
            credentials,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Request a token with the password grant.
    pub async fn authenticate(&self) -> Result<AccessToken> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        self.rate_limiter.until_ready().await;
        debug!("Requesting access token for {}", self.credentials.username);

        let url = format!("{}/identity/connect/token", self.base_url);
        let oauth = &self.credentials.oauth;
        let form = [
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
            ("grant_type", "password"),
            ("scope", oauth.scope.as_str()),
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
        ];
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
            return Err(ApiError::Unauthorized.into());
        }
        if !status.is_success() {
            return Err(ApiError::ServerError(format!("Token request failed: {}", status)).into());
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse token response: {}", e))
        })?;

        Ok(AccessToken {
            token: body.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(body.expires_in),
        })
    }

    /// Current token, refreshed when missing or about to expire.
    async fn valid_token(&self) -> Result<String> {
        let fresh = {
            let state = self.token.read().await;
            state
                .as_ref()
                .filter(|t| !t.expires_within(chrono::Duration::minutes(1)))
                .map(|t| t.token.clone())
        };
        match fresh {
            Some(token) => Ok(token),
            None => self.refresh_token().await,
        }
    }

    async fn refresh_token(&self) -> Result<String> {
        let token = self.authenticate().await?;
        let value = token.token.clone();
        *self.token.write().await = Some(token);
        Ok(value)
    }

    /// Send an authenticated request, retrying once with a new token on 401.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut token = self.valid_token().await?;

        for attempt in 0..2 {
            self.rate_limiter.until_ready().await;
            debug!("{} {}", method, url);

            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&token)
                .header("Accept", "application/json");
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = &body {
                request = request.json(body);
            }
            let response = request.send().await.map_err(ApiError::from)?;

            if response.status() == StatusCode::UNAUTHORIZED && attempt == 0 {
                debug!("Token rejected, re-authenticating");
                token = self.refresh_token().await?;
                continue;
            }
            return check_status(response).await;
        }
        Err(ApiError::Unauthorized.into())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_with_query(path, &[]).await
    }

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.send(Method::GET, path, query, None).await?;
        let data = response.json::<T>().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;
        Ok(data)
    }

    async fn write<B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let body = body.map(serde_json::to_value).transpose()?;
        self.send(method, path, &[], body).await
    }
}

/// Map an HTTP status to the matching API error.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized.into()),
        StatusCode::FORBIDDEN => Err(ApiError::Forbidden.into()),
        StatusCode::NOT_FOUND => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Resource not found".to_string());
            Err(ApiError::NotFound(error_msg).into())
        }
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            Err(ApiError::RateLimit(Duration::from_secs(retry_after)).into())
        }
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Bad request".to_string());
            Err(ApiError::BadRequest(error_msg).into())
        }
        status if status.is_server_error() => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| format!("Server error: {}", status));
            Err(ApiError::ServerError(error_msg).into())
        }
        _ => Err(ApiError::InvalidResponse(format!("Unexpected status code: {}", status)).into()),
    }
}

/// Id of a created resource, from the `Location` header or an `{"id": n}` body.
async fn created_id(response: Response) -> Result<u64> {
    #[derive(Deserialize)]
    struct Created {
        id: u64,
    }

    let from_location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim_end_matches('/').rsplit('/').next())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(id) = from_location {
        return Ok(id);
    }

    let text = response
        .text()
        .await
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to read response: {}", e)))?;
    serde_json::from_str::<Created>(&text)
        .map(|c| c.id)
        .map_err(|_| {
            ApiError::InvalidResponse(format!("No id for created resource. Body was: {}", text))
                .into()
        })
}

#[async_trait]
impl AccessControlApi for AccessControlClient {
    async fn list_teams(&self) -> Result<Vec<RemoteTeam>> {
        self.get("/Teams").await
    }

    async fn list_users(&self) -> Result<Vec<RemoteUser>> {
        self.get("/Users").await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.get("/Roles").await
    }

    async fn list_authentication_providers(&self) -> Result<Vec<AuthenticationProvider>> {
        self.get("/AuthenticationProviders").await
    }

    async fn list_ldap_servers(&self) -> Result<Vec<LdapServer>> {
        self.get("/LDAPServers").await
    }

    async fn search_ldap_user_entries(
        &self,
        ldap_server_id: u64,
        username: &str,
    ) -> Result<Vec<DirectoryEntry>> {
        let path = format!("/LDAPServers/{}/UserEntries", ldap_server_id);
        self.get_with_query(&path, &[("userNameContainsPattern", username)])
            .await
    }

    async fn create_team(&self, parent_id: u64, name: &str) -> Result<u64> {
        let request = CreateTeamRequest {
            name: name.to_string(),
            parent_id,
        };
        let response = self.write(Method::POST, "/Teams", Some(&request)).await?;
        created_id(response).await
    }

    async fn update_team(&self, id: u64, name: &str, parent_id: u64) -> Result<()> {
        let request = UpdateTeamRequest {
            name: name.to_string(),
            parent_id,
        };
        let path = format!("/Teams/{}", id);
        self.write(Method::PUT, &path, Some(&request)).await?;
        Ok(())
    }

    async fn delete_team(&self, id: u64) -> Result<()> {
        let path = format!("/Teams/{}", id);
        self.send(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }

    async fn create_user(&self, request: CreateUserRequest) -> Result<u64> {
        let response = self.write(Method::POST, "/Users", Some(&request)).await?;
        created_id(response).await
    }

    async fn update_user(&self, id: u64, request: UpdateUserRequest) -> Result<()> {
        let path = format!("/Users/{}", id);
        self.write(Method::PUT, &path, Some(&request)).await?;
        Ok(())
    }

    async fn delete_user(&self, id: u64) -> Result<()> {
        let path = format!("/Users/{}", id);
        self.send(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }

    async fn set_team_membership(
        &self,
        team_id: u64,
        user_id: u64,
        role_ids: Vec<u64>,
    ) -> Result<()> {
        let path = format!("/Teams/{}/Users/{}", team_id, user_id);
        let request = MembershipRequest { role_ids };
        self.write(Method::PUT, &path, Some(&request)).await?;
        Ok(())
    }

    async fn remove_team_membership(&self, team_id: u64, user_id: u64) -> Result<()> {
        let path = format!("/Teams/{}/Users/{}", team_id, user_id);
        self.send(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }
}

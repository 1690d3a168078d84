use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use super::{AppError, AppErrorType};

/// JSON request/response wrapper around one hosted REST endpoint
/// (PostgREST or GoTrue). Every request carries the `apikey` header and a
/// bearer token: the caller's session token when one is attached, the API key
/// otherwise.
#[derive(Clone)]
pub struct RestHelper {
    client: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
    bearer: Option<Secret<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Remote responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl RestError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RestError::Status { status, .. } => Some(*status),
            RestError::Transport(e) => e.status(),
        }
    }
}

impl From<RestError> for AppError {
    fn from(error: RestError) -> Self {
        match error {
            RestError::Transport(e) => AppError::from(e),
            RestError::Status { status, body } if status == StatusCode::NOT_FOUND => AppError {
                error_type: AppErrorType::NotFoundError,
                message: None,
                cause: Some(body),
            },
            RestError::Status { status, body }
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                AppError {
                    error_type: AppErrorType::AuthError,
                    message: Some("The session is not allowed to perform this request".to_string()),
                    cause: Some(body),
                }
            }
            RestError::Status { status, body } => AppError {
                error_type: AppErrorType::RemoteError,
                message: Some(format!("Remote store rejected the request ({})", status)),
                cause: Some(body),
            },
        }
    }
}

impl RestHelper {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: Secret::new(api_key.to_string()),
            bearer: None,
        })
    }

    /// A copy of this helper that authenticates as the given session.
    pub fn with_bearer(&self, access_token: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            bearer: Some(Secret::new(access_token.to_string())),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, query: &[(&str, String)]) -> RequestBuilder {
        let token = self
            .bearer
            .as_ref()
            .unwrap_or(&self.api_key)
            .expose_secret();

        self.client
            .request(method, format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .query(query)
            .header("apikey", self.api_key.expose_secret())
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::ACCEPT, "application/json")
    }

    async fn send(builder: RequestBuilder) -> Result<Response, RestError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, body = %body, "remote request failed");
        Err(RestError::Status { status, body })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, RestError> {
        let response = Self::send(self.request(Method::GET, path, query)).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, RestError> {
        let builder = self
            .request(Method::POST, path, query)
            .header("Prefer", "return=representation")
            .json(body);
        let response = Self::send(builder).await?;
        Ok(response.json::<T>().await?)
    }

    /// POST that ignores the response body.
    pub async fn post_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), RestError> {
        Self::send(self.request(Method::POST, path, &[]).json(body)).await?;
        Ok(())
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, RestError> {
        let builder = self
            .request(Method::PATCH, path, query)
            .header("Prefer", "return=representation")
            .json(body);
        let response = Self::send(builder).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<(), RestError> {
        Self::send(self.request(Method::DELETE, path, query)).await?;
        Ok(())
    }
}

/// PostgREST equality filter value, e.g. `eq.S1`.
pub fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

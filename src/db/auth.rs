use reqwest::StatusCode;
use secrecy::ExposeSecret;

use crate::core::config::SupabaseConfig;
use crate::core::rest_helper::{eq, RestError};
use crate::core::{AppError, RestHelper};
use crate::db::AuthGateway;
use crate::models::auth::{AuthSession, SignInRequest};
use crate::models::users::UserProfile;

#[derive(Clone)]
pub struct RemoteAuth {
    identity: RestHelper,
    rest: RestHelper,
}

impl RemoteAuth {
    pub fn new(config: &SupabaseConfig) -> Result<Self, AppError> {
        let anon_key = config.anon_key.expose_secret();
        Ok(Self {
            identity: RestHelper::new(&config.auth_url(), anon_key, config.request_timeout())?,
            rest: RestHelper::new(&config.rest_url(), anon_key, config.request_timeout())?,
        })
    }

    pub fn from_helpers(identity: RestHelper, rest: RestHelper) -> Self {
        Self { identity, rest }
    }
}

impl AuthGateway for RemoteAuth {
    #[tracing::instrument(name = "Sign in", skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let request = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.identity
            .post("token", &[("grant_type", "password".into())], &request)
            .await
            .map_err(|e| match e.status() {
                Some(StatusCode::BAD_REQUEST)
                | Some(StatusCode::UNAUTHORIZED)
                | Some(StatusCode::UNPROCESSABLE_ENTITY) => {
                    AppError::unauthorized("Email or password is incorrect")
                }
                _ => AppError::from(e),
            })
    }

    #[tracing::instrument(name = "Sign out", skip(self, access_token))]
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        self.identity
            .with_bearer(access_token)
            .post_empty("logout", &serde_json::json!({}))
            .await
            .map_err(|e: RestError| AppError::from(e))
    }

    #[tracing::instrument(name = "Fetch own profile", skip(self, session), fields(user_id = %session.user.id))]
    async fn fetch_profile(&self, session: &AuthSession) -> Result<UserProfile, AppError> {
        let mut rows: Vec<UserProfile> = self
            .rest
            .with_bearer(&session.access_token)
            .get(
                "user_profiles",
                &[("select", "*".into()), ("id", eq(&session.user.id))],
            )
            .await?;
        rows.pop()
            .ok_or_else(|| AppError::not_found("No profile exists for this account"))
    }
}

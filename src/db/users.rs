use secrecy::ExposeSecret;
use serde::Serialize;

use crate::core::config::SupabaseConfig;
use crate::core::rest_helper::eq;
use crate::core::{AppError, RestHelper};
use crate::db::UserDirectory;
use crate::models::auth::{
    AdminCreateUserRequest, AdminUserList, AuthUser, SignUpRequest, SignUpResponse, UserMetadata,
};
use crate::models::users::UserProfile;

const USER_PROFILES: &str = "user_profiles";

/// `user_profiles` table plus the identity service's account endpoints.
#[derive(Clone)]
pub struct RemoteUserDirectory {
    rest: RestHelper,
    identity: RestHelper,
    admin: RestHelper,
}

impl RemoteUserDirectory {
    /// Profile calls authenticate as the signed-in admin.
    pub fn for_session(config: &SupabaseConfig, access_token: &str) -> Result<Self, AppError> {
        let timeout = config.request_timeout();
        let anon_key = config.anon_key.expose_secret();
        Ok(Self {
            rest: RestHelper::new(&config.rest_url(), anon_key, timeout)?.with_bearer(access_token),
            identity: RestHelper::new(&config.auth_url(), anon_key, timeout)?,
            admin: RestHelper::new(&config.auth_url(), config.admin_key(), timeout)?,
        })
    }

    /// Every call authenticates with the service role key. Used by the
    /// bootstrap endpoint, where nobody is signed in yet.
    pub fn service(config: &SupabaseConfig) -> Result<Self, AppError> {
        let timeout = config.request_timeout();
        Ok(Self {
            rest: RestHelper::new(&config.rest_url(), config.admin_key(), timeout)?,
            identity: RestHelper::new(
                &config.auth_url(),
                config.anon_key.expose_secret(),
                timeout,
            )?,
            admin: RestHelper::new(&config.auth_url(), config.admin_key(), timeout)?,
        })
    }

    pub fn from_helpers(rest: RestHelper, identity: RestHelper, admin: RestHelper) -> Self {
        Self {
            rest,
            identity,
            admin,
        }
    }

    #[tracing::instrument(name = "List identities", skip(self))]
    pub async fn list_identities(&self) -> Result<Vec<AuthUser>, AppError> {
        let list: AdminUserList = self.admin.get("admin/users", &[]).await?;
        Ok(list.users)
    }

    /// Creates an already-confirmed account through the admin API.
    #[tracing::instrument(name = "Create confirmed identity", skip(self, password))]
    pub async fn create_confirmed_identity(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthUser, AppError> {
        let request = AdminCreateUserRequest {
            email,
            password,
            email_confirm: true,
            user_metadata: UserMetadata {
                full_name: full_name.to_string(),
            },
        };
        let user: AuthUser = self.admin.post("admin/users", &[], &request).await?;
        Ok(user)
    }
}

impl UserDirectory for RemoteUserDirectory {
    #[tracing::instrument(name = "Fetch user profiles", skip(self))]
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        let profiles: Vec<UserProfile> = self
            .rest
            .get(
                USER_PROFILES,
                &[("select", "*".into()), ("order", "created_at.desc".into())],
            )
            .await?;
        Ok(profiles)
    }

    #[tracing::instrument(name = "Update user profile", skip(self, patch))]
    async fn update_profile<P: Serialize + Sync>(
        &self,
        id: &str,
        patch: &P,
    ) -> Result<(), AppError> {
        let rows: Vec<UserProfile> = self
            .rest
            .patch(USER_PROFILES, &[("id", eq(id))], patch)
            .await?;
        if rows.is_empty() {
            return Err(AppError::not_found(format!("User profile {} was not found", id)));
        }
        Ok(())
    }

    #[tracing::instrument(name = "Create identity", skip(self, password))]
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthUser, AppError> {
        let request = SignUpRequest {
            email,
            password,
            data: UserMetadata {
                full_name: full_name.to_string(),
            },
        };
        let response: SignUpResponse = self.identity.post("signup", &[], &request).await?;
        Ok(response.user())
    }

    #[tracing::instrument(name = "Delete identity", skip(self))]
    async fn delete_identity(&self, id: &str) -> Result<(), AppError> {
        self.admin.delete(&format!("admin/users/{}", id), &[]).await?;
        Ok(())
    }
}

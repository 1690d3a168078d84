use secrecy::{ExposeSecret, Secret};
use validator::Validate;

use crate::core::{AppError, AppErrorType};
use crate::db::AuthGateway;
use crate::models::auth::SignInRequest;
use crate::models::users::{Permissions, Role, UserProfile};

/// What a session wants to do with the student records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Add,
    Edit,
    Delete,
}

impl Action {
    fn denial(&self) -> &'static str {
        match self {
            Action::View => "You do not have permission to view students",
            Action::Add => "You do not have permission to add students",
            Action::Edit => "You do not have permission to edit students",
            Action::Delete => "You do not have permission to delete students",
        }
    }
}

/// The authenticated caller, handed to controllers when they are built.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    permissions: Permissions,
    access_token: Secret<String>,
}

impl SessionContext {
    pub fn new(profile: &UserProfile, access_token: &str) -> Self {
        SessionContext {
            user_id: profile.id.clone(),
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            role: profile.role,
            permissions: profile.permissions,
            access_token: Secret::new(access_token.to_string()),
        }
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Stored flags for users; everything for admins.
    pub fn permissions(&self) -> Permissions {
        self.permissions.effective_for(self.role)
    }

    pub fn can_view(&self) -> bool {
        self.permissions().can_view
    }

    pub fn can_add(&self) -> bool {
        self.permissions().can_add
    }

    pub fn can_edit(&self) -> bool {
        self.permissions().can_edit
    }

    pub fn can_delete(&self) -> bool {
        self.permissions().can_delete
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.can_view(),
            Action::Add => self.can_add(),
            Action::Edit => self.can_edit(),
            Action::Delete => self.can_delete(),
        }
    }

    pub fn authorize(&self, action: Action) -> Result<(), AppError> {
        if self.allows(action) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, ?action, "permission denied");
            Err(AppError::forbidden_error(action.denial()))
        }
    }

    pub fn authorize_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, "admin-only action denied");
            Err(AppError::forbidden_error("Only administrators can manage users"))
        }
    }
}

/// Signs users in and out against the identity service and holds the
/// current session.
pub struct SessionProvider<A: AuthGateway> {
    auth: A,
    current: Option<SessionContext>,
}

impl<A: AuthGateway> SessionProvider<A> {
    pub fn new(auth: A) -> Self {
        Self {
            auth,
            current: None,
        }
    }

    #[tracing::instrument(name = "Session sign in", skip(self, password))]
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&SessionContext, AppError> {
        SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
        .validate()?;

        let session = self.auth.sign_in(email.trim(), password).await?;

        let profile = match self.auth.fetch_profile(&session).await {
            Ok(profile) => profile,
            Err(e) => {
                self.invalidate_remote(&session.access_token).await;
                if e.error_type == AppErrorType::NotFoundError {
                    return Err(AppError::unauthorized("No profile exists for this account"));
                }
                return Err(e);
            }
        };

        if !profile.is_active {
            self.invalidate_remote(&session.access_token).await;
            return Err(AppError::unauthorized("This account has been deactivated"));
        }

        // A previous session's token is invalidated before it is replaced.
        self.sign_out().await;

        tracing::info!(user_id = %profile.id, role = %profile.role, "signed in");
        Ok(&*self
            .current
            .insert(SessionContext::new(&profile, &session.access_token)))
    }

    /// Clears the local session; remote invalidation is best-effort.
    #[tracing::instrument(name = "Session sign out", skip(self))]
    pub async fn sign_out(&mut self) {
        if let Some(session) = self.current.take() {
            self.invalidate_remote(session.access_token()).await;
        }
    }

    async fn invalidate_remote(&self, access_token: &str) {
        if let Err(e) = self.auth.sign_out(access_token).await {
            tracing::warn!(error.message = %e.message(), "remote sign out failed");
        }
    }

    pub fn current_user(&self) -> Option<&SessionContext> {
        self.current.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.current.as_ref().map(|s| s.role)
    }

    pub fn is_admin(&self) -> bool {
        self.current.as_ref().map_or(false, SessionContext::is_admin)
    }

    pub fn can_view(&self) -> bool {
        self.current.as_ref().map_or(false, SessionContext::can_view)
    }

    pub fn can_add(&self) -> bool {
        self.current.as_ref().map_or(false, SessionContext::can_add)
    }

    pub fn can_edit(&self) -> bool {
        self.current.as_ref().map_or(false, SessionContext::can_edit)
    }

    pub fn can_delete(&self) -> bool {
        self.current.as_ref().map_or(false, SessionContext::can_delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: Role, permissions: Permissions) -> SessionContext {
        SessionContext::new(
            &UserProfile {
                id: "u1".into(),
                email: "u1@example.com".into(),
                full_name: "User One".into(),
                role,
                permissions,
                is_active: true,
                created_at: None,
            },
            "token",
        )
    }

    #[test]
    fn user_predicates_mirror_stored_flags() {
        let session = context(
            Role::User,
            Permissions {
                can_view: true,
                can_add: false,
                can_edit: true,
                can_delete: false,
            },
        );
        assert!(session.can_view());
        assert!(!session.can_add());
        assert!(session.can_edit());
        assert!(!session.can_delete());
    }

    #[test]
    fn admin_predicates_ignore_stored_flags() {
        let session = context(Role::Admin, Permissions::default());
        assert!(session.can_view() && session.can_add() && session.can_edit() && session.can_delete());
    }

    #[test]
    fn denied_action_is_a_permission_error() {
        let session = context(Role::User, Permissions::view_only());
        let error = session.authorize(Action::Delete).unwrap_err();
        assert!(error.is_permission_error());
        assert!(session.authorize(Action::View).is_ok());
    }

    #[test]
    fn access_token_is_not_printed() {
        let session = context(Role::User, Permissions::default());
        assert!(!format!("{:?}", session).contains("\"token\""));
        assert_eq!(session.access_token(), "token");
    }
}

use validator::Validate;

use crate::controllers::session::SessionContext;
use crate::core::{AppError, AppErrorType};
use crate::db::UserDirectory;
use crate::models::users::{ActiveFlagUpdate, NewUser, ProfileGrant, UserProfile, UserProfileUpdate};

/// Token from [`UserManagementController::request_delete`].
#[derive(Debug, PartialEq, Eq)]
pub struct PendingUserDelete {
    id: String,
}

impl PendingUserDelete {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Admin-only management of user profiles and their identities.
pub struct UserManagementController<U: UserDirectory> {
    directory: U,
    session: SessionContext,
    users: Vec<UserProfile>,
    loading: bool,
    selected_for_edit: Option<UserProfile>,
    form_open: bool,
    pending_delete: Option<String>,
}

impl<U: UserDirectory> UserManagementController<U> {
    pub fn new(directory: U, session: SessionContext) -> Self {
        Self {
            directory,
            session,
            users: Vec::new(),
            loading: true,
            selected_for_edit: None,
            form_open: false,
            pending_delete: None,
        }
    }

    pub fn users(&self) -> &[UserProfile] {
        &self.users
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn selected_for_edit(&self) -> Option<&UserProfile> {
        self.selected_for_edit.as_ref()
    }

    pub fn is_form_open(&self) -> bool {
        self.form_open
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Whether the signed-in admin may toggle or delete `user`.
    pub fn can_modify_account(&self, user: &UserProfile) -> bool {
        self.session.is_admin() && user.id != self.session.user_id
    }

    fn guard_self(&self, id: &str, action: &str) -> Result<(), AppError> {
        if id == self.session.user_id {
            tracing::warn!(user_id = %id, action, "refused action on own account");
            return Err(AppError::forbidden_error(format!(
                "You cannot {} your own account",
                action
            )));
        }
        Ok(())
    }

    #[tracing::instrument(name = "Refresh users", skip(self), fields(user_id = %self.session.user_id))]
    pub async fn refresh(&mut self) -> Result<(), AppError> {
        if let Err(e) = self.session.authorize_admin() {
            self.loading = false;
            return Err(e);
        }

        self.loading = true;
        let result = self.directory.list_profiles().await;
        self.loading = false;

        match result {
            Ok(users) => {
                self.users = users;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error.message = %e.message(), "Failed to fetch users; keeping the previous list");
                Err(e)
            }
        }
    }

    async fn refresh_after_mutation(&mut self) {
        if self.refresh().await.is_err() {
            tracing::warn!("user list is stale until the next successful refresh");
        }
    }

    pub fn open_create_form(&mut self) -> Result<(), AppError> {
        self.session.authorize_admin()?;
        self.selected_for_edit = None;
        self.form_open = true;
        Ok(())
    }

    pub fn open_edit_form(&mut self, user: &UserProfile) -> Result<UserProfileUpdate, AppError> {
        self.session.authorize_admin()?;
        self.selected_for_edit = Some(user.clone());
        self.form_open = true;
        Ok(UserProfileUpdate::from(user))
    }

    pub fn close_form(&mut self) {
        self.form_open = false;
        self.selected_for_edit = None;
    }

    /// Provisions the identity, then grants role and permissions on the new
    /// profile. A failed grant deletes the fresh identity again; if that
    /// also fails the error is `PartiallyCreated`.
    #[tracing::instrument(name = "Create user", skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create(&mut self, new_user: NewUser) -> Result<String, AppError> {
        self.session.authorize_admin()?;
        new_user.validate()?;

        self.loading = true;
        let result = self.provision(&new_user).await;
        self.loading = false;

        let user_id = result?;
        tracing::info!(%user_id, "user created");

        self.refresh_after_mutation().await;
        self.close_form();
        Ok(user_id)
    }

    async fn provision(&self, new_user: &NewUser) -> Result<String, AppError> {
        let identity = self
            .directory
            .create_identity(&new_user.email, &new_user.password, &new_user.full_name)
            .await
            .map_err(|e| {
                tracing::error!(error.message = %e.message(), "Failed to create identity");
                e
            })?;

        let grant = ProfileGrant {
            role: new_user.role,
            permissions: new_user.permissions,
        };
        let grant_error = match self.directory.update_profile(&identity.id, &grant).await {
            Ok(()) => return Ok(identity.id),
            Err(e) => e,
        };

        tracing::error!(
            user_id = %identity.id,
            error.message = %grant_error.message(),
            "Failed to grant permissions; rolling back the identity"
        );
        match self.directory.delete_identity(&identity.id).await {
            Ok(()) => Err(grant_error),
            Err(rollback_error) => {
                tracing::error!(
                    user_id = %identity.id,
                    error.message = %rollback_error.message(),
                    "Rollback failed; account exists without its permissions"
                );
                Err(AppError {
                    message: Some(format!(
                        "The account {} was created but its permissions could not be saved",
                        new_user.email
                    )),
                    cause: grant_error.cause,
                    error_type: AppErrorType::PartiallyCreated {
                        user_id: identity.id,
                    },
                })
            }
        }
    }

    #[tracing::instrument(name = "Update user", skip(self, update))]
    pub async fn update(&mut self, id: &str, update: UserProfileUpdate) -> Result<(), AppError> {
        self.session.authorize_admin()?;
        update.validate()?;

        self.loading = true;
        let result = self.directory.update_profile(id, &update).await;
        self.loading = false;

        result.map_err(|e| {
            tracing::error!(error.message = %e.message(), "Failed to update user");
            e
        })?;

        self.refresh_after_mutation().await;
        self.close_form();
        Ok(())
    }

    /// Submits the open form: update when it was opened on a user, create otherwise.
    pub async fn submit_form(
        &mut self,
        new_user: NewUser,
    ) -> Result<String, AppError> {
        match self.selected_for_edit.as_ref().map(|u| u.id.clone()) {
            Some(id) => {
                let update = UserProfileUpdate {
                    full_name: new_user.full_name,
                    role: new_user.role,
                    permissions: new_user.permissions,
                };
                self.update(&id, update).await?;
                Ok(id)
            }
            None => self.create(new_user).await,
        }
    }

    /// Flips the soft-deactivation flag of another user.
    #[tracing::instrument(name = "Toggle user active flag", skip(self))]
    pub async fn toggle_active(&mut self, id: &str) -> Result<bool, AppError> {
        self.session.authorize_admin()?;
        self.guard_self(id, "deactivate")?;

        let current = self
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.is_active)
            .ok_or_else(|| AppError::not_found(format!("User {} is not loaded", id)))?;
        let patch = ActiveFlagUpdate {
            is_active: !current,
        };

        self.loading = true;
        let result = self.directory.update_profile(id, &patch).await;
        self.loading = false;

        result.map_err(|e| {
            tracing::error!(error.message = %e.message(), "Failed to toggle user");
            e
        })?;

        self.refresh_after_mutation().await;
        Ok(patch.is_active)
    }

    #[tracing::instrument(name = "Request user deletion", skip(self))]
    pub fn request_delete(&mut self, id: &str) -> Result<PendingUserDelete, AppError> {
        self.session.authorize_admin()?;
        self.guard_self(id, "delete")?;
        self.pending_delete = Some(id.to_string());
        Ok(PendingUserDelete { id: id.to_string() })
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Hard delete through the identity service. Irreversible.
    #[tracing::instrument(name = "Confirm user deletion", skip(self), fields(target = %pending.id))]
    pub async fn confirm_delete(&mut self, pending: PendingUserDelete) -> Result<(), AppError> {
        self.session.authorize_admin()?;
        self.guard_self(&pending.id, "delete")?;
        if self.pending_delete.as_deref() != Some(pending.id.as_str()) {
            return Err(AppError::validation_error(
                "No deletion is awaiting confirmation for this user",
            ));
        }
        self.pending_delete = None;

        self.loading = true;
        let result = self.directory.delete_identity(&pending.id).await;
        self.loading = false;

        result.map_err(|e| {
            tracing::error!(error.message = %e.message(), "Failed to delete user");
            e
        })?;

        self.refresh_after_mutation().await;
        Ok(())
    }
}

//! Clients for the hosted store and identity service.
//!
//! Controllers are generic over the traits below so that a session's
//! credentials are bound once, at construction, and tests can point the
//! remote implementations at a mock server.

pub mod auth;
pub mod students;
pub mod users;

use serde::Serialize;

use crate::core::AppError;
use crate::models::auth::{AuthSession, AuthUser};
use crate::models::students::{Student, StudentDraft, StudentUpdate};
use crate::models::users::UserProfile;

pub use auth::RemoteAuth;
pub use students::RemoteStudentStore;
pub use users::RemoteUserDirectory;

#[allow(async_fn_in_trait)]
pub trait StudentStore {
    /// All students, newest first.
    async fn list_students(&self) -> Result<Vec<Student>, AppError>;
    async fn get_student(&self, id: &str) -> Result<Student, AppError>;
    async fn insert_student(&self, draft: &StudentDraft) -> Result<Student, AppError>;
    async fn update_student(&self, id: &str, update: &StudentUpdate<'_>)
        -> Result<Student, AppError>;
    async fn delete_student(&self, id: &str) -> Result<(), AppError>;
}

#[allow(async_fn_in_trait)]
pub trait UserDirectory {
    /// All profiles, newest first.
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError>;
    async fn update_profile<P: Serialize + Sync>(&self, id: &str, patch: &P)
        -> Result<(), AppError>;
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthUser, AppError>;
    async fn delete_identity(&self, id: &str) -> Result<(), AppError>;
}

#[allow(async_fn_in_trait)]
pub trait AuthGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
    async fn fetch_profile(&self, session: &AuthSession) -> Result<UserProfile, AppError>;
}

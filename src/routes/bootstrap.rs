use actix_web::{post, web, HttpResponse};
use secrecy::ExposeSecret;

use crate::core::config::BootstrapAdminConfig;
use crate::core::AppError;
use crate::db::{RemoteUserDirectory, UserDirectory};
use crate::models::auth::{BootstrapResponse, Credentials};
use crate::models::users::{AdminProfilePatch, Role};

/// One-shot creation of the default admin. Refuses once any account exists.
#[tracing::instrument(name = "Create default admin", skip(directory, admin))]
#[post("/create-admin")]
pub async fn create_admin(
    directory: web::Data<RemoteUserDirectory>,
    admin: web::Data<BootstrapAdminConfig>,
) -> Result<HttpResponse, AppError> {
    let existing = directory.list_identities().await?;
    if !existing.is_empty() {
        tracing::info!(accounts = existing.len(), "bootstrap refused; accounts already exist");
        return Ok(HttpResponse::Ok().json(BootstrapResponse {
            success: false,
            message: "An account already exists; the default admin was not created".to_string(),
            email: Some(admin.email.clone()),
            credentials: None,
        }));
    }

    let user = directory
        .create_confirmed_identity(&admin.email, admin.password.expose_secret(), &admin.full_name)
        .await?;

    let patch = AdminProfilePatch {
        role: Role::Admin,
        full_name: admin.full_name.clone(),
        is_active: true,
    };
    directory.update_profile(&user.id, &patch).await?;

    tracing::warn!(
        user_id = %user.id,
        "default admin created with well-known credentials; change the password after the first sign-in"
    );

    Ok(HttpResponse::Ok().json(BootstrapResponse {
        success: true,
        message: "Admin account created successfully".to_string(),
        email: None,
        credentials: Some(Credentials {
            email: admin.email.clone(),
            password: admin.password.expose_secret().clone(),
        }),
    }))
}

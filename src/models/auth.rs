use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// A user as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token grant returned by a successful password sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMetadata {
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: UserMetadata,
}

/// Sign-up answers with a session when auto-confirm is on, with the bare
/// user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(AuthSession),
    User(AuthUser),
}

impl SignUpResponse {
    pub fn user(self) -> AuthUser {
        match self {
            SignUpResponse::Session(session) => session.user,
            SignUpResponse::User(user) => user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminCreateUserRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub email_confirm: bool,
    pub user_metadata: UserMetadata,
}

#[derive(Debug, Deserialize)]
pub struct AdminUserList {
    #[serde(default)]
    pub users: Vec<AuthUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BootstrapResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_response_accepts_both_shapes() {
        let with_session = r#"{"access_token":"t","user":{"id":"u1","email":"a@b.co"}}"#;
        let bare_user = r#"{"id":"u2","email":"c@d.co","aud":"authenticated"}"#;

        let first: SignUpResponse = serde_json::from_str(with_session).unwrap();
        let second: SignUpResponse = serde_json::from_str(bare_user).unwrap();

        assert_eq!(first.user().id, "u1");
        assert_eq!(second.user().id, "u2");
    }
}

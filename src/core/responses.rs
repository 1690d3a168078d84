use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use anyhow::Error;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum AppErrorType {
    NotFoundError,
    RemoteError,
    AuthError,
    JsonDeserializationError,
    PayloadValidationError,
    InternalServerError,
    ForbiddenError,
    PartiallyCreated { user_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppError {
    pub error_type: AppErrorType,
    pub message: Option<String>,
    pub cause: Option<String>,
}

/// Where the presentation layer should show an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSurface {
    /// Next to the input that triggered it (bad credentials, invalid form).
    Inline,
    /// A blocking alert; the action is aborted.
    BlockingAlert,
    /// Logged only; the pending transition is aborted and the view keeps its state.
    Logged,
}

#[derive(Serialize)]
pub struct AppErrorResponse {
    pub success: bool,
    pub message: String,
}

impl AppError {
    pub fn message(&self) -> String {
        match self {
            AppError {
                message: Some(message),
                ..
            } => message.clone(),

            AppError {
                message: None,
                error_type: AppErrorType::NotFoundError,
                ..
            } => "The requested item was not found".to_string(),
            AppError {
                message: None,
                error_type: AppErrorType::ForbiddenError,
                ..
            } => "You do not have permission to perform this action".to_string(),
            _ => "An unexpected error has occurred".to_string(),
        }
    }

    pub fn surface(&self) -> ErrorSurface {
        match self.error_type {
            AppErrorType::AuthError | AppErrorType::PayloadValidationError => ErrorSurface::Inline,
            AppErrorType::ForbiddenError => ErrorSurface::BlockingAlert,
            _ => ErrorSurface::Logged,
        }
    }

    pub fn remote_error(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::RemoteError,
            message: Some(error.to_string()),
        }
    }

    pub fn forbidden_error(error: impl ToString) -> AppError {
        AppError {
            cause: None,
            error_type: AppErrorType::ForbiddenError,
            message: Some(error.to_string()),
        }
    }

    pub fn unauthorized(error: impl ToString) -> AppError {
        AppError {
            cause: None,
            error_type: AppErrorType::AuthError,
            message: Some(error.to_string()),
        }
    }

    pub fn validation_error(error: impl ToString) -> AppError {
        AppError {
            cause: None,
            error_type: AppErrorType::PayloadValidationError,
            message: Some(error.to_string()),
        }
    }

    pub fn not_found(error: impl ToString) -> AppError {
        AppError {
            cause: None,
            error_type: AppErrorType::NotFoundError,
            message: Some(error.to_string()),
        }
    }

    pub fn internal_error(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::InternalServerError,
            message: Some(error.to_string()),
        }
    }

    pub fn is_permission_error(&self) -> bool {
        self.error_type == AppErrorType::ForbiddenError
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: Error) -> Self {
        AppError {
            message: None,
            cause: Some(error.to_string()),
            error_type: AppErrorType::InternalServerError,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "The request to the remote store timed out".to_string()
        } else if error.is_decode() {
            return AppError {
                cause: Some(error.to_string()),
                error_type: AppErrorType::JsonDeserializationError,
                message: Some("The remote store returned an unexpected payload".to_string()),
            };
        } else {
            "The remote store could not be reached".to_string()
        };
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::RemoteError,
            message: Some(message),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(error: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = error
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| errors.iter().map(move |e| field_message(field, e)))
            .collect();
        messages.sort();
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::PayloadValidationError,
            message: Some(messages.join("; ")),
        }
    }
}

/// The attribute's message when it has one, otherwise built from the field name.
fn field_message(field: &str, error: &validator::ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    let label: String = field
        .replace('_', " ")
        .char_indices()
        .map(|(i, c)| if i == 0 { c.to_ascii_uppercase() } else { c })
        .collect();
    if error.code == "required" {
        format!("{} is required", label)
    } else {
        format!("{} is invalid", label)
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.error_type {
            AppErrorType::AuthError => StatusCode::UNAUTHORIZED,
            AppErrorType::JsonDeserializationError
            | AppErrorType::PartiallyCreated { .. }
            | AppErrorType::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            AppErrorType::RemoteError => StatusCode::BAD_GATEWAY,
            AppErrorType::NotFoundError => StatusCode::NOT_FOUND,
            AppErrorType::PayloadValidationError => StatusCode::BAD_REQUEST,
            AppErrorType::ForbiddenError => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(AppErrorResponse {
            success: false,
            message: self.message(),
        })
    }
}

#[derive(Serialize)]
pub struct AppSuccessResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

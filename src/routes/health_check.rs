use actix_web::{get, HttpResponse};

use crate::core::AppSuccessResponse;

#[get("/health_check")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: (),
        message: "Service is up".to_string(),
    })
}

use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

use crate::errors::ApiError;

/// Envelope wrapping every API payload, success or failure.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub code: u16,
    pub result: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(code: StatusCode, result: T) -> Self {
        Self {
            status: "SUCCESS".to_string(),
            code: code.as_u16(),
            result: Some(result),
            error: None,
        }
    }
}

fn respond<T: Serialize>(code: StatusCode, data: T) -> HttpResponse {
    HttpResponse::build(code).json(ApiResponse::success(code, data))
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::OK, data)
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::CREATED, data)
}

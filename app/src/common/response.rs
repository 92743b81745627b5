use axum::{http::StatusCode, response::IntoResponse};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(code: u16, message: String, data: Option<T>) -> Self {
        Self {
            code,
            message,
            data,
        }
    }

    pub fn ok<M: AsRef<str>>(message: M, data: Option<T>) -> Self {
        Self::new(StatusCode::OK.as_u16(), String::from(message.as_ref()), data)
    }

    pub fn created<M: AsRef<str>>(message: M, data: T) -> Self {
        Self::new(
            StatusCode::CREATED.as_u16(),
            String::from(message.as_ref()),
            Some(data),
        )
    }

    pub fn err<M: AsRef<str>>(code: u16, message: M) -> Self {
        Self::new(code, String::from(message.as_ref()), None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK);
        let body = axum::Json(self);

        (status, body).into_response()
    }
}

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

pub type ApiResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub name: String,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'static str>,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            name: err.name().to_string(),
            code: err.status().as_u16(),
            message: err.message().to_string(),
            location: err.location(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{body, http::StatusCode, response::IntoResponse};

    use crate::error::AppError;

    #[tokio::test]
    async fn error_renders_name_code_message() {
        let response = AppError::bad_request("Required parameter 'code' is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("body should be json");

        assert_eq!(
            json,
            serde_json::json!({
                "name": "Bad Request",
                "code": 400,
                "message": "Required parameter 'code' is required",
            })
        );
    }

    #[tokio::test]
    async fn location_is_included_when_present() {
        let response = AppError::internal().at("refresh").into_response();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("body should be json");

        assert_eq!(json["code"], 500);
        assert_eq!(json["name"], "Internal Server Error");
        assert_eq!(json["message"], "Something went wrong");
        assert_eq!(json["location"], "refresh");
    }
}

use axum::http::StatusCode;

/// HTTP-facing failure. Rendered as `{name, code, message, location?}`.
#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    name: Option<&'static str>,
    message: String,
    location: Option<&'static str>,
}

pub const GENERIC_INTERNAL_MESSAGE: &str = "Something went wrong";

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            name: None,
            message: message.into(),
            location: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_INTERNAL_MESSAGE)
    }

    /// Replaces the reason phrase in the `name` field.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn at(mut self, location: &'static str) -> Self {
        self.location = Some(location);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn name(&self) -> &str {
        self.name
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("Internal Server Error")
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&'static str> {
        self.location
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.status.as_u16(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<crate::db::dao::DaoLayerError> for AppError {
    fn from(err: crate::db::dao::DaoLayerError) -> Self {
        tracing::error!(error = %err, "storage failure");
        AppError::internal()
    }
}

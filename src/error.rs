use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::split::SplitError;

pub type Result<T> = std::result::Result<T, LedgerError>;

const GENERIC_FAULT: &str = "An unexpected error occurred. Please try again later.";

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn group_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Group",
            id: id.into(),
        }
    }

    pub fn expense_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Expense",
            id: id.into(),
        }
    }

    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "User",
            id: id.into(),
        }
    }

    fn error_type(&self) -> &str {
        match self {
            LedgerError::Split(SplitError::InvalidPolicy(_)) => "invalid_policy",
            LedgerError::Split(SplitError::EmptyDetails) => "empty_details",
            LedgerError::Split(_) => "validation_failed",
            LedgerError::Validation(_) => "validation_error",
            LedgerError::NotFound { .. } => "not_found",
            LedgerError::Duplicate(_) => "duplicate_error",
            LedgerError::Unauthorized(_) => "unauthorized",
            LedgerError::Forbidden => "forbidden",
            LedgerError::Database(_) => "database_error",
            LedgerError::Internal(_) => "internal_error",
        }
    }

    fn is_server_fault(&self) -> bool {
        matches!(self, LedgerError::Database(_) | LedgerError::Internal(_))
    }
}

impl ResponseError for LedgerError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let message = if self.is_server_fault() {
            error!(error = %self, "request failed");
            GENERIC_FAULT.to_string()
        } else {
            self.to_string()
        };

        let mut response = HttpResponse::build(status_code);
        if let LedgerError::Unauthorized(_) = self {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(json!({
            "error": {
                "code": status_code.as_u16(),
                "message": message,
                "type": self.error_type()
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::Split(_) => StatusCode::BAD_REQUEST,
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::Duplicate(_) => StatusCode::BAD_REQUEST,
            LedgerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            LedgerError::Forbidden => StatusCode::FORBIDDEN,
            LedgerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LedgerError::Split(SplitError::EmptyDetails).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(LedgerError::group_not_found("g1").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            LedgerError::Unauthorized("Could not validate credentials".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LedgerError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(LedgerError::group_not_found("g1").to_string(), "Group not found");
    }

    #[actix_web::test]
    async fn test_internal_error_hides_detail() {
        let response = LedgerError::Internal("secret detail".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["message"], GENERIC_FAULT);
        assert_eq!(body["error"]["type"], "internal_error");
    }

    #[actix_web::test]
    async fn test_split_error_is_client_error() {
        let err = LedgerError::from(SplitError::InvalidPolicy("shares".into()));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["message"], "Invalid split type: shares");
        assert_eq!(body["error"]["type"], "invalid_policy");
    }

    #[actix_web::test]
    async fn test_empty_details_has_its_own_type() {
        let response = LedgerError::from(SplitError::EmptyDetails).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["type"], "empty_details");
    }
}

//! Error responses of the control surface.
//!
//! Every failure is a JSON body `{"error": message}`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::control::ControlError;
use crate::http::relay::RelayError;
use crate::project::ProjectError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ProjectError> for ApiError {
    fn from(e: ProjectError) -> Self {
        let status = match &e {
            ProjectError::InvalidName(_) | ProjectError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ProjectError::NotFound(_) => StatusCode::NOT_FOUND,
            ProjectError::AlreadyExists(_) => StatusCode::CONFLICT,
            ProjectError::Parse { .. } | ProjectError::Io(_) => {
                tracing::error!(error = %e, "Project storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(e: ControlError) -> Self {
        match e {
            ControlError::Project(e) => e.into(),
            e => Self::bad_request(e.to_string()),
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use wealthevolve_core::domain::error::{ConflictError, NotFoundError, ValidationError};

/// `axum::Json` whose rejections go through [`ApiError`], so malformed bodies
/// get the same 400 shape as failed validation.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Maps core errors onto HTTP statuses; anything unclassified is a 500.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, field) = if let Some(v) = err.downcast_ref::<ValidationError>() {
            (StatusCode::BAD_REQUEST, Some(v.field))
        } else if let Some(rejection) = err.downcast_ref::<JsonRejection>() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: rejection.body_text(),
                    field: None,
                }),
            )
                .into_response();
        } else if err.downcast_ref::<NotFoundError>().is_some() {
            (StatusCode::NOT_FOUND, None)
        } else if err.downcast_ref::<ConflictError>().is_some() {
            (StatusCode::CONFLICT, None)
        } else {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "request failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "internal error".to_string(),
                    field: None,
                }),
            )
                .into_response();
        };

        (
            status,
            Json(ErrorBody {
                error: err.to_string(),
                field,
            }),
        )
            .into_response()
    }
}

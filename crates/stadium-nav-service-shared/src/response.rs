//! Success envelope shared by every JSON endpoint.
//!
//! A successful body carries the same `request_id` that the middleware
//! echoes in `x-request-id` and that a problem reports as `instance`, so a
//! client can correlate either outcome with the server logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Payload plus request correlation.
///
/// The payload is flattened into the top-level object, so `T` must
/// serialize as a map (a struct), never as a bare sequence.
///
/// ```
/// use stadium_nav_service_shared::ServiceResponse;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Ack {
///     closed: bool,
/// }
///
/// let response = ServiceResponse::created(Ack { closed: true }, "req-7");
/// assert_eq!(response.status, axum::http::StatusCode::CREATED);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ServiceResponse<T> {
    #[serde(flatten)]
    pub data: T,

    pub request_id: String,

    #[serde(skip)]
    pub status: StatusCode,
}

impl<T> ServiceResponse<T> {
    /// 200 response.
    pub fn ok(data: T, request_id: impl Into<String>) -> Self {
        Self::with_status(data, request_id, StatusCode::OK)
    }

    /// 201 response for a newly registered resource.
    pub fn created(data: T, request_id: impl Into<String>) -> Self {
        Self::with_status(data, request_id, StatusCode::CREATED)
    }

    fn with_status(data: T, request_id: impl Into<String>, status: StatusCode) -> Self {
        Self {
            data,
            request_id: request_id.into(),
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ServiceResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

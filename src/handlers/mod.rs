// src/handlers/mod.rs
pub mod admin_handler;
pub mod driver_handler;
pub mod location_handler;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::{errors::RadarError, state::AppState};

/// Header carrying the shared admin PIN.
pub const ADMIN_PIN_HEADER: &str = "x-admin-pin";

/// `Json<T>` whose rejections use the service error body.
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = RadarError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(RadarError::bad_request(rejection.body_text())),
        }
    }
}

/// Rejects admin requests whose PIN header does not match the configured one.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, RadarError> {
    let supplied = request
        .headers()
        .get(ADMIN_PIN_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();

    if !bool::from(supplied.ct_eq(state.config.admin_pin.as_bytes())) {
        tracing::warn!("Rejected admin request to {}", request.uri().path());
        return Err(RadarError::unauthorized("Unauthorized"));
    }

    Ok(next.run(request).await)
}

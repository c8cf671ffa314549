use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde_json::json;

/// `Json<T>` whose every rejection (syntax, type, content-type) becomes a
/// `422` with a `{"detail": ...}` body.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(v)) => Ok(ValidJson(v)),
            Err(rej) => {
                tracing::debug!(status = %rej.status(), "rejected request body: {}", rej.body_text());
                Err((
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"detail": rej.body_text()})),
                ))
            }
        }
    }
}

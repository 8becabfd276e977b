//! Request extractors whose rejections render as [`AppError`].
//!
//! Wrap axum's `Json`, `Query` and `Path` so a malformed body, query string or
//! path segment answers with the usual `{error, message}` body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        count: i32,
    }

    async fn reject(req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let err = ApiJson::<Payload>::from_request(req, &())
            .await
            .unwrap_err();
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn mistyped_field_is_a_validation_error() {
        let req = Request::post("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"count":"many"}"#))
            .unwrap();
        let (status, body) = reject(req).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("validation_error", body["error"]);
        assert!(body["message"].as_str().unwrap().contains("count"));
    }

    #[tokio::test]
    async fn missing_content_type_is_a_validation_error() {
        let req = Request::post("/").body(Body::from("{}")).unwrap();
        let (status, body) = reject(req).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("validation_error", body["error"]);
    }
}

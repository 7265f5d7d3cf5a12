//! Request extractors whose rejections use the uniform error body.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body.
///
/// A request without a JSON content type is read as an empty object, so
/// schema validation reports every missing field. A malformed document is
/// rejected with an [`AppError::BadRequest`].
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::MissingJsonContentType(rejection)) => {
                serde_json::from_value(serde_json::Value::Object(serde_json::Map::new()))
                    .map(Self)
                    .map_err(|_| AppError::bad_request(rejection.body_text()))
            }
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header::CONTENT_TYPE};
    use serde_json::{json, Value};

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn extracts_json_documents() {
        let req = request(Some("application/json"), r#"{"title":"Dune"}"#);
        let JsonBody(value) = JsonBody::<Value>::from_request(req, &()).await.unwrap();
        assert_eq!(value, json!({"title": "Dune"}));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let req = request(Some("application/json"), r#"{"title":"#);
        let err = JsonBody::<Value>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn missing_content_type_reads_as_empty_object() {
        let req = request(None, r#"{"title":"Dune"}"#);
        let JsonBody(value) = JsonBody::<Value>::from_request(req, &()).await.unwrap();
        assert_eq!(value, json!({}));

        let req = request(Some("text/plain"), r#"{"title":"Dune"}"#);
        let JsonBody(value) = JsonBody::<Value>::from_request(req, &()).await.unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn missing_content_type_rejects_types_needing_fields() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Named {
            name: String,
        }

        let req = request(None, r#"{"name":"Dune"}"#);
        let err = JsonBody::<Named>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }
}

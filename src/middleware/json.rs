use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// JSON object body; malformed or non-object payloads become `INVALID_JSON`
#[derive(Debug, Clone)]
pub struct JsonBody(pub Map<String, Value>);

impl JsonBody {
    /// Decode into a typed request; shape errors are reported as `400 BAD_REQUEST`
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(Value::Object(self.0)).map_err(|e| ApiError::bad_request(e.to_string()))
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }
}

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::invalid_json(rejection.body_text()))?;

        match value {
            Value::Object(map) => Ok(JsonBody(map)),
            _ => Err(ApiError::invalid_json("Request body must be a JSON object")),
        }
    }
}

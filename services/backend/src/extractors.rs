use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// JSON extractor that also runs the body's `Validate` rules
///
/// Both malformed JSON and rule violations are answered with the standard
/// error body instead of axum's plain-text rejection.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationJsonRejection::Json)?;
        value.validate().map_err(ValidationJsonRejection::Invalid)?;
        Ok(ValidatedJson(value))
    }
}

pub enum ValidationJsonRejection {
    Json(JsonRejection),
    Invalid(ValidationErrors),
}

impl IntoResponse for ValidationJsonRejection {
    fn into_response(self) -> Response {
        let (code, message, original) = match &self {
            ValidationJsonRejection::Json(rejection) => {
                let original = rejection.body_text();
                match missing_field(&original) {
                    Some(field) => (
                        "VALIDATION_MISSING_FIELD",
                        format!("Missing required field: {}", field),
                        original,
                    ),
                    None => (
                        "VALIDATION_INVALID_INPUT",
                        "Invalid request body".to_string(),
                        original,
                    ),
                }
            }
            ValidationJsonRejection::Invalid(errors) => {
                let mut messages = Vec::new();
                describe(errors, "", &mut messages);
                messages.sort();
                ("VALIDATION_INVALID_INPUT", messages.join("; "), errors.to_string())
            }
        };

        tracing::warn!(
            error_code = code,
            error_message = %message,
            original_error = %original,
            "Request validation failed"
        );

        metrics::counter!("errors_total", "category" => "Validation", "code" => code).increment(1);

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "category": "Validation",
            }
        }));

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

fn missing_field(rejection: &str) -> Option<&str> {
    rejection
        .split("missing field `")
        .nth(1)
        .and_then(|rest| rest.split('`').next())
}

/// Flatten nested validation errors into `field: message` lines
fn describe(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(failures) => {
                for failure in failures {
                    let message = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid ({})", path, failure.code));
                    out.push(message);
                }
            }
            ValidationErrorsKind::Struct(nested) => describe(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    describe(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

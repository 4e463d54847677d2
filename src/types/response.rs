use crate::error::GatehouseError;
use serde::Serialize;

/// Envelope every shell-facing call returns.
///
/// `error` carries the human readable message verbatim; it is empty on success.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: String::new(),
            code: None,
        }
    }

    pub fn err(e: &GatehouseError) -> Self {
        Self {
            success: false,
            data: None,
            error: e.to_string(),
            code: Some(e.code()),
        }
    }
}

impl<T> From<Result<T, GatehouseError>> for ApiResponse<T> {
    fn from(res: Result<T, GatehouseError>) -> Self {
        match res {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_is_surfaced_verbatim() {
        let res: Result<(), _> = Err(GatehouseError::Conflict("email already registered".into()));
        let resp = ApiResponse::from(res);
        assert!(!resp.success);
        assert_eq!(resp.error, "email already registered");
        assert_eq!(resp.code, Some("CONFLICT"));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["data"], serde_json::Value::Null);
    }
}

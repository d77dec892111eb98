#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    BadRequest,
    InternalServerError,
    // Operation preparation phases
    OperationParsingError,
    OperationValidationError,
    OperationNotFound,
    VariableError,
    QueryDepthExceeded,
    // Persisted queries
    PersistedQueryError,
    PersistedQueryNotFound,
    // Execution
    FieldError,
    LoaderContractViolation,
}

impl From<ErrorCode> for http::StatusCode {
    fn from(code: ErrorCode) -> http::StatusCode {
        code.into_http_status_code_with_priority().0
    }
}

impl ErrorCode {
    /// The HTTP status a whole-response failure with this code maps to, with a
    /// priority used to pick the most helpful status when several errors are
    /// present.
    pub fn into_http_status_code_with_priority(self) -> (http::StatusCode, usize) {
        match self {
            ErrorCode::OperationParsingError
            | ErrorCode::OperationValidationError
            | ErrorCode::OperationNotFound
            | ErrorCode::VariableError
            | ErrorCode::QueryDepthExceeded
            | ErrorCode::PersistedQueryError
            | ErrorCode::PersistedQueryNotFound
            | ErrorCode::BadRequest => (http::StatusCode::BAD_REQUEST, 1000),
            ErrorCode::FieldError => (http::StatusCode::OK, 100),
            // least helpful error codes
            ErrorCode::LoaderContractViolation | ErrorCode::InternalServerError => {
                (http::StatusCode::INTERNAL_SERVER_ERROR, 0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;

    #[test]
    fn codes_serialize_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(ErrorCode::QueryDepthExceeded).unwrap(),
            serde_json::json!("QUERY_DEPTH_EXCEEDED")
        );
        assert_eq!(ErrorCode::LoaderContractViolation.to_string(), "LOADER_CONTRACT_VIOLATION");
    }
}

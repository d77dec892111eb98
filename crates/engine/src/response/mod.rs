mod data;

pub use data::ResponseData;
pub(crate) use data::{Origin, ResponseValue, SlotId};

use graphloom_error::GraphqlError;

/// The outcome of one request. A request error means execution never
/// started: the envelope carries no `data` key at all, as opposed to
/// `"data": null`.
pub enum Response {
    Executed {
        data: ResponseData,
        errors: Vec<GraphqlError>,
    },
    RequestError {
        errors: Vec<GraphqlError>,
    },
}

impl Response {
    pub fn request_error(errors: impl IntoIterator<Item = GraphqlError>) -> Self {
        Response::RequestError {
            errors: errors.into_iter().collect(),
        }
    }

    pub fn errors(&self) -> &[GraphqlError] {
        match self {
            Response::Executed { errors, .. } | Response::RequestError { errors } => errors,
        }
    }

    /// The HTTP status an HTTP layer should answer with: 200 for anything
    /// executed, otherwise the most helpful status among the errors.
    pub fn http_status(&self) -> http::StatusCode {
        match self {
            Response::Executed { .. } => http::StatusCode::OK,
            Response::RequestError { errors } => errors
                .iter()
                .map(|error| error.code.into_http_status_code_with_priority())
                .max_by_key(|(_, priority)| *priority)
                .map(|(status, _)| status)
                .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl serde::Serialize for Response {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        match self {
            Response::Executed { data, errors } => {
                map.serialize_entry("data", data)?;
                if !errors.is_empty() {
                    map.serialize_entry("errors", errors)?;
                }
            }
            Response::RequestError { errors } => {
                map.serialize_entry("errors", errors)?;
            }
        }
        map.end()
    }
}

/// Responses for a batch envelope, mirroring the shape of the request: a
/// bare response for a single request, an array for an array.
pub enum BatchResponse {
    Single(Response),
    Batch(Vec<Response>),
}

impl BatchResponse {
    pub fn http_status(&self) -> http::StatusCode {
        match self {
            BatchResponse::Single(response) => response.http_status(),
            // A batch envelope always answers 200; each slot carries its own
            // errors.
            BatchResponse::Batch(_) => http::StatusCode::OK,
        }
    }
}

impl serde::Serialize for BatchResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BatchResponse::Single(response) => response.serialize(serializer),
            BatchResponse::Batch(responses) => responses.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphloom_error::ErrorCode;

    #[test]
    fn request_errors_omit_the_data_key() {
        let response = Response::request_error([GraphqlError::new("Missing query", ErrorCode::BadRequest)]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "errors": [{"message": "Missing query", "extensions": {"code": "BAD_REQUEST"}}]
            })
        );
        assert_eq!(response.http_status(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn executed_responses_keep_data_alongside_errors() {
        let response = Response::Executed {
            data: ResponseData::new(),
            errors: vec![GraphqlError::new("boom", ErrorCode::FieldError)],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"], serde_json::json!({}));
        assert_eq!(json["errors"][0]["extensions"]["code"], "FIELD_ERROR");
        assert_eq!(response.http_status(), http::StatusCode::OK);
    }
}

use serde::{
    de::{self, MapAccess, SeqAccess, Visitor},
    Deserialize, Deserializer,
};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fmt,
    ops::{Deref, DerefMut},
};

/// One unit of work: query text (or a persisted-document reference), optional
/// variables and an optional operation name.
#[derive(serde::Deserialize, Debug, Default)]
pub struct Request {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,
    #[serde(default, rename = "docId")]
    pub doc_id: Option<String>,
    #[serde(default)]
    pub variables: RawVariables,
    #[serde(default)]
    pub extensions: RequestExtensions,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Request {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = RawVariables::from_value(variables);
        self
    }
}

#[derive(serde::Deserialize, Debug, Default)]
pub struct RequestExtensions {
    #[serde(default, rename = "persistedQuery")]
    pub persisted_query: Option<PersistedQueryRequestExtension>,
}

/// Apollo-style automatic persisted query extension; the hash is the
/// hex-encoded sha256 of the document text.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct PersistedQueryRequestExtension {
    #[serde(default = "default_persisted_query_version")]
    pub version: u32,
    #[serde(rename = "sha256Hash")]
    pub sha256_hash: String,
}

fn default_persisted_query_version() -> u32 {
    1
}

/// Variables of a query, as received on the wire.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(transparent)]
pub struct RawVariables(BTreeMap<String, Value>);

impl<'de> Deserialize<'de> for RawVariables {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(
            <Option<BTreeMap<String, Value>>>::deserialize(deserializer)?.unwrap_or_default(),
        ))
    }
}

impl RawVariables {
    /// Builds variables from a JSON value; anything but a map means no
    /// variables.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(object) => Self(object.into_iter().collect()),
            _ => Self::default(),
        }
    }
}

impl Deref for RawVariables {
    type Target = BTreeMap<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RawVariables {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

pub enum BatchRequest {
    Single(Request),
    Batch(Vec<Request>),
}

impl<'de> Deserialize<'de> for BatchRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BatchRequestVisitor;

        impl<'de> Visitor<'de> for BatchRequestVisitor {
            type Value = BatchRequest;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a GraphQL request or batch of requests")
            }

            fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let requests = Vec::<Request>::deserialize(de::value::SeqAccessDeserializer::new(seq))?;
                Ok(BatchRequest::Batch(requests))
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let request = Request::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(BatchRequest::Single(request))
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Request::deserialize(deserializer).map(BatchRequest::Single)
            }

            fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Request::deserialize(deserializer).map(BatchRequest::Single)
            }
        }

        deserializer.deserialize_any(BatchRequestVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::BatchRequest;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_single_and_batched_requests() {
        let single: BatchRequest =
            serde_json::from_str(r#"{"query": "{ __typename }", "variables": {"x": 1}}"#).unwrap();
        let BatchRequest::Single(request) = single else {
            panic!("expected a single request");
        };
        assert_eq!(request.query.as_deref(), Some("{ __typename }"));
        assert_eq!(request.variables.get("x"), Some(&serde_json::json!(1)));

        let batch: BatchRequest =
            serde_json::from_str(r#"[{"query": "{ a }"}, {"query": "{ b }", "operationName": "B"}]"#).unwrap();
        let BatchRequest::Batch(requests) = batch else {
            panic!("expected a batch");
        };
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].operation_name.as_deref(), Some("B"));
    }

    #[test]
    fn persisted_query_extension_round_trips() {
        let BatchRequest::Single(request) = serde_json::from_str(
            r#"{"extensions": {"persistedQuery": {"version": 1, "sha256Hash": "abc123"}}}"#,
        )
        .unwrap() else {
            panic!("expected a single request");
        };
        let ext = request.extensions.persisted_query.unwrap();
        assert_eq!(ext.version, 1);
        assert_eq!(ext.sha256_hash, "abc123");
    }
}

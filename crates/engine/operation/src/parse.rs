use async_graphql_parser::{
    parse_query,
    types::{DocumentOperations, ExecutableDocument, FragmentDefinition, OperationDefinition, OperationType},
    Positioned,
};
use async_graphql_value::Name;
use std::collections::HashMap;

use crate::Error;

/// A parsed document together with the operation selected out of it. The
/// whole document is kept so fragments stay addressable.
#[derive(Debug)]
pub struct ParsedOperation {
    pub(crate) document: ExecutableDocument,
    /// Resolved name of the selected operation. `None` only for an anonymous
    /// operation.
    pub name: Option<String>,
    pub ty: OperationType,
}

impl ParsedOperation {
    pub fn definition(&self) -> &Positioned<OperationDefinition> {
        match (&self.document.operations, self.name.as_deref()) {
            (DocumentOperations::Single(operation), _) => operation,
            (DocumentOperations::Multiple(operations), Some(name)) => operations
                .iter()
                .find_map(|(key, operation)| (key.as_str() == name).then_some(operation))
                .expect("selected at parse time"),
            (DocumentOperations::Multiple(_), None) => unreachable!("multiple operations are always selected by name"),
        }
    }

    pub fn fragments(&self) -> &HashMap<Name, Positioned<FragmentDefinition>> {
        &self.document.fragments
    }
}

pub(crate) fn parse_operation(operation_name: Option<&str>, document: &str) -> Result<ParsedOperation, Vec<Error>> {
    let document = parse_query(document).map_err(|err| {
        let positions = err.positions();
        let mut error = Error::parsing(err.to_string());
        for pos in positions {
            error = error.at(pos);
        }
        vec![error]
    })?;

    let (name, ty) = match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), None) => (None, operation.node.ty),
        (DocumentOperations::Single(operation), Some(name)) => {
            // The parser only leaves anonymous operations unnamed.
            return Err(vec![Error::operation_not_found(format!(
                "Unknown operation named '{name}'."
            ))
            .at(operation.pos)]);
        }
        (DocumentOperations::Multiple(operations), Some(name)) => match operations
            .iter()
            .find(|(key, _)| key.as_str() == name)
        {
            Some((key, operation)) => (Some(key.to_string()), operation.node.ty),
            None => {
                return Err(vec![Error::operation_not_found(format!(
                    "Unknown operation named '{name}'."
                ))]);
            }
        },
        (DocumentOperations::Multiple(operations), None) => {
            if operations.len() == 1 {
                let (key, operation) = operations.iter().next().expect("length checked");
                (Some(key.to_string()), operation.node.ty)
            } else {
                return Err(vec![Error::operation_not_found(
                    "Missing operation name: the document defines multiple operations.",
                )]);
            }
        }
    };

    Ok(ParsedOperation { document, name, ty })
}

#[cfg(test)]
mod tests {
    use super::parse_operation;
    use crate::ErrorKind;
    use async_graphql_parser::types::OperationType;

    #[test]
    fn selects_the_single_anonymous_operation() {
        let operation = parse_operation(None, "{ add(x: 1, y: 2) }").unwrap();
        assert_eq!(operation.name, None);
        assert_eq!(operation.ty, OperationType::Query);
    }

    #[test]
    fn selects_among_multiple_operations_by_name() {
        let document = "query MyQuery { add(x: 1, y: 2) } query Double($x: Int) { add(x: $x, y: $x) }";
        let operation = parse_operation(Some("Double"), document).unwrap();
        assert_eq!(operation.name.as_deref(), Some("Double"));

        let errors = parse_operation(None, document).unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::OperationNotFound);

        let errors = parse_operation(Some("Triple"), document).unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::OperationNotFound);
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        let errors = parse_operation(None, "query {").unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::Parsing);
        assert!(!errors[0].locations.is_empty());
    }
}

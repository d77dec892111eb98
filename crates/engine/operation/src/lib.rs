mod depth;
mod error;
mod parse;
mod request;
mod validation;
mod variables;

pub use error::{Error, ErrorKind};
pub use parse::ParsedOperation;
pub use request::{BatchRequest, PersistedQueryRequestExtension, RawVariables, Request, RequestExtensions};
pub use variables::Variables;

pub use async_graphql_parser::types::OperationType;

use graphloom_schema::Schema;

impl ParsedOperation {
    /// Parses `document` and selects the operation `operation_name` refers
    /// to, then validates the selection sets against `schema`. Returns every
    /// error found rather than the first.
    pub fn parse(schema: &Schema, operation_name: Option<&str>, document: &str) -> Result<ParsedOperation, Vec<Error>> {
        let operation = parse::parse_operation(operation_name, document)?;
        validation::validate(schema, &operation)?;
        Ok(operation)
    }

    /// Selection-set nesting depth of the selected operation, fragments
    /// expanded. Only meaningful on a validated operation (validation rejects
    /// fragment cycles).
    pub fn depth(&self) -> usize {
        depth::operation_depth(self)
    }
}

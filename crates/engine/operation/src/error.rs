use graphloom_error::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parsing,
    Validation,
    OperationNotFound,
    Variable,
}

/// An error produced while turning request text into an executable operation.
/// The engine maps `kind` onto the public error code taxonomy.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub locations: Vec<Location>,
}

impl Error {
    pub fn parsing(message: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::Parsing,
            message: message.into(),
            locations: Vec::new(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::Validation,
            message: message.into(),
            locations: Vec::new(),
        }
    }

    pub fn operation_not_found(message: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::OperationNotFound,
            message: message.into(),
            locations: Vec::new(),
        }
    }

    pub fn variable(message: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::Variable,
            message: message.into(),
            locations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    pub(crate) fn at(self, pos: async_graphql_parser::Pos) -> Self {
        self.with_location(Location::new(pos.line as u32, pos.column as u32))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for Error {}

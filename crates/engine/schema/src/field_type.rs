/// The type of a field or argument: a named type or a list, each wrapper
/// independently nullable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Named { name: String, nullable: bool },
    List { inner: Box<FieldType>, nullable: bool },
}

impl FieldType {
    pub fn named(name: impl Into<String>) -> Self {
        FieldType::Named {
            name: name.into(),
            nullable: true,
        }
    }

    pub fn list(inner: FieldType) -> Self {
        FieldType::List {
            inner: Box::new(inner),
            nullable: true,
        }
    }

    #[must_use]
    pub fn non_null(mut self) -> Self {
        match &mut self {
            FieldType::Named { nullable, .. } | FieldType::List { nullable, .. } => *nullable = false,
        }
        self
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            FieldType::Named { nullable, .. } | FieldType::List { nullable, .. } => *nullable,
        }
    }

    /// The innermost named type, through any number of list wrappers.
    pub fn named_type(&self) -> &str {
        match self {
            FieldType::Named { name, .. } => name,
            FieldType::List { inner, .. } => inner.named_type(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Named { name, nullable } => {
                write!(f, "{name}{}", if *nullable { "" } else { "!" })
            }
            FieldType::List { inner, nullable } => {
                write!(f, "[{inner}]{}", if *nullable { "" } else { "!" })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FieldType;

    #[test]
    fn display_matches_sdl_notation() {
        let ty = FieldType::list(FieldType::named("User").non_null()).non_null();
        assert_eq!(ty.to_string(), "[User!]!");
        assert_eq!(ty.named_type(), "User");
        assert!(!ty.is_nullable());
    }
}

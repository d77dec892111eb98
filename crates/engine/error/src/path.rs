/// Path locating an error within the response tree, serialized as the
/// standard GraphQL mix of field names and list indices.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Default)]
pub struct ErrorPath(Vec<ErrorPathSegment>);

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum ErrorPathSegment {
    Field(Box<str>),
    Index(usize),
}

impl ErrorPath {
    #[must_use]
    pub fn with_field(mut self, name: impl Into<Box<str>>) -> Self {
        self.0.push(ErrorPathSegment::Field(name.into()));
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.0.push(ErrorPathSegment::Index(index));
        self
    }

    pub fn push(&mut self, segment: ErrorPathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<ErrorPathSegment> {
        self.0.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorPathSegment> {
        self.0.iter()
    }
}

impl From<Vec<ErrorPathSegment>> for ErrorPath {
    fn from(segments: Vec<ErrorPathSegment>) -> Self {
        ErrorPath(segments)
    }
}

impl FromIterator<ErrorPathSegment> for ErrorPath {
    fn from_iter<I: IntoIterator<Item = ErrorPathSegment>>(iter: I) -> Self {
        ErrorPath(iter.into_iter().collect())
    }
}

impl serde::Serialize for ErrorPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for segment in &self.0 {
            match segment {
                ErrorPathSegment::Field(name) => seq.serialize_element(name)?,
                ErrorPathSegment::Index(index) => seq.serialize_element(index)?,
            }
        }
        seq.end()
    }
}

use std::fmt;

/// Input rejected before it reaches an engine or the account store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub detail: String,
}

impl ValidationError {
    pub fn new(field: &'static str, detail: impl Into<String>) -> Self {
        Self {
            field,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.detail)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundError {
    pub kind: &'static str,
    pub key: String,
}

impl NotFoundError {
    pub fn new(kind: &'static str, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not found: {}", self.kind, self.key)
    }
}

impl std::error::Error for NotFoundError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictError {
    pub detail: String,
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conflict: {}", self.detail)
    }
}

impl std::error::Error for ConflictError {}

/// Shorthand for `Err(ValidationError)` wrapped in `anyhow`.
macro_rules! invalid {
    ($field:expr, $($arg:tt)+) => {
        return Err(anyhow::Error::new($crate::domain::error::ValidationError::new(
            $field,
            format!($($arg)+),
        )))
    };
}

/// Like `anyhow::ensure!`, but yields a `ValidationError` for `$field`.
macro_rules! ensure_valid {
    ($cond:expr, $field:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::domain::error::invalid!($field, $($arg)+);
        }
    };
}

pub(crate) use ensure_valid;
pub(crate) use invalid;

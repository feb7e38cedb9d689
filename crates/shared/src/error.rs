use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single form field that failed validation at the input boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{field} must be a whole number, got '{value}'")]
    NotANumber { field: String, value: String },
    #[error("{field} must not be negative")]
    Negative { field: String },
    #[error("{field} must be greater than zero")]
    NotPositive { field: String },
    #[error("unknown scenario '{value}'; expected 'peace' or 'crisis'")]
    UnknownScenario { value: String },
}

impl InputError {
    pub fn field(&self) -> &str {
        match self {
            InputError::NotANumber { field, .. }
            | InputError::Negative { field }
            | InputError::NotPositive { field } => field,
            InputError::UnknownScenario { .. } => "scenario",
        }
    }
}

/// Every field error found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: Vec<InputError>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: InputError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputError> {
        self.errors.iter()
    }

    pub fn for_field(&self, field: &str) -> Option<&InputError> {
        self.errors.iter().find(|error| error.field() == field)
    }

    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.errors.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl From<InputError> for FormErrors {
    fn from(error: InputError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// Error body the simulation backend sends alongside a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendErrorBody {
    pub error: String,
}

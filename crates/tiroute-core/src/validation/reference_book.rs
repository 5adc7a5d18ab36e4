//! Reference-book requests (operations on reference data lists).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::sanitize::{sanitize_list, sanitize_opt};
use crate::domain::{DecodeError, ValidationError};

static BOOK_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_-]+$").expect("reference book name regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceBookOp {
    AddElement,
    ReplaceElement,
    DeleteElement,
    /// Any other label; rejected by `is_valid`.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ReferenceBookOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AddElement => "add_element",
            Self::ReplaceElement => "replace_element",
            Self::DeleteElement => "delete_element",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceBookParameter {
    pub op: ReferenceBookOp,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceBookRequest {
    #[serde(default)]
    pub rbook_parameters: Vec<ReferenceBookParameter>,
}

impl ReferenceBookRequest {
    pub fn decode(details: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(details).map_err(DecodeError::Details)
    }

    /// Structural check of every parameter; the first violation is reported.
    pub fn is_valid(&self) -> Result<(), ValidationError> {
        if self.rbook_parameters.is_empty() {
            return Err(ValidationError::InvalidReferenceBook(
                "no parameters were given".into(),
            ));
        }

        for (index, param) in self.rbook_parameters.iter().enumerate() {
            if param.op == ReferenceBookOp::Unknown {
                return Err(ValidationError::InvalidReferenceBook(format!(
                    "parameter #{index}: unknown operation"
                )));
            }
            if !BOOK_NAME.is_match(&param.name) {
                return Err(ValidationError::InvalidReferenceBook(format!(
                    "parameter #{index}: invalid name '{}'",
                    param.name
                )));
            }
            let needs_values = matches!(
                param.op,
                ReferenceBookOp::AddElement | ReferenceBookOp::ReplaceElement
            );
            if needs_values && param.values.iter().all(|v| v.trim().is_empty()) {
                return Err(ValidationError::InvalidReferenceBook(format!(
                    "parameter #{index}: '{}' needs at least one value",
                    param.op
                )));
            }
        }

        Ok(())
    }

    pub fn sanitize(mut self) -> Self {
        for param in &mut self.rbook_parameters {
            sanitize_opt(&mut param.description);
            sanitize_list(&mut param.values);
        }
        self
    }
}

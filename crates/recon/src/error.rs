use std::fmt;

use uuid::Uuid;

use crate::model::{DiscrepancyStatus, Role};

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (tolerance ordering, threshold range, etc.).
    ConfigValidation(String),
    /// Malformed identifier or otherwise rejected input.
    Validation(String),
    /// Referenced entity does not exist. Distinct from a workflow violation.
    NotFound { entity: &'static str, id: Uuid },
    /// The transition edge is not defined for the current status.
    InvalidTransition {
        from: DiscrepancyStatus,
        to: DiscrepancyStatus,
    },
    /// The edge exists but the actor's role is not whitelisted on it.
    RoleNotPermitted {
        role: Role,
        from: DiscrepancyStatus,
        to: DiscrepancyStatus,
    },
    /// Missing required column in input data.
    MissingColumn { file: String, column: String },
    /// A field failed to parse, identified by row.
    FieldParse {
        file: String,
        row_id: String,
        field: String,
        value: String,
    },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::InvalidTransition { from, to } => {
                write!(f, "cannot transition from '{from}' to '{to}'")
            }
            Self::RoleNotPermitted { role, from, to } => {
                write!(f, "role '{role}' cannot transition '{from}' to '{to}'")
            }
            Self::MissingColumn { file, column } => {
                write!(f, "{file}: missing column '{column}'")
            }
            Self::FieldParse { file, row_id, field, value } => {
                write!(f, "{file}, row '{row_id}': cannot parse {field} '{value}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

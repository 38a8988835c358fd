//! Ledger error taxonomy and its status classification.

use thiserror::Error;

use crate::{persist::PersistError, types::Quantity};

/// Failure of a ledger operation. Every variant is recoverable at the
/// request boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Malformed, missing, or mistyped fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Duplicate unique key.
    #[error("{0}")]
    Conflict(String),
    /// Referenced entity is absent.
    #[error("{0}")]
    NotFound(String),
    /// Sale quantity exceeds the product's stock.
    #[error("insufficient stock for \"{product}\": requested {requested}, available {available}")]
    InsufficientStock {
        /// Product name.
        product: String,
        /// Units asked for.
        requested: Quantity,
        /// Units on hand.
        available: Quantity,
    },
    /// Durable write failed; nothing was committed.
    #[error("{context}: {source_message}")]
    Persistence {
        /// What the ledger was doing.
        context: String,
        /// Underlying store failure.
        source_message: String,
    },
}

impl LedgerError {
    pub(crate) fn persistence(context: impl Into<String>, err: PersistError) -> Self {
        Self::Persistence {
            context: context.into(),
            source_message: err.to_string(),
        }
    }

    /// Classification used at the transport boundary.
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidInput(_) | Self::InsufficientStock { .. } => Status::InvalidInput,
            Self::Conflict(_) => Status::Conflict,
            Self::NotFound(_) => Status::NotFound,
            Self::Persistence { .. } => Status::ServerError,
        }
    }
}

/// Outcome class of a boundary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Read or mutation succeeded.
    Ok,
    /// A record was created.
    Created,
    /// Validation failed.
    InvalidInput,
    /// Unique key already taken.
    Conflict,
    /// Entity absent.
    NotFound,
    /// Storage failure.
    ServerError,
}

impl Status {
    /// Standard HTTP code for this class.
    pub fn http_code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::InvalidInput => 400,
            Status::NotFound => 404,
            Status::Conflict => 409,
            Status::ServerError => 500,
        }
    }

    /// True for `Ok` and `Created`.
    pub fn is_success(self) -> bool {
        matches!(self, Status::Ok | Status::Created)
    }
}

use thiserror::Error;

use super::todo::TodoId;

/// Which of the four boundary operations a failure or delay belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation { GetAll, Create, Update, Delete }

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::GetAll => "get_all",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// User-facing text for an injected transport failure.
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::GetAll => "Failed to fetch todos. Please try again later.",
            Operation::Create => "Failed to create todo. Please try again.",
            Operation::Update => "Failed to update todo. Please try again.",
            Operation::Delete => "Failed to delete todo. Please try again.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind { Validation, NotFound, SimulatedTransport }

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TodoError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    #[error("Todo not found: {0}")]
    NotFound(TodoId),
    #[error("{message}")]
    SimulatedTransport { operation: Operation, message: String },
}

impl TodoError {
    pub fn transport(operation: Operation) -> Self {
        Self::SimulatedTransport { operation, message: operation.failure_message().to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TodoError::Validation { .. } => ErrorKind::Validation,
            TodoError::NotFound(_) => ErrorKind::NotFound,
            TodoError::SimulatedTransport { .. } => ErrorKind::SimulatedTransport,
        }
    }
}

pub type TodoResult<T> = Result<T, TodoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_carries_operation_message() {
        let err = TodoError::transport(Operation::Delete);
        assert_eq!(err.kind(), ErrorKind::SimulatedTransport);
        assert_eq!(err.to_string(), "Failed to delete todo. Please try again.");
    }

    #[test]
    fn not_found_names_the_id() {
        let err = TodoError::NotFound(TodoId::from("42"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Todo not found: 42");
    }
}

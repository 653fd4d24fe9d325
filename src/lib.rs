pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;

pub use application::envelope::{Ack, Envelope};
pub use application::failure::{AlwaysFail, ConfiguredFailure, FailurePolicy, NeverFail, RandomFailure};
pub use application::filter::{DateRange, StatusFilter, TodoFilter};
pub use application::todo_service::{SimulatedTodoService, TodoService};
pub use config::{ConfigError, Delays, SimulationConfig};
pub use domain::error::{ErrorKind, Operation, TodoError, TodoResult};
pub use domain::repository::TodoRepository;
pub use domain::todo::{CreateTodo, Subtask, SubtaskDraft, SubtaskId, Todo, TodoId, UpdateTodo};
pub use infrastructure::memory_repo::InMemoryTodoRepository;

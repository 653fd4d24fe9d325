use super::error::TodoResult;
use super::todo::{CreateTodo, Todo, TodoId, UpdateTodo};

/// Authoritative ordered collection of todos.
///
/// Inputs are expected to be validated already; the store only enforces existence.
pub trait TodoRepository: Send + 'static {
    fn list(&self) -> Vec<Todo>;
    fn create(&mut self, input: CreateTodo) -> Todo;
    fn update(&mut self, id: &TodoId, input: UpdateTodo) -> TodoResult<Todo>;
    fn delete(&mut self, id: &TodoId) -> TodoResult<()>;
}

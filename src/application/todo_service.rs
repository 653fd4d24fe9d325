use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::{Delays, SimulationConfig};
use crate::domain::error::{Operation, TodoError, TodoResult};
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{CreateTodo, Todo, TodoId, UpdateTodo};

use super::envelope::{Ack, Envelope};
use super::failure::{ConfiguredFailure, FailurePolicy};

/// Async request/response contract the presentation layer talks to.
#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn get_all(&self) -> TodoResult<Envelope<Vec<Todo>>>;
    async fn create(&self, input: CreateTodo) -> TodoResult<Envelope<Todo>>;
    async fn update(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Envelope<Todo>>;
    async fn delete(&self, id: TodoId) -> TodoResult<Ack>;
}

/// Stands in for a remote API: every call sleeps for its configured delay,
/// then may fail on the policy's say-so before touching the store.
pub struct SimulatedTodoService<R: TodoRepository, F: FailurePolicy> {
    store: Mutex<R>,
    failure: F,
    delays: Delays,
}

impl<R: TodoRepository, F: FailurePolicy> SimulatedTodoService<R, F> {
    pub fn new(store: R, failure: F, delays: Delays) -> Self {
        Self { store: Mutex::new(store), failure, delays }
    }

    /// Current contents without latency or failure injection.
    pub fn snapshot(&self) -> Vec<Todo> { self.store().list() }

    // The guard is only ever held between suspension points.
    fn store(&self) -> MutexGuard<'_, R> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn simulate(&self, op: Operation) -> TodoResult<()> {
        let delay = self.delays.for_operation(op);
        debug!(op = op.name(), delay_ms = delay.as_millis() as u64, "simulating latency");
        tokio::time::sleep(delay).await;
        if self.failure.should_fail() {
            warn!(op = op.name(), "injected transport failure");
            return Err(TodoError::transport(op));
        }
        Ok(())
    }
}

impl<R: TodoRepository> SimulatedTodoService<R, ConfiguredFailure> {
    pub fn from_config(store: R, config: &SimulationConfig) -> Self {
        let failure = ConfiguredFailure::new(config.simulate_errors, config.error_rate, config.rng_seed);
        Self::new(store, failure, config.delays)
    }
}

#[async_trait]
impl<R: TodoRepository, F: FailurePolicy> TodoService for SimulatedTodoService<R, F> {
    async fn get_all(&self) -> TodoResult<Envelope<Vec<Todo>>> {
        self.simulate(Operation::GetAll).await?;
        let todos = self.store().list();
        info!(count = todos.len(), "todos fetched");
        Ok(Envelope::ok(todos, "Todos fetched successfully"))
    }

    async fn create(&self, input: CreateTodo) -> TodoResult<Envelope<Todo>> {
        let input = input.validate()?;
        self.simulate(Operation::Create).await?;
        let todo = self.store().create(input);
        info!(id = %todo.id, subtasks = todo.subtasks.len(), "todo created");
        Ok(Envelope::ok(todo, "Todo created successfully"))
    }

    async fn update(&self, id: TodoId, input: UpdateTodo) -> TodoResult<Envelope<Todo>> {
        let input = input.validate()?;
        self.simulate(Operation::Update).await?;
        let result = self.store().update(&id, input);
        match result {
            Ok(todo) => {
                info!(id = %todo.id, "todo updated");
                Ok(Envelope::ok(todo, "Todo updated successfully"))
            }
            Err(err) => {
                warn!(%id, error = %err, "update rejected");
                Err(err)
            }
        }
    }

    async fn delete(&self, id: TodoId) -> TodoResult<Ack> {
        self.simulate(Operation::Delete).await?;
        let result = self.store().delete(&id);
        match result {
            Ok(()) => {
                info!(%id, "todo deleted");
                Ok(Ack::ok("Todo deleted successfully"))
            }
            Err(err) => {
                warn!(%id, error = %err, "delete rejected");
                Err(err)
            }
        }
    }
}

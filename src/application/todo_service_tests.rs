#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::time::Instant;

    use super::super::failure::{AlwaysFail, FailurePolicy, NeverFail};
    use super::super::todo_service::{SimulatedTodoService, TodoService};
    use crate::config::{Delays, SimulationConfig};
    use crate::domain::error::{ErrorKind, Operation, TodoError};
    use crate::domain::todo::{CreateTodo, TodoId, UpdateTodo};
    use crate::infrastructure::memory_repo::InMemoryTodoRepository;

    /// Fails on the listed call numbers (0-based) only.
    #[derive(Default)]
    struct FailOn { calls: AtomicUsize, failing: Vec<usize> }

    impl FailurePolicy for FailOn {
        fn should_fail(&self) -> bool {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.failing.contains(&n)
        }
    }

    fn reliable() -> SimulatedTodoService<InMemoryTodoRepository, NeverFail> {
        SimulatedTodoService::new(InMemoryTodoRepository::seeded(), NeverFail, Delays::zero())
    }

    fn broken() -> SimulatedTodoService<InMemoryTodoRepository, AlwaysFail> {
        SimulatedTodoService::new(InMemoryTodoRepository::seeded(), AlwaysFail, Delays::zero())
    }

    #[tokio::test]
    async fn unit_create_and_list() {
        let service = reliable();
        let created = service.create(CreateTodo::new(" X ", " Y ").with_subtasks(["a", " ", "b"])).await.unwrap();
        assert!(created.success);
        assert_eq!(created.message, "Todo created successfully");
        assert_eq!(created.payload.title, "X");
        assert_eq!(created.payload.description, "Y");
        assert_eq!(created.payload.subtasks.len(), 2);

        let listed = service.get_all().await.unwrap();
        assert_eq!(listed.message, "Todos fetched successfully");
        assert_eq!(listed.payload.len(), 4);
        assert_eq!(listed.payload.last().unwrap().id, created.payload.id);
    }

    #[tokio::test]
    async fn unit_update_and_delete_envelopes() {
        let service = reliable();
        let id = service.snapshot()[0].id.clone();
        let updated = service.update(id.clone(), UpdateTodo::completed(true)).await.unwrap();
        assert!(updated.payload.completed);
        assert_eq!(updated.message, "Todo updated successfully");

        let ack = service.delete(id.clone()).await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.message, "Todo deleted successfully");
        assert!(service.snapshot().iter().all(|t| t.id != id));
    }

    #[tokio::test]
    async fn every_operation_fails_when_forced_and_store_is_untouched() {
        let service = broken();
        let before = service.snapshot();
        let id = before[0].id.clone();

        let errs = vec![
            service.get_all().await.unwrap_err(),
            service.create(CreateTodo::new("t", "d")).await.unwrap_err(),
            service.update(id.clone(), UpdateTodo::completed(true)).await.unwrap_err(),
            service.delete(id).await.unwrap_err(),
        ];
        let ops: Vec<Operation> = errs
            .iter()
            .map(|e| match e {
                TodoError::SimulatedTransport { operation, .. } => *operation,
                other => panic!("unexpected error {other:?}"),
            })
            .collect();
        assert_eq!(ops, vec![Operation::GetAll, Operation::Create, Operation::Update, Operation::Delete]);
        assert_eq!(errs[0].to_string(), "Failed to fetch todos. Please try again later.");
        assert_eq!(service.snapshot(), before);
    }

    #[tokio::test]
    async fn not_found_is_distinct_from_transport_failure() {
        let service = reliable();
        let before = service.snapshot();
        let missing = TodoId::from("missing");
        let err = service.update(missing.clone(), UpdateTodo::completed(true)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = service.delete(missing).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(service.snapshot(), before);
    }

    #[tokio::test]
    async fn validation_fails_before_reaching_failure_policy() {
        let policy = FailOn { failing: vec![0], ..Default::default() };
        let service = SimulatedTodoService::new(InMemoryTodoRepository::seeded(), policy, Delays::zero());
        let err = service.create(CreateTodo::new("   ", "d")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        // The policy was never consulted, so its first call still fails.
        let err = service.get_all().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SimulatedTransport);
        assert!(service.get_all().await.is_ok());
    }

    #[tokio::test]
    async fn store_recovers_after_failure() {
        let policy = FailOn { failing: vec![0], ..Default::default() };
        let service = SimulatedTodoService::new(InMemoryTodoRepository::new(), policy, Delays::zero());
        assert!(service.create(CreateTodo::new("a", "b")).await.is_err());
        assert!(service.snapshot().is_empty());
        assert!(service.create(CreateTodo::new("a", "b")).await.is_ok());
        assert_eq!(service.snapshot().len(), 1);
    }

    fn assert_waited(start: Instant, millis: u64) {
        let waited = start.elapsed();
        let expected = Duration::from_millis(millis);
        assert!(waited >= expected && waited < expected + Duration::from_millis(5), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn each_operation_waits_its_own_delay() {
        let delays = Delays {
            get_all: Duration::from_millis(800),
            create: Duration::from_millis(600),
            update: Duration::from_millis(500),
            delete: Duration::from_millis(400),
        };
        let service = SimulatedTodoService::new(InMemoryTodoRepository::seeded(), NeverFail, delays);

        let start = Instant::now();
        service.get_all().await.unwrap();
        assert_waited(start, 800);

        let start = Instant::now();
        let created = service.create(CreateTodo::new("t", "d")).await.unwrap();
        assert_waited(start, 600);

        let start = Instant::now();
        service.update(created.payload.id.clone(), UpdateTodo::completed(true)).await.unwrap();
        assert_waited(start, 500);

        let start = Instant::now();
        service.delete(created.payload.id).await.unwrap();
        assert_waited(start, 400);
    }

    #[tokio::test(start_paused = true)]
    async fn validation_error_is_immediate() {
        let service = SimulatedTodoService::new(InMemoryTodoRepository::seeded(), NeverFail, Delays::default());
        let start = Instant::now();
        let err = service.create(CreateTodo::new("t", "  ")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn configured_service_with_certain_failure() {
        let config = SimulationConfig { simulate_errors: true, error_rate: 1.0, rng_seed: Some(5), ..SimulationConfig::instant() };
        let service = SimulatedTodoService::from_config(InMemoryTodoRepository::seeded(), &config);
        for _ in 0..10 {
            assert_eq!(service.get_all().await.unwrap_err().kind(), ErrorKind::SimulatedTransport);
        }

        let config = SimulationConfig { simulate_errors: false, error_rate: 1.0, ..SimulationConfig::instant() };
        let service = SimulatedTodoService::from_config(InMemoryTodoRepository::seeded(), &config);
        assert!(service.get_all().await.is_ok());
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::todo::{SubtaskId, TodoId};

/// Mints `<millis>-<sequence>-<random>` identifiers.
///
/// The sequence makes ids unique for the generator's lifetime even when the
/// clock does not advance; the random tail keeps separate generators apart.
#[derive(Debug, Default)]
pub struct IdGenerator {
    seq: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self { Self::default() }

    pub fn next_raw(&self) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let millis = Utc::now().timestamp_millis();
        let random = Uuid::new_v4().simple().to_string();
        format!("{millis}-{seq}-{}", &random[..9])
    }

    pub fn todo_id(&self) -> TodoId { TodoId(self.next_raw()) }

    pub fn subtask_id(&self) -> SubtaskId { SubtaskId(format!("s-{}", self.next_raw())) }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_do_not_collide_within_a_burst() {
        let ids = IdGenerator::new();
        let minted: HashSet<String> = (0..10_000).map(|_| ids.next_raw()).collect();
        assert_eq!(minted.len(), 10_000);
    }

    #[test]
    fn subtask_ids_are_prefixed() {
        let ids = IdGenerator::new();
        assert!(ids.subtask_id().0.starts_with("s-"));
        assert!(!ids.todo_id().0.starts_with("s-"));
    }
}

use chrono::Utc;

use crate::domain::{
    error::{TodoError, TodoResult},
    repository::TodoRepository,
    todo::{materialize_subtasks, trim_drafts, CreateTodo, Subtask, Todo, TodoId, UpdateTodo},
};

use super::{id::IdGenerator, seed};

/// Process-local todo store, kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryTodoRepository {
    todos: Vec<Todo>,
    ids: IdGenerator,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self { Self::default() }

    /// Store pre-populated with the example records.
    pub fn seeded() -> Self {
        Self::with_todos(seed::example_todos(Utc::now()))
    }

    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self { todos, ids: IdGenerator::new() }
    }

    fn position(&self, id: &TodoId) -> TodoResult<usize> {
        self.todos
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| TodoError::NotFound(id.clone()))
    }
}

impl TodoRepository for InMemoryTodoRepository {
    fn list(&self) -> Vec<Todo> {
        self.todos.clone()
    }

    fn create(&mut self, input: CreateTodo) -> Todo {
        let now = Utc::now();
        let subtasks = input
            .subtasks
            .iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(|text| Subtask { id: self.ids.subtask_id(), text: text.to_string(), completed: false })
            .collect();
        let todo = Todo {
            id: self.ids.todo_id(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            completed: false,
            subtasks,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        };
        self.todos.push(todo.clone());
        todo
    }

    fn update(&mut self, id: &TodoId, input: UpdateTodo) -> TodoResult<Todo> {
        let idx = self.position(id)?;
        let ids = &self.ids;
        let todo = &mut self.todos[idx];

        if let Some(t) = input.title { todo.title = t.trim().to_string(); }
        if let Some(d) = input.description { todo.description = d.trim().to_string(); }
        if let Some(c) = input.completed { todo.completed = c; }
        if let Some(drafts) = input.subtasks {
            todo.subtasks = materialize_subtasks(trim_drafts(drafts), || ids.subtask_id());
        }
        if let Some(due) = input.due_date { todo.due_date = due; }
        // Never move backwards even if the wall clock does.
        todo.updated_at = Utc::now().max(todo.updated_at);

        Ok(todo.clone())
    }

    fn delete(&mut self, id: &TodoId) -> TodoResult<()> {
        let idx = self.position(id)?;
        self.todos.remove(idx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::todo::SubtaskDraft;

    #[test]
    fn create_appends_with_fresh_ids() {
        let mut repo = InMemoryTodoRepository::seeded();
        let before: Vec<TodoId> = repo.list().into_iter().map(|t| t.id).collect();
        let created = repo.create(CreateTodo::new("New", "Thing"));
        assert!(!before.contains(&created.id));
        assert!(!created.completed);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(repo.list().last().unwrap().id, created.id);
        assert_eq!(repo.list().len(), before.len() + 1);
    }

    #[test]
    fn create_builds_subtasks_from_texts() {
        let mut repo = InMemoryTodoRepository::new();
        let created = repo.create(CreateTodo::new("t", "d").with_subtasks(["a", " ", "b"]));
        let texts: Vec<_> = created.subtasks.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
        assert!(created.subtasks.iter().all(|s| !s.completed));
        assert_ne!(created.subtasks[0].id, created.subtasks[1].id);
    }

    #[test]
    fn update_touches_only_supplied_fields() {
        let mut repo = InMemoryTodoRepository::seeded();
        let original = repo.list()[0].clone();
        let updated = repo.update(&original.id, UpdateTodo::completed(true)).unwrap();
        assert!(updated.completed);
        assert!(updated.updated_at >= original.updated_at);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.title, original.title);
        assert_eq!(updated.description, original.description);
        assert_eq!(updated.subtasks, original.subtasks);
        assert_eq!(updated.due_date, original.due_date);
    }

    #[test]
    fn update_replaces_subtasks_wholesale() {
        let mut repo = InMemoryTodoRepository::seeded();
        let original = repo.list()[0].clone();
        let mut kept = SubtaskDraft::from(&original.subtasks[3]);
        kept.completed = true;
        let updated = repo
            .update(&original.id, UpdateTodo::subtasks(vec![kept, SubtaskDraft::new("extra")]))
            .unwrap();
        assert_eq!(updated.subtasks.len(), 2);
        assert_eq!(updated.subtasks[0].id, original.subtasks[3].id);
        assert!(updated.subtasks[0].completed);
        assert_eq!(updated.subtasks[1].text, "extra");
    }

    #[test]
    fn update_trims_text_and_drops_blank_subtasks() {
        let mut repo = InMemoryTodoRepository::seeded();
        let id = repo.list()[2].id.clone();
        let patch = UpdateTodo {
            title: Some("  padded  ".into()),
            description: Some("\tdesc ".into()),
            subtasks: Some(vec![SubtaskDraft::new("   "), SubtaskDraft::new(" y ")]),
            ..Default::default()
        };
        let updated = repo.update(&id, patch).unwrap();
        assert_eq!(updated.title, "padded");
        assert_eq!(updated.description, "desc");
        let texts: Vec<_> = updated.subtasks.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["y"]);
        assert_eq!(repo.list()[2], updated);
    }

    #[test]
    fn update_sets_and_clears_due_date() {
        let mut repo = InMemoryTodoRepository::seeded();
        let id = repo.list()[2].id.clone();
        let due = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let set = repo.update(&id, UpdateTodo { due_date: Some(Some(due)), ..Default::default() }).unwrap();
        assert_eq!(set.due_date, Some(due));
        let untouched = repo.update(&id, UpdateTodo::completed(false)).unwrap();
        assert_eq!(untouched.due_date, Some(due));
        let cleared = repo.update(&id, UpdateTodo { due_date: Some(None), ..Default::default() }).unwrap();
        assert_eq!(cleared.due_date, None);
    }

    #[test]
    fn missing_id_is_not_found_and_store_unchanged() {
        let mut repo = InMemoryTodoRepository::seeded();
        let before = repo.list();
        let missing = TodoId::from("nope");
        assert_eq!(repo.update(&missing, UpdateTodo::completed(true)), Err(TodoError::NotFound(missing.clone())));
        assert_eq!(repo.delete(&missing), Err(TodoError::NotFound(missing)));
        assert_eq!(repo.list(), before);
    }

    #[test]
    fn delete_removes_exactly_one() {
        let mut repo = InMemoryTodoRepository::seeded();
        let id = repo.list()[1].id.clone();
        repo.delete(&id).unwrap();
        let after = repo.list();
        assert_eq!(after.len(), 2);
        assert!(after.iter().all(|t| t.id != id));
    }

    #[test]
    fn list_is_a_stable_snapshot() {
        let repo = InMemoryTodoRepository::seeded();
        assert_eq!(repo.list(), repo.list());
    }

    #[test]
    fn completion_is_independent_of_subtasks() {
        let mut repo = InMemoryTodoRepository::seeded();
        let todo = repo.list()[0].clone();
        let updated = repo.update(&todo.id, UpdateTodo::completed(true)).unwrap();
        assert!(updated.completed);
        assert!(updated.subtasks.iter().any(|s| !s.completed));
    }
}

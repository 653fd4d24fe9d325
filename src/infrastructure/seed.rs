use chrono::{DateTime, Duration, Utc};

use crate::domain::todo::{Subtask, SubtaskId, Todo, TodoId};

/// Example records every fresh process starts with.
pub fn example_todos(now: DateTime<Utc>) -> Vec<Todo> {
    let day = Duration::days(1);
    vec![
        seeded(
            "1",
            "Complete React Assessment",
            "Build a comprehensive To-Do application using React and TypeScript",
            false,
            &[
                ("s1-1", "Set up project structure", true),
                ("s1-2", "Create TypeScript interfaces", true),
                ("s1-3", "Implement mock API", true),
                ("s1-4", "Build UI components", false),
                ("s1-5", "Add subtask functionality", false),
            ],
            now,
        ),
        seeded(
            "2",
            "Review TypeScript Best Practices",
            "Ensure all code follows strict TypeScript guidelines",
            true,
            &[("s2-1", "Check type definitions", true), ("s2-2", "Verify no any types", true)],
            now - day,
        ),
        seeded(
            "3",
            "Implement Error Handling",
            "Add proper error handling and user feedback mechanisms",
            false,
            &[],
            now - day * 2,
        ),
    ]
}

fn seeded(
    id: &str,
    title: &str,
    description: &str,
    completed: bool,
    subtasks: &[(&str, &str, bool)],
    at: DateTime<Utc>,
) -> Todo {
    Todo {
        id: TodoId::from(id),
        title: title.to_string(),
        description: description.to_string(),
        completed,
        subtasks: subtasks
            .iter()
            .map(|(sid, text, done)| Subtask { id: SubtaskId::from(*sid), text: text.to_string(), completed: *done })
            .collect(),
        due_date: None,
        created_at: at,
        updated_at: at,
    }
}

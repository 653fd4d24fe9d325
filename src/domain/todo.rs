use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::{TodoError, TodoResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TodoId(pub String);

impl TodoId {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for TodoId {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SubtaskId(pub String);

impl fmt::Display for SubtaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for SubtaskId {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: SubtaskId,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub subtasks: Vec<Subtask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Returns `(completed, total)` over the subtasks.
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        (done, self.subtasks.len())
    }

    /// Rounded share of completed subtasks, 0 when there are none.
    pub fn completion_percentage(&self) -> u8 {
        let (done, total) = self.subtask_progress();
        if total == 0 { return 0; }
        ((done as f64 / total as f64) * 100.0).round() as u8
    }

    /// A todo is overdue once its due day has fully passed and it is still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        if self.completed { return false; }
        matches!(self.due_date, Some(due) if due < today)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub subtasks: Vec<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl CreateTodo {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), ..Default::default() }
    }

    pub fn with_subtasks<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subtasks = texts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Trims every text field, drops blank subtasks and rejects a blank title or description.
    pub fn validate(self) -> TodoResult<Self> {
        Ok(Self {
            title: required("title", &self.title)?,
            description: required("description", &self.description)?,
            subtasks: self
                .subtasks
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            due_date: self.due_date,
        })
    }
}

/// Replacement entry for a todo's subtask list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubtaskDraft {
    #[serde(default)]
    pub id: Option<SubtaskId>,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl SubtaskDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: None, text: text.into(), completed: false }
    }
}

impl From<&Subtask> for SubtaskDraft {
    fn from(value: &Subtask) -> Self {
        Self { id: Some(value.id.clone()), text: value.text.clone(), completed: value.completed }
    }
}

/// Partial patch: `None` leaves a field untouched.
///
/// `due_date` is doubly optional so a caller can clear the date with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub subtasks: Option<Vec<SubtaskDraft>>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl UpdateTodo {
    pub fn completed(value: bool) -> Self {
        Self { completed: Some(value), ..Default::default() }
    }

    pub fn subtasks(drafts: Vec<SubtaskDraft>) -> Self {
        Self { subtasks: Some(drafts), ..Default::default() }
    }

    pub fn validate(self) -> TodoResult<Self> {
        let title = self.title.as_deref().map(|t| required("title", t)).transpose()?;
        let description = self
            .description
            .as_deref()
            .map(|d| required("description", d))
            .transpose()?;
        let subtasks = self.subtasks.map(trim_drafts);
        Ok(Self { title, description, completed: self.completed, subtasks, due_date: self.due_date })
    }
}

/// Trims draft texts and drops the ones left blank.
pub fn trim_drafts(drafts: Vec<SubtaskDraft>) -> Vec<SubtaskDraft> {
    drafts
        .into_iter()
        .filter_map(|d| {
            let text = d.text.trim();
            if text.is_empty() { None } else { Some(SubtaskDraft { text: text.to_string(), ..d }) }
        })
        .collect()
}

/// Builds the final subtask list for a todo, minting ids for new or clashing entries.
pub fn materialize_subtasks<F>(drafts: Vec<SubtaskDraft>, mut next_id: F) -> Vec<Subtask>
where
    F: FnMut() -> SubtaskId,
{
    let mut seen = HashSet::new();
    drafts
        .into_iter()
        .map(|d| {
            let id = match d.id {
                Some(id) if !seen.contains(&id) => id,
                _ => next_id(),
            };
            seen.insert(id.clone());
            Subtask { id, text: d.text, completed: d.completed }
        })
        .collect()
}

fn required(field: &'static str, value: &str) -> TodoResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TodoError::Validation { field, message: format!("{field} must not be empty") });
    }
    Ok(trimmed.to_string())
}

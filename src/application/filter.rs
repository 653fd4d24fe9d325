//! Client-side search over the todo list.
//!
//! Filtering is a pure single pass: text query, then completion status, then
//! the optional inclusive due-date window. Input order is preserved.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::todo::Todo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => todo.completed,
            StatusFilter::Pending => !todo.completed,
        }
    }

    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Completed => "Completed",
            StatusFilter::Pending => "Pending",
        }
    }
}

/// Inclusive day window; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self { Self { start, end } }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start.map_or(true, |s| day >= s) && self.end.map_or(true, |e| day <= e)
    }

    /// Parses `START..END` with `YYYY-MM-DD` bounds; either side may be blank.
    pub fn parse(input: &str) -> Result<Self, chrono::ParseError> {
        let (start, end) = input.split_once("..").unwrap_or((input, ""));
        let bound = |s: &str| -> Result<Option<NaiveDate>, chrono::ParseError> {
            let s = s.trim();
            if s.is_empty() { Ok(None) } else { NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some) }
        };
        Ok(Self { start: bound(start)?, end: bound(end)? })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub query: String,
    pub status: StatusFilter,
    /// `Some` activates the date filter even when both bounds are open.
    pub date_range: Option<DateRange>,
}

impl TodoFilter {
    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty() || self.status != StatusFilter::All || self.date_range.is_some()
    }

    pub fn matches(&self, todo: &Todo, needle: &str) -> bool {
        if !needle.is_empty()
            && !todo.title.to_lowercase().contains(needle)
            && !todo.description.to_lowercase().contains(needle)
        {
            return false;
        }
        if !self.status.matches(todo) { return false; }
        match (&self.date_range, todo.due_date) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(range), Some(due)) => range.contains(due),
        }
    }

    pub fn apply<'a, I>(&self, todos: I) -> Vec<Todo>
    where
        I: IntoIterator<Item = &'a Todo>,
    {
        let needle = self.query.trim().to_lowercase();
        todos.into_iter().filter(|t| self.matches(t, &needle)).cloned().collect()
    }
}

//! Pure derivation of the displayed subset: filter, sort, counts.
//!
//! Holds no state and never touches storage — callers hand in the list they
//! read from the store and get back what should be on screen.

use crate::model::{Priority, Todo};

// ── Filters ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

/// The three filters a view composes. All conjunctive.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub status: StatusFilter,
    pub priority: PriorityFilter,
    /// Case-insensitive substring over title, notes, tags, and priority.
    /// Empty or whitespace-only matches everything.
    pub search: String,
}

impl Query {
    pub fn matches(&self, todo: &Todo) -> bool {
        match self.status {
            StatusFilter::Active if todo.completed => return false,
            StatusFilter::Completed if !todo.completed => return false,
            _ => {}
        }
        if let PriorityFilter::Only(p) = self.priority {
            if todo.priority != p {
                return false;
            }
        }

        let term = self.search.trim().to_lowercase();
        if !term.is_empty() {
            let mut hay = String::new();
            hay.push_str(&todo.title);
            if let Some(notes) = &todo.notes {
                hay.push(' ');
                hay.push_str(notes);
            }
            for tag in &todo.tags {
                hay.push(' ');
                hay.push_str(tag);
            }
            hay.push(' ');
            hay.push_str(todo.priority.as_str());
            if !hay.to_lowercase().contains(&term) {
                return false;
            }
        }
        true
    }
}

// ── Derivation ─────────────────────────────────────────────────

/// Filter then sort: incomplete records first, then most recently created
/// first within each group. Missing creation timestamps sort as oldest.
pub fn visible<'a>(todos: &'a [Todo], query: &Query) -> Vec<&'a Todo> {
    let mut shown: Vec<&Todo> = todos.iter().filter(|t| query.matches(t)).collect();
    shown.sort_by(|a, b| {
        let ac = a.completed as u8;
        let bc = b.completed as u8;
        ac.cmp(&bc).then(b.created_ts().cmp(&a.created_ts()))
    });
    shown
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub active: usize,
    pub completed: usize,
}

pub fn counts(todos: &[Todo]) -> Counts {
    let active = todos.iter().filter(|t| !t.completed).count();
    Counts {
        active,
        completed: todos.len() - active,
    }
}

// ── Tests ──────────────────────────────────────────────────────

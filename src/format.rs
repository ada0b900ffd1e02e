//! Output formatting for task responses: JSON views and markdown.

use crate::types::{Category, Task, TaskTree, priority_label};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Output format for listing results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// How subtasks are rendered inside a task view.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Subtasks<'a> {
    /// The full recursive tree.
    Full(Vec<TaskView<'a>>),
    /// A short "[N subtasks]" marker instead of the tree.
    Summary(String),
}

/// Task as returned by the tool interface: the row, its priority label and
/// its subtasks.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub priority_label: &'static str,
    pub subtasks: Subtasks<'a>,
}

impl<'a> TaskView<'a> {
    /// View with the full subtask tree.
    pub fn full(tree: &'a TaskTree) -> Self {
        Self {
            task: &tree.task,
            priority_label: priority_label(tree.task.priority),
            subtasks: Subtasks::Full(tree.subtasks.iter().map(TaskView::full).collect()),
        }
    }

    /// View with subtasks collapsed to a count. No subtasks renders as `[]`.
    pub fn summary(tree: &'a TaskTree) -> Self {
        let subtasks = if tree.subtasks.is_empty() {
            Subtasks::Full(Vec::new())
        } else {
            Subtasks::Summary(format!("[{} subtasks]", tree.subtasks.len()))
        };
        Self {
            task: &tree.task,
            priority_label: priority_label(tree.task.priority),
            subtasks,
        }
    }

    /// View of a single row with no subtasks loaded.
    pub fn leaf(task: &'a Task) -> Self {
        Self {
            task,
            priority_label: priority_label(task.priority),
            subtasks: Subtasks::Full(Vec::new()),
        }
    }
}

/// Format a task tree as a markdown checklist, one indent level per depth.
fn push_task_markdown(md: &mut String, tree: &TaskTree, depth: usize) {
    let task = &tree.task;
    let indent = "  ".repeat(depth);
    let check = if task.completed { "x" } else { " " };

    md.push_str(&format!("{}- [{}] {} (`#{}`", indent, check, task.title, task.id));
    if task.archived {
        md.push_str(", archived");
    }
    if let Some(due) = task.due_date {
        md.push_str(&format!(", due {}", due.format("%Y-%m-%d")));
    }
    md.push(')');
    if let Some(ref tags) = task.hashtags {
        if !tags.trim().is_empty() {
            md.push_str(&format!(" {}", tags.trim()));
        }
    }
    md.push('\n');

    for child in &tree.subtasks {
        push_task_markdown(md, child, depth + 1);
    }
}

/// Format a task list as markdown, grouped by priority tier in list order.
pub fn format_tasks_markdown(trees: &[TaskTree], categories: &[Category]) -> String {
    let mut md = format!("# Tasks ({})\n", trees.len());

    let mut current_priority = None;
    for tree in trees {
        let priority = tree.task.priority;
        if current_priority != Some(priority) {
            md.push_str(&format!("\n## {}\n\n", priority_label(priority)));
            current_priority = Some(priority);
        }
        push_task_markdown(&mut md, tree, 0);
        if let Some(category_id) = tree.task.category_id {
            if let Some(category) = categories.iter().find(|c| c.id == category_id) {
                md.push_str(&format!("  - category: {}\n", category.name));
            }
        }
    }

    md
}

/// Wrap markdown text for a JSON tool response.
pub fn markdown_to_json(md: String) -> Value {
    json!({ "format": "markdown", "content": md })
}

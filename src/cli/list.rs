//! List subcommand: print the task list straight from the database.

use crate::config::Config;
use crate::db::Database;
use crate::format::{OutputFormat, TaskView, format_tasks_markdown};
use crate::types::{TaskFilter, parse_priority};
use anyhow::{Result, anyhow};
use clap::Args;

/// Arguments for the list subcommand
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only tasks in this category
    #[arg(long, value_name = "ID")]
    pub category: Option<i64>,

    /// Case-insensitive match on title, description or hashtags
    #[arg(short, long)]
    pub search: Option<String>,

    /// Include archived tasks
    #[arg(long)]
    pub show_archived: bool,

    /// Only this priority: high, normal, low or 0-2
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Print markdown instead of JSON
    #[arg(long)]
    pub markdown: bool,
}

impl ListArgs {
    pub fn to_filter(&self) -> Result<TaskFilter> {
        let priority = match self.priority {
            Some(ref p) => Some(
                parse_priority(p).ok_or_else(|| anyhow!("Unknown priority '{}'", p))?,
            ),
            None => None,
        };
        Ok(TaskFilter {
            category_id: self.category,
            search: self.search.clone(),
            show_archived: self.show_archived,
            priority,
        })
    }

    pub fn format(&self, config: &Config) -> OutputFormat {
        if self.markdown {
            OutputFormat::Markdown
        } else {
            config.server.default_format
        }
    }
}

/// Render the list for `args`.
pub fn render_list(db: &Database, args: &ListArgs, format: OutputFormat) -> Result<String> {
    let trees = db.list_task_trees(&args.to_filter()?)?;

    match format {
        OutputFormat::Markdown => Ok(format_tasks_markdown(&trees, &db.list_categories()?)),
        OutputFormat::Json => {
            let views: Vec<TaskView> = trees.iter().map(TaskView::full).collect();
            Ok(serde_json::to_string_pretty(&views)?)
        }
    }
}

/// Run the list subcommand against the configured database.
pub fn run_list(config: &Config, args: &ListArgs) -> Result<()> {
    let db = Database::open(&config.server.db_path)?;
    println!("{}", render_list(&db, args, args.format(config))?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewTask;

    fn args() -> ListArgs {
        ListArgs {
            category: None,
            search: None,
            show_archived: false,
            priority: None,
            markdown: false,
        }
    }

    #[test]
    fn test_bad_priority_is_error() {
        let mut args = args();
        args.priority = Some("urgent".into());
        assert!(args.to_filter().is_err());

        args.priority = Some("LOW".into());
        assert_eq!(args.to_filter().unwrap().priority, Some(2));
    }

    #[test]
    fn test_render_json_and_markdown() {
        let db = Database::open_in_memory().unwrap();
        db.create_task(NewTask::new("Water plants").with_priority(0)).unwrap();

        let json = render_list(&db, &args(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["title"], "Water plants");
        assert_eq!(value[0]["priority_label"], "High");

        let md = render_list(&db, &args(), OutputFormat::Markdown).unwrap();
        assert!(md.contains("- [ ] Water plants"));
    }
}

use chrono::{DateTime, Local};
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};
use todos_core::{Filter, Stats, Task};
use unicode_width::UnicodeWidthStr;

const MAX_TEXT_WIDTH: usize = 60;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Todo")]
    text: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        let created: DateTime<Local> = DateTime::from(task.created_at);
        TaskRow {
            id: task.id.short(),
            done: if task.completed { "x" } else { "" },
            text: truncate(task.text.as_str(), MAX_TEXT_WIDTH),
            created: created.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}

/// Renders `tasks` matching `filter` as a table followed by a summary line.
pub fn render(tasks: &[Task], filter: Filter) -> String {
    let stats = Stats::of(tasks);
    let rows: Vec<TaskRow> = tasks
        .iter()
        .filter(|t| filter.matches(t.completed))
        .map(TaskRow::from)
        .collect();

    let summary = format!(
        "{} total, {} active, {} completed",
        stats.total, stats.active, stats.completed
    );
    if rows.is_empty() {
        let message = if tasks.is_empty() {
            "No todos yet."
        } else {
            "No todos match the current filter."
        };
        return format!("{}\n{}", message, summary);
    }

    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    format!("{}\n{}", table, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use todos_core::TaskText;

    fn task(text: &str, completed: bool) -> Task {
        let mut task = Task::new(TaskText::parse(text).unwrap());
        task.completed = completed;
        task
    }

    #[test]
    fn lists_short_ids_and_summary() {
        let open = task("Buy milk", false);
        let done = task("Walk dog", true);
        let out = render(&[open.clone(), done], Filter::All);

        assert!(out.contains(&open.id.short()));
        assert!(out.contains("Buy milk"));
        assert!(out.contains("Walk dog"));
        assert!(out.ends_with("2 total, 1 active, 1 completed"));
    }

    #[rstest]
    #[case(Filter::Active, "Buy milk", "Walk dog")]
    #[case(Filter::Completed, "Walk dog", "Buy milk")]
    fn applies_filter(#[case] filter: Filter, #[case] shown: &str, #[case] hidden: &str) {
        let out = render(&[task("Buy milk", false), task("Walk dog", true)], filter);
        assert!(out.contains(shown));
        assert!(!out.contains(hidden));
    }

    #[test]
    fn empty_states() {
        assert!(render(&[], Filter::All).starts_with("No todos yet."));
        let out = render(&[task("open", false)], Filter::Completed);
        assert!(out.starts_with("No todos match the current filter."));
    }

    #[test]
    fn long_text_is_truncated() {
        let long = "x".repeat(100);
        let cut = truncate(&long, 10);
        assert_eq!(cut.width(), 10);
        assert!(cut.ends_with('…'));
        assert_eq!(truncate("short", 10), "short");
    }
}

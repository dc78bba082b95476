mod api;
mod dispatch;
mod listing;
mod logging;
mod state;
mod tui;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::runtime::Runtime;
use todos_core::{
    expand_key, join_words, resolve_id, Config, Filter, Task, TaskId, TaskPatch, TaskText,
};

use crate::api::TodoApi;

#[derive(Parser)]
#[command(name = "todos")]
#[command(about = "Terminal client for the todo API", long_about = None)]
struct Cli {
    /// Base URL of the todo API (overrides TODOS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List todos
    List {
        /// all, active or completed (prefixes accepted)
        #[arg(short, long, default_value = "all")]
        filter: String,
    },
    /// Add a todo (usage: add Buy milk)
    Add {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        words: Vec<String>,
    },
    /// Flip a todo between active and completed
    Toggle {
        /// Id or unique id prefix, as shown by `list`
        id: String,
    },
    /// Replace a todo's text
    Edit {
        id: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        words: Vec<String>,
    },
    /// Delete a todo
    Rm { id: String },
    /// Delete every completed todo
    ClearCompleted,
    /// Open the Terminal User Interface
    Tui,
}

const FILTER_NAMES: [&str; 3] = ["all", "active", "completed"];

fn parse_filter(raw: &str) -> Result<Filter> {
    if let Ok(filter) = raw.parse::<Filter>() {
        return Ok(filter);
    }
    let name = expand_key(&raw.to_lowercase(), &FILTER_NAMES)?;
    name.parse::<Filter>().map_err(anyhow::Error::msg)
}

async fn resolve(api: &TodoApi, raw: &str) -> Result<(TaskId, Vec<Task>)> {
    let tasks = api.list().await?;
    let id = resolve_id(raw, &tasks)?;
    Ok((id, tasks))
}

async fn run_command(api: TodoApi, command: Commands) -> Result<()> {
    match command {
        Commands::List { filter } => {
            let filter = parse_filter(&filter)?;
            let tasks = api.list().await?;
            println!("{}", listing::render(&tasks, filter));
        }
        Commands::Add { words } => {
            let text = TaskText::parse(&join_words(&words))?;
            let task = api.create(&text).await?;
            println!("Todo added: {} (ID: {})", task.text, task.id.short());
        }
        Commands::Toggle { id } => {
            let (id, tasks) = resolve(&api, &id).await?;
            let completed = tasks.iter().find(|t| t.id == id).is_some_and(|t| !t.completed);
            let task = api.update(&id, &TaskPatch::completed(completed)).await?;
            let state = if task.completed { "completed" } else { "active" };
            println!("Todo {} is now {}: {}", task.id.short(), state, task.text);
        }
        Commands::Edit { id, words } => {
            let text = TaskText::parse(&join_words(&words))?;
            let (id, _) = resolve(&api, &id).await?;
            let task = api.update(&id, &TaskPatch::text(text)).await?;
            println!("Todo updated: {} (ID: {})", task.text, task.id.short());
        }
        Commands::Rm { id } => {
            let (id, _) = resolve(&api, &id).await?;
            api.delete(&id).await?;
            println!("Todo deleted: {}", id.short());
        }
        Commands::ClearCompleted => {
            let ids: Vec<TaskId> = api
                .list()
                .await?
                .into_iter()
                .filter(|t| t.completed)
                .map(|t| t.id)
                .collect();
            if ids.is_empty() {
                println!("No completed todos.");
                return Ok(());
            }

            let results = api.delete_many(&ids).await;
            let mut failed = 0;
            for (id, result) in &results {
                if let Err(error) = result {
                    failed += 1;
                    eprintln!("Failed to delete {}: {}", id.short(), error);
                }
            }
            println!("Cleared {} of {} completed todos.", results.len() - failed, results.len());
            if failed > 0 {
                bail!("{} deletes failed", failed);
            }
        }
        Commands::Tui => bail!("the TUI cannot run as a one-shot command"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    let api_url = match cli.api_url {
        Some(url) => url,
        None => config.api_url()?,
    };
    let api = TodoApi::new(api_url);
    let runtime = Runtime::new().context("Failed to start async runtime")?;

    match cli.command {
        None | Some(Commands::Tui) => {
            let log_path = logging::init_file(&config.data_dir()?)?;
            tui::run(api, runtime.handle().clone())
                .with_context(|| format!("TUI failed; see {}", log_path.display()))
        }
        Some(command) => {
            logging::init_stderr()?;
            runtime.block_on(run_command(api, command))
        }
    }
}

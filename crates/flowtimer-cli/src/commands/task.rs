//! Task management commands for CLI.

use clap::Subcommand;

use super::{format_duration, open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task name
        name: String,
        /// Time goal in minutes
        #[arg(long)]
        goal: Option<u64>,
    },
    /// List tasks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a task. Recorded sessions keep the old name.
    Rename {
        /// Task ID
        id: String,
        /// New name
        name: String,
    },
    /// Delete a task. Recorded sessions are kept.
    Delete {
        /// Task ID
        id: String,
    },
    /// Choose the task new sessions are attributed to
    Select {
        /// Task ID
        id: Option<String>,
        /// Clear the active task
        #[arg(long, conflicts_with = "id")]
        clear: bool,
    },
    /// Recently used task names
    Suggestions,
}

pub fn run(action: TaskAction) -> CliResult {
    let mut engine = open_engine()?;

    match action {
        TaskAction::Add { name, goal } => {
            let task = engine.add_task(&name, goal.map(|m| m.saturating_mul(60)))?;
            eprintln!("Task created: {}", task.id);
            print_json(&task)?;
        }
        TaskAction::List { json } => {
            let tasks = engine.tasks().tasks();
            if json {
                return print_json(tasks);
            }
            if tasks.is_empty() {
                eprintln!("No tasks");
                return Ok(());
            }
            let active_id = engine.active_task().map(|t| t.id.clone());
            for task in tasks {
                let marker = if Some(&task.id) == active_id.as_ref() { "*" } else { " " };
                let goal = match (task.estimated_goal, task.goal_progress()) {
                    (Some(goal), Some(progress)) => format!(
                        "  / {} ({:.0}%)",
                        format_duration(goal),
                        progress * 100.0
                    ),
                    _ => String::new(),
                };
                println!(
                    "{marker} {}  {}  {}{goal}",
                    task.id,
                    task.name,
                    format_duration(task.time_spent_total)
                );
            }
        }
        TaskAction::Rename { id, name } => {
            let task = engine.rename_task(&id, &name)?;
            print_json(&task)?;
        }
        TaskAction::Delete { id } => {
            let task = engine.delete_task(&id)?;
            eprintln!("Task deleted: {}", task.id);
        }
        TaskAction::Select { id, clear } => {
            if clear {
                engine.select_task(None)?;
                eprintln!("Active task cleared");
            } else if let Some(id) = id {
                engine.select_task(Some(&id))?;
                eprintln!("Active task: {id}");
            } else {
                match engine.active_task() {
                    Some(task) => print_json(task)?,
                    None => println!("null"),
                }
            }
        }
        TaskAction::Suggestions => {
            for name in engine.tasks().suggestions() {
                println!("{name}");
            }
        }
    }
    Ok(())
}

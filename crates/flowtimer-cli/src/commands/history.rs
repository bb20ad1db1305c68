use clap::Subcommand;

use super::{format_duration, open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded sessions
    List {
        /// Only sessions on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Time per task today
    Today {
        #[arg(long)]
        json: bool,
    },
    /// Totals over a date range (inclusive)
    Summary {
        /// First date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Last date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: HistoryAction) -> CliResult {
    let engine = open_engine()?;
    let history = engine.history();

    match action {
        HistoryAction::List { date, json } => {
            let sessions: Vec<_> = match &date {
                Some(day) => history.sessions_on(day).collect(),
                None => history.sessions().iter().collect(),
            };
            if json {
                return print_json(&sessions);
            }
            for s in sessions {
                println!(
                    "{}  {}  {}",
                    s.date_key(),
                    format_duration(s.duration_seconds()),
                    s.task_name()
                );
            }
        }
        HistoryAction::Today { json } => {
            let totals = engine.today_totals();
            if json {
                return print_json(&totals);
            }
            if totals.is_empty() {
                eprintln!("No sessions today");
            }
            for t in &totals {
                println!(
                    "{:>12}  {:>3}x  {}",
                    format_duration(t.seconds),
                    t.sessions,
                    t.task_name
                );
            }
        }
        HistoryAction::Summary { from, to, json } => {
            let summary = history.summary(from.as_deref(), to.as_deref());
            if json {
                return print_json(&summary);
            }
            if let Some((first, last)) = &summary.period {
                println!("Period: {first} to {last}");
            }
            println!("Total Sessions: {}", summary.total_sessions);
            println!("Total Time: {}", format_duration(summary.total_seconds));
            println!("Unique Tasks: {}", summary.unique_tasks);
            println!(
                "Average Session Time: {}",
                format_duration(summary.average_session_seconds)
            );
            println!(
                "Longest Session: {}",
                format_duration(summary.longest_session_seconds)
            );
        }
    }
    Ok(())
}

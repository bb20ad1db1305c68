use std::io::Write;

use clap::Subcommand;
use flowtimer_core::storage::Database;
use flowtimer_core::timer::FRAME_INTERVAL;
use flowtimer_core::{Event, TimerEngine, TimerMode};

use super::{format_clock, open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a work period
    Start,
    /// Stop the work period and record it
    Stop,
    /// Discard the current work or break without recording
    Reset,
    /// End the current break early
    SkipBreak,
    /// Print current timer state as JSON
    Status,
    /// Follow the running timer until it goes idle or Ctrl-C
    Watch {
        /// Print events as JSON lines instead of a live display
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: TimerAction) -> CliResult {
    let mut engine = open_engine()?;

    // Transitions applied while loading a stale snapshot come first.
    if !matches!(action, TimerAction::Watch { .. }) {
        for event in engine.recovery_events() {
            print_json(event)?;
        }
    }
    let events = match action {
        TimerAction::Start => engine.start(),
        TimerAction::Stop => engine.stop(),
        TimerAction::Reset => engine.reset(),
        TimerAction::SkipBreak => engine.skip_break(),
        TimerAction::Status => {
            for event in engine.tick() {
                print_json(&event)?;
            }
            return print_json(&engine.snapshot());
        }
        TimerAction::Watch { json } => return watch(&mut engine, json),
    };

    if events.is_empty() {
        tracing::debug!(mode = ?engine.mode(), "command had no effect");
        return print_json(&engine.snapshot());
    }
    for event in &events {
        print_json(event)?;
    }
    Ok(())
}

fn watch(engine: &mut TimerEngine<Database>, json: bool) -> CliResult {
    print_events(engine.recovery_events(), json)?;
    if engine.next_frame().is_none() {
        eprintln!("timer is idle");
        return Ok(());
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch_loop(engine, json))
}

/// Frame loop. Another process may drive the same store (e.g. `timer stop`
/// from a second shell); a changed store version triggers a resync before
/// the next frame.
async fn watch_loop(engine: &mut TimerEngine<Database>, json: bool) -> CliResult {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut seen_version = engine.store_version();

    while engine.next_frame().is_some() {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(FRAME_INTERVAL) => {}
        }

        let mut events = Vec::new();
        let version = engine.store_version();
        if version != seen_version {
            tracing::debug!(?seen_version, ?version, "store changed by another writer");
            events.extend(engine.resync());
            seen_version = version;
        }
        if let Some(handle) = engine.next_frame() {
            events.extend(engine.frame(handle));
        }

        print_events(&events, json)?;
        if !json {
            print!("\r\x1b[2K{}", status_line(engine));
            std::io::stdout().flush()?;
        }
    }

    if !json {
        println!();
    }
    Ok(())
}

/// One JSON line or one human-readable line per event.
fn print_events(events: &[Event], json: bool) -> CliResult {
    for event in events {
        if json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            print!("\r\x1b[2K");
            println!("{}", describe(event));
        }
    }
    Ok(())
}

fn status_line(engine: &TimerEngine<Database>) -> String {
    let secs = engine.display_seconds();
    let mut line = match engine.mode() {
        TimerMode::Idle => "idle".to_string(),
        TimerMode::Working if engine.pomodoro().is_some() => format!("working  {} left", format_clock(secs)),
        TimerMode::Working => format!(
            "working  {}  (break ~{})",
            format_clock(secs),
            format_clock(engine.estimated_break_time())
        ),
        TimerMode::Break => format!("break    {} left", format_clock(secs)),
    };
    if let Some(p) = engine.pomodoro() {
        line.push_str(&format!("  [{}/{}]", p.current_cycle, p.total_cycles));
    }
    if let Some(task) = engine.active_task() {
        line.push_str(&format!("  {}", task.name));
    }
    line
}

fn describe(event: &Event) -> String {
    match event {
        Event::SessionRecorded { session, .. } => format!(
            "recorded {} ({})",
            session.task_name(),
            super::format_duration(session.duration_seconds())
        ),
        Event::BreakStarted { duration_secs, .. } => {
            format!("break started ({})", super::format_duration(*duration_secs))
        }
        Event::BreakCompleted { .. } => "break over".to_string(),
        Event::BreakSkipped { .. } => "break skipped".to_string(),
        Event::CycleStarted { cycle, total_cycles, .. } => {
            format!("cycle {cycle}/{total_cycles} started")
        }
        Event::PomodoroCompleted { total_cycles, .. } => {
            format!("all {total_cycles} cycles complete")
        }
        Event::TimerStarted { .. } => "timer started".to_string(),
        Event::TimerReset { .. } => "timer reset".to_string(),
        Event::Recovered { from, to, .. } => format!("resynced ({from:?} -> {to:?})"),
        Event::StateSnapshot { .. } => String::new(),
    }
}

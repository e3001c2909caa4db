//! Interactive countdown.
//!
//! Commands are read line by line from stdin while the driver ticks in the
//! background; the status line is redrawn on every state change.

use std::io::Write;

use clap::Args;
use pomotick_core::driver::{self, IntervalTicks};
use pomotick_core::{ConfigPatch, JsonFileStore, Pomodoro, SessionType, TimerCommand, TimerSnapshot, TimerState};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::notify::BellNotifier;
use crate::render;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Session to begin with (work, short, long)
    #[arg(long)]
    pub session: Option<SessionType>,
    /// Start counting down immediately
    #[arg(long)]
    pub autostart: bool,
    /// Print one line per change instead of redrawing in place
    #[arg(long)]
    pub plain: bool,
}

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(TimerCommand),
    /// Start, pause or resume depending on the current state.
    Toggle,
    Status,
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  <enter> | toggle        start / pause / resume
  start | pause | resume  explicit control
  reset                   abandon the current session
  switch <work|short|long>  choose the next session (idle only)
  set <key> <value>       change a duration, e.g. `set work 30`
  defaults                restore default durations
  status                  print the state as JSON
  quit";

pub fn parse_line(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Input::Toggle);
    };
    let rest: Vec<&str> = words.collect();

    let input = match (verb.to_lowercase().as_str(), rest.as_slice()) {
        ("toggle" | "t", []) => Input::Toggle,
        ("start" | "s", []) => Input::Command(TimerCommand::Start),
        ("pause" | "p", []) => Input::Command(TimerCommand::Pause),
        ("resume" | "r", []) => Input::Command(TimerCommand::Resume),
        ("reset", []) => Input::Command(TimerCommand::Reset),
        ("defaults", []) => Input::Command(TimerCommand::ResetConfig),
        ("switch", words) if !words.is_empty() => {
            let session_type: SessionType =
                words.join(" ").parse().map_err(|e| format!("{e}"))?;
            Input::Command(TimerCommand::SwitchSession { session_type })
        }
        ("set", [key, value]) => {
            let patch = ConfigPatch::parse_field(key, value).map_err(|e| format!("{e}"))?;
            Input::Command(TimerCommand::UpdateConfig { patch })
        }
        ("status", []) => Input::Status,
        ("help" | "?" | "h", []) => Input::Help,
        ("quit" | "q" | "exit", []) => Input::Quit,
        _ => return Err(format!("unrecognised input: {line:?} (type `help`)")),
    };
    Ok(input)
}

/// Command behind the single main button.
pub fn toggle_command(state: TimerState) -> TimerCommand {
    match state {
        TimerState::Idle => TimerCommand::Start,
        TimerState::Running => TimerCommand::Pause,
        TimerState::Paused => TimerCommand::Resume,
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_interactive(args))
}

async fn run_interactive(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut pomodoro = Pomodoro::load(JsonFileStore::open()?);
    pomodoro.subscribe(BellNotifier::new(std::io::stdout()));
    if let Some(session_type) = args.session {
        pomodoro.switch_session(session_type);
    }
    if args.autostart {
        pomodoro.start();
    }

    let (handle, task) = driver::spawn(pomodoro, IntervalTicks::every_second);
    let mut state = handle.watch();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    println!("{HELP}");
    draw(&handle.current(), args.plain)?;

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *state.borrow_and_update();
                draw(&snapshot, args.plain)?;
                // Without stdin nobody can restart us; stop once the session ends.
                if !stdin_open && snapshot.lifecycle != TimerState::Running {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    if handle.current().lifecycle != TimerState::Running {
                        break;
                    }
                    continue;
                };
                match parse_line(&line) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Help) => println!("{HELP}"),
                    Ok(Input::Status) => {
                        let snapshot = handle.snapshot().await?;
                        println!("{}", serde_json::to_string_pretty(&snapshot)?);
                    }
                    Ok(Input::Toggle) => {
                        let command = toggle_command(handle.current().lifecycle);
                        handle.command(command).await?;
                        let latest = *state.borrow_and_update();
                        draw(&latest, args.plain)?;
                    }
                    Ok(Input::Command(command)) => {
                        let outcome = handle.execute(command).await?;
                        if !outcome.accepted() {
                            println!(
                                "(nothing to do while {})",
                                render::lifecycle_label(outcome.snapshot.lifecycle)
                            );
                        }
                        let latest = *state.borrow_and_update();
                        draw(&latest, args.plain)?;
                    }
                    Err(message) => eprintln!("{message}"),
                }
            }
        }
    }

    handle.shutdown().await?;
    let pomodoro = task.await?;
    println!();
    tracing::info!(
        completed = pomodoro.snapshot().completed_work_sessions_total,
        "timer stopped"
    );
    Ok(())
}

fn draw(snapshot: &TimerSnapshot, plain: bool) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    if plain {
        writeln!(out, "{}", render::status_line(snapshot))?;
    } else {
        write!(
            out,
            "\x1b]0;{}\x07\r\x1b[2K{}",
            render::window_title(snapshot),
            render::status_line(snapshot)
        )?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_toggles() {
        assert_eq!(parse_line("").unwrap(), Input::Toggle);
        assert_eq!(parse_line("   ").unwrap(), Input::Toggle);
    }

    #[test]
    fn parses_control_words() {
        assert_eq!(parse_line("start").unwrap(), Input::Command(TimerCommand::Start));
        assert_eq!(parse_line("P").unwrap(), Input::Command(TimerCommand::Pause));
        assert_eq!(parse_line("q").unwrap(), Input::Quit);
    }

    #[test]
    fn parses_switch() {
        assert_eq!(
            parse_line("switch short break").unwrap(),
            Input::Command(TimerCommand::SwitchSession {
                session_type: SessionType::ShortBreak
            })
        );
        assert!(parse_line("switch lunch").is_err());
        assert!(parse_line("switch").is_err());
    }

    #[test]
    fn set_validates_at_the_boundary() {
        assert_eq!(
            parse_line("set work 30").unwrap(),
            Input::Command(TimerCommand::UpdateConfig {
                patch: ConfigPatch {
                    work_duration: Some(30),
                    ..ConfigPatch::default()
                }
            })
        );
        assert!(parse_line("set work 0").is_err());
        assert!(parse_line("set work -1").is_err());
        assert!(parse_line("set work ten").is_err());
        assert!(parse_line("set work 121").is_err());
        assert!(parse_line("set colour blue").is_err());
    }

    #[test]
    fn toggle_follows_main_button() {
        assert_eq!(toggle_command(TimerState::Idle), TimerCommand::Start);
        assert_eq!(toggle_command(TimerState::Running), TimerCommand::Pause);
        assert_eq!(toggle_command(TimerState::Paused), TimerCommand::Resume);
    }
}

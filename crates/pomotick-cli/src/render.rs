//! Terminal presentation. Pure functions of a snapshot.

use pomotick_core::{TimerSnapshot, TimerState};

/// `MM:SS`; minutes grow past two digits when needed.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// One dot per work session in the cycle, filled for those done.
pub fn cycle_dots(snapshot: &TimerSnapshot) -> String {
    let cadence = snapshot.configuration.cadence();
    let done = snapshot.cycle_position();
    (0..cadence)
        .map(|i| if i < done { '●' } else { '○' })
        .collect()
}

/// Elapsed share of the session as a `width`-cell bar, rounded down.
pub fn progress_bar(snapshot: &TimerSnapshot, width: usize) -> String {
    let filled = ((snapshot.progress() * width as f64) as usize).min(width);
    "█".repeat(filled) + &"░".repeat(width - filled)
}

pub fn lifecycle_label(state: TimerState) -> &'static str {
    match state {
        TimerState::Idle => "idle",
        TimerState::Running => "running",
        TimerState::Paused => "paused",
    }
}

/// `[Work] 12:30 █████░░░░░  ●●○○ 2/4  total 6  (running)`
pub fn status_line(snapshot: &TimerSnapshot) -> String {
    format!(
        "[{}] {} {}  {} {}/{}  total {}  ({})",
        snapshot.session_type,
        format_clock(snapshot.remaining_seconds),
        progress_bar(snapshot, 10),
        cycle_dots(snapshot),
        snapshot.cycle_position(),
        snapshot.configuration.cadence(),
        snapshot.completed_work_sessions_total,
        lifecycle_label(snapshot.lifecycle),
    )
}

/// Terminal window title, e.g. `24:59 - Work | Pomodoro Timer`.
pub fn window_title(snapshot: &TimerSnapshot) -> String {
    format!(
        "{} - {} | Pomodoro Timer",
        format_clock(snapshot.remaining_seconds),
        snapshot.session_type
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomotick_core::{Configuration, TimerEngine};

    #[test]
    fn clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(7200), "120:00");
    }

    #[test]
    fn status_line_for_fresh_timer() {
        let snapshot = TimerEngine::new(Configuration::default()).snapshot();
        assert_eq!(
            status_line(&snapshot),
            "[Work] 25:00 ░░░░░░░░░░  ○○○○ 0/4  total 0  (idle)"
        );
        assert_eq!(window_title(&snapshot), "25:00 - Work | Pomodoro Timer");
    }

    #[test]
    fn bar_fills_with_elapsed_time() {
        let mut engine = TimerEngine::new(Configuration {
            work_duration: 1,
            ..Configuration::default()
        });
        engine.start();
        for _ in 0..30 {
            engine.tick();
        }
        let snapshot = engine.snapshot();
        assert_eq!(progress_bar(&snapshot, 10), "█████░░░░░");
        assert!(status_line(&snapshot).starts_with("[Work] 00:30 █████░░░░░  ○○○○"));
        engine.tick();
        assert_eq!(progress_bar(&engine.snapshot(), 4), "██░░");
    }

    #[test]
    fn dots_fill_with_cycle_progress() {
        let mut engine = TimerEngine::new(Configuration {
            work_duration: 1,
            short_break_duration: 1,
            long_break_duration: 1,
            sessions_before_long_break: 3,
        });
        engine.start();
        for _ in 0..60 {
            engine.tick();
        }
        assert_eq!(cycle_dots(&engine.snapshot()), "●○○");
    }
}

use std::io::Write;

use pomotick_core::{Event, SessionListener};

/// Rings the terminal bell once per completed session.
pub struct BellNotifier<W> {
    out: W,
}

impl<W: Write + Send> BellNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> SessionListener for BellNotifier<W> {
    fn on_event(&mut self, event: &Event) {
        if let Event::SessionCompleted {
            previous_type,
            next_type,
            ..
        } = event
        {
            let written = write!(
                self.out,
                "\x07\n{previous_type} complete - next: {next_type}\n"
            )
            .and_then(|()| self.out.flush());
            if let Err(e) = written {
                tracing::warn!(error = %e, "could not play completion notification");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pomotick_core::SessionType;

    #[test]
    fn rings_only_on_completion() {
        let mut notifier = BellNotifier::new(Vec::new());
        notifier.on_event(&Event::TimerPaused {
            remaining_secs: 10,
            at: Utc::now(),
        });
        assert!(notifier.out.is_empty());

        notifier.on_event(&Event::SessionCompleted {
            previous_type: SessionType::Work,
            next_type: SessionType::LongBreak,
            completed_in_cycle: 4,
            completed_total: 4,
            at: Utc::now(),
        });
        let text = String::from_utf8(notifier.out).unwrap();
        assert_eq!(text.matches('\x07').count(), 1);
        assert!(text.contains("Work complete - next: Long Break"));
    }
}

mod engine;
mod session;

pub use engine::{TimerEngine, TimerSnapshot, TimerState};
pub use session::SessionType;

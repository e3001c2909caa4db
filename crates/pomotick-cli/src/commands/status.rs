use pomotick_core::{JsonFileStore, Pomodoro};

/// Print the state a new timer would start in, as JSON.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pomodoro = Pomodoro::load(JsonFileStore::open()?);
    println!("{}", serde_json::to_string_pretty(&pomodoro.snapshot())?);
    Ok(())
}

use clap::Subcommand;
use pomotick_core::{ConfigKey, ConfigPatch, ConfigStore, JsonFileStore};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "workDuration", "short_break_duration", "cadence")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value (whole minutes, or a session count for the cadence)
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file path
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let persistence = JsonFileStore::open()?;

    match action {
        ConfigAction::Get { key } => {
            let key: ConfigKey = key.parse()?;
            let store = ConfigStore::load(persistence);
            println!("{}", store.current().get(key));
        }
        ConfigAction::Set { key, value } => {
            // Validate before touching the store; a bad value changes nothing.
            let patch = ConfigPatch::parse_field(&key, &value)?;
            let mut store = ConfigStore::load(persistence);
            store.update(&patch)?;
            println!("ok");
        }
        ConfigAction::List => {
            let store = ConfigStore::load(persistence);
            println!("{}", serde_json::to_string_pretty(&store.current())?);
        }
        ConfigAction::Reset => {
            let mut store = ConfigStore::load(persistence);
            store.reset();
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", persistence.path().display());
        }
    }
    Ok(())
}

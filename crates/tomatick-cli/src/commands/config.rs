use clap::Subcommand;
use tomatick_core::{AppConfig, ConfigError, Settings};

use crate::session::Session;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a setting
    Get {
        /// Setting key (e.g. "work_minutes", "pomodoros_per_long_break")
        key: String,
    },
    /// Set a setting. Stops the timer and restarts the current stage.
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// List all settings
    List,
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: ConfigAction, app_config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(app_config)?;
    let engine = &mut session.engine;

    match action {
        ConfigAction::Get { key } => match engine.settings().get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(ConfigError::UnknownKey(key).into()),
        },
        ConfigAction::Set { key, value } => {
            let updated = engine.settings().with(&key, &value)?;
            let event = engine.apply_settings(updated)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(engine.settings())?);
        }
        ConfigAction::Reset => {
            let event = engine.apply_settings(Settings::default())?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }

    session.close();
    Ok(())
}

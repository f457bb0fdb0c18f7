pub mod settings;
pub mod tasks;

pub use settings::{SettingsCommands, handle_settings_command};
pub use tasks::{
    BypassCommands, FixCommands, GameArgs, active_command, add_command, bypass_command, fix_command,
    found_command, remove_command, restart_command, watch_command,
};

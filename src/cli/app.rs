use super::commands::settings::SettingsCommands;
use super::commands::tasks::{BypassCommands, FixCommands, GameArgs};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "steamlord-taskman")]
#[command(about = "Coordinates SteamLord game, fix and bypass operations")]
#[command(version)]
pub struct Cli {
    /// Override the backend URL for this run
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the license and keep the dock in sync with the backend until Ctrl-C
    Watch,
    /// Add a game to the library and follow its download
    Add(GameArgs),
    /// Remove a game from the library
    Remove {
        /// Steam app id
        appid: u32,
    },
    /// Apply or remove an online fix
    Fix(FixCommands),
    /// Apply or remove a bypass
    Bypass(BypassCommands),
    /// Check whether the backend already has a game
    Found {
        /// Steam app id
        appid: u32,
        /// Look up fixes or bypasses instead of games
        #[arg(long, value_parser = ["game", "fix", "bypass"], default_value = "game")]
        category: String,
    },
    /// List operations the backend reports as running
    Active,
    /// Restart Steam
    Restart,
    /// Application settings management
    Settings(SettingsCommands),
}

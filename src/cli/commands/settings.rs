use crate::config::{BACKEND_URL_ENV, Config, SETTING_NAMES};
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use log::info;

#[derive(Args)]
pub struct SettingsCommands {
    #[command(subcommand)]
    pub command: SettingsSubcommands,
}

#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Show current settings
    Show,
    /// Get the value of a specific setting
    Get {
        /// Setting name
        name: String,
    },
    /// Set the value of a specific setting
    Set {
        /// Setting name
        name: String,
        /// Setting value
        value: String,
    },
    /// Reset a setting to its default value
    Reset {
        /// Setting name
        name: String,
    },
}

pub async fn handle_settings_command(cmd: SettingsCommands) -> Result<()> {
    match cmd.command {
        SettingsSubcommands::Show => show_command(),
        SettingsSubcommands::Get { name } => get_command(&name),
        SettingsSubcommands::Set { name, value } => set_command(&name, &value),
        SettingsSubcommands::Reset { name } => reset_command(&name),
    }
}

fn show_command() -> Result<()> {
    info!("Showing all settings");
    let config = Config::load()?;

    println!("{}", "Current Settings:".bold());
    println!("{}", "=".repeat(20));
    for name in SETTING_NAMES {
        println!("  {}: {}", name.cyan(), config.get_setting(name)?);
    }

    if std::env::var(BACKEND_URL_ENV).is_ok() {
        println!();
        println!("{}", format!("backend-url is overridden by {}", BACKEND_URL_ENV).yellow());
    }

    println!();
    println!("{}", "Use 'settings set <name> <value>' to change a setting".dimmed());
    println!("{}", "Use 'settings reset <name>' to reset a setting to default".dimmed());
    Ok(())
}

fn get_command(name: &str) -> Result<()> {
    let config = Config::load()?;
    println!("{}", config.get_setting(name)?);
    Ok(())
}

fn set_command(name: &str, value: &str) -> Result<()> {
    info!("Setting {} to {}", name, value);
    let mut config = Config::load_file()?;
    config.set_setting(name, value)?;
    config.save()?;
    println!("{} Set {} to {}", "✓".bright_green().bold(), name.bold(), config.get_setting(name)?);
    Ok(())
}

fn reset_command(name: &str) -> Result<()> {
    info!("Resetting {}", name);
    let mut config = Config::load_file()?;
    config.reset_setting(name)?;
    config.save()?;
    println!(
        "{} Reset {} to {}",
        "✓".bright_green().bold(),
        name.bold(),
        config.get_setting(name)?
    );
    Ok(())
}

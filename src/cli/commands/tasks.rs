//! Task commands: run operations against the backend and follow them

use crate::api::{HttpBackend, LogLevel, ResilienceConfig, SteamLordClient};
use crate::config::Config;
use crate::tasks::{
    AppId, FlowKind, FlowSpec, ReconciliationLoop, TaskCategory, TaskManager, check_license,
};
use crate::ui::{ConsolePrompt, ConsoleSurface, ModalAction, ModalId, prompts};
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

const IDLE_CHECK: Duration = Duration::from_millis(200);

#[derive(Args)]
pub struct GameArgs {
    /// Steam app id
    pub appid: AppId,
    /// Display name used in progress messages
    #[arg(short, long, default_value = "")]
    pub name: String,
}

#[derive(Args)]
pub struct FixCommands {
    #[command(subcommand)]
    pub command: FixSubcommands,
}

#[derive(Subcommand)]
pub enum FixSubcommands {
    /// Download and apply the online fix
    Apply(GameArgs),
    /// Remove the online fix and verify game files
    Remove(GameArgs),
}

#[derive(Args)]
pub struct BypassCommands {
    #[command(subcommand)]
    pub command: BypassSubcommands,
}

#[derive(Subcommand)]
pub enum BypassSubcommands {
    /// Download and apply the bypass
    Apply(GameArgs),
    /// Remove the bypass and verify game files
    Remove(GameArgs),
}

/// Client for the configured backend; `--backend-url` wins over config and env
fn connect(backend_url: Option<String>) -> Result<(Config, SteamLordClient)> {
    let mut config = Config::load()?;
    if let Some(url) = backend_url {
        config.backend.url = url;
    }

    info!("Using backend at {}", config.backend.url);
    let backend = HttpBackend::new(config.backend.url.clone(), config.backend.request_timeout())?;
    let mut resilience = ResilienceConfig::from_settings(&config.retry);
    if log::log_enabled!(log::Level::Debug) {
        resilience.monitoring.log_level = LogLevel::Debug;
    }
    let client = SteamLordClient::new(Arc::new(backend), resilience);
    Ok((config, client))
}

/// Manager on a console surface with the license check running in the background
fn start_manager(backend_url: Option<String>) -> Result<(Arc<TaskManager>, Arc<ConsoleSurface>)> {
    let (config, client) = connect(backend_url)?;
    let console = Arc::new(ConsoleSurface::new());
    let manager = TaskManager::new(client, console.clone(), config.timing);

    let checker = Arc::clone(&manager);
    tokio::spawn(async move {
        let valid = check_license(checker.client()).await;
        checker.license().complete(valid);
    });

    Ok((manager, console))
}

/// Ask for every choice the console queued and route the answers to the manager
async fn answer_prompts(manager: &Arc<TaskManager>, console: &ConsoleSurface) -> Result<()> {
    for prompt in console.take_prompts() {
        match prompt {
            ConsolePrompt::Modal { id, actions } => {
                let answer = tokio::task::spawn_blocking(move || prompts::prompt_modal_action(id, &actions)).await?;
                match answer {
                    Ok(action) => {
                        manager.handle_action(id, action).await;
                        if action == ModalAction::RestartLater {
                            console.defer_banner();
                        }
                    }
                    Err(err) => {
                        warn!("No answer for {:?}: {}", id, err);
                        manager.handle_action(id, ModalAction::Close).await;
                    }
                }
            }
            ConsolePrompt::RestartBanner => match tokio::task::spawn_blocking(prompts::prompt_restart_banner).await? {
                Ok(true) => {
                    if manager.click_restart_banner().await {
                        println!("{} Restarting Steam", "⟳".bright_yellow().bold());
                    }
                }
                Ok(false) => {}
                Err(err) => warn!("No answer for the restart banner: {}", err),
            },
        }
    }
    Ok(())
}

/// Block until the category's slot is released or the user presses Ctrl-C.
///
/// Ctrl-C hides the operation; the backend keeps working on it.
async fn follow(manager: &Arc<TaskManager>, console: &ConsoleSurface, modal: ModalId) -> Result<()> {
    loop {
        let idle = manager.is_idle(modal.category);
        answer_prompts(manager, console).await?;
        if idle {
            break;
        }
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                manager.handle_action(modal, ModalAction::Hide).await;
                println!("{}", "Stopped following; the backend keeps working.".dimmed());
                break;
            }
            _ = tokio::time::sleep(IDLE_CHECK) => {}
        }
    }

    // Let delayed follow-ups (file verification link) fire
    tokio::time::sleep(manager.timing().validate_delay() + IDLE_CHECK).await;
    answer_prompts(manager, console).await?;
    manager.shutdown();
    Ok(())
}

async fn run_flow(backend_url: Option<String>, kind: FlowKind, args: GameArgs) -> Result<()> {
    let (manager, console) = start_manager(backend_url)?;
    let spec = FlowSpec::new(kind, args.appid, args.name);
    let modal = ModalId::new(spec.category(), spec.subject);

    if manager.run(spec).await {
        follow(&manager, &console, modal).await?;
    }
    Ok(())
}

pub async fn watch_command(backend_url: Option<String>) -> Result<()> {
    let (manager, console) = start_manager(backend_url)?;
    println!("{}", "Watching backend operations (Ctrl-C to stop)".bold());

    let reconcile = ReconciliationLoop::new(Arc::clone(&manager)).spawn();
    loop {
        answer_prompts(&manager, &console).await?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
            _ = tokio::time::sleep(IDLE_CHECK) => {}
        }
    }

    info!("Stopping watch");
    reconcile.cancel();
    manager.shutdown();
    Ok(())
}

pub async fn add_command(backend_url: Option<String>, args: GameArgs) -> Result<()> {
    run_flow(backend_url, FlowKind::AddGame, args).await
}

pub async fn remove_command(backend_url: Option<String>, appid: AppId) -> Result<()> {
    let (manager, console) = start_manager(backend_url)?;
    manager.remove_game(appid).await;
    answer_prompts(&manager, &console).await
}

pub async fn fix_command(backend_url: Option<String>, cmd: FixCommands) -> Result<()> {
    match cmd.command {
        FixSubcommands::Apply(args) => run_flow(backend_url, FlowKind::ApplyFix, args).await,
        FixSubcommands::Remove(args) => run_flow(backend_url, FlowKind::RemoveFix, args).await,
    }
}

pub async fn bypass_command(backend_url: Option<String>, cmd: BypassCommands) -> Result<()> {
    match cmd.command {
        BypassSubcommands::Apply(args) => run_flow(backend_url, FlowKind::ApplyBypass, args).await,
        BypassSubcommands::Remove(args) => run_flow(backend_url, FlowKind::RemoveBypass, args).await,
    }
}

pub async fn found_command(backend_url: Option<String>, appid: AppId, category: &str) -> Result<()> {
    let category = TaskCategory::from_key(category)
        .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", category))?;
    let (_, client) = connect(backend_url)?;

    if client.subject_exists(category, appid).await? {
        println!("{} {} {} is available", "✓".bright_green().bold(), category, appid);
    } else {
        println!("{} {} {} not found", "✗".bright_red().bold(), category, appid);
    }
    Ok(())
}

pub async fn active_command(backend_url: Option<String>) -> Result<()> {
    let (_, client) = connect(backend_url)?;
    let active = client.active_operations().await?;
    let operations = active.operations();

    if operations.is_empty() {
        println!("  {}", "No active operations".dimmed());
        return Ok(());
    }

    println!("{}", "Active operations:".bold());
    for category in TaskCategory::ALL {
        for entry in active.entries(category) {
            let status = entry
                .state
                .as_ref()
                .and_then(|state| state.status.as_ref())
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown".to_string());
            println!("  {} {:<10} {}", format!("{:<8}", category.key()).cyan(), entry.appid, status.dimmed());
        }
    }
    Ok(())
}

pub async fn restart_command(backend_url: Option<String>) -> Result<()> {
    let (_, client) = connect(backend_url)?;
    client.restart_steam().await?;
    println!("{} Restarting Steam", "⟳".bright_yellow().bold());
    Ok(())
}

use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use steamlord_taskman::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("steamlord-taskman.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {:?}", path);
    }

    let cli = Cli::parse();
    info!("Starting steamlord-taskman");

    let backend_url = cli.backend_url;
    match cli.command {
        Commands::Watch => cli::commands::watch_command(backend_url).await?,
        Commands::Add(args) => cli::commands::add_command(backend_url, args).await?,
        Commands::Remove { appid } => cli::commands::remove_command(backend_url, appid).await?,
        Commands::Fix(cmd) => cli::commands::fix_command(backend_url, cmd).await?,
        Commands::Bypass(cmd) => cli::commands::bypass_command(backend_url, cmd).await?,
        Commands::Found { appid, category } => {
            cli::commands::found_command(backend_url, appid, &category).await?
        }
        Commands::Active => cli::commands::active_command(backend_url).await?,
        Commands::Restart => cli::commands::restart_command(backend_url).await?,
        Commands::Settings(cmd) => cli::commands::handle_settings_command(cmd).await?,
    }

    Ok(())
}

mod terminal;

use clap::{Args, Parser, Subcommand};
use stagewatch::view::KeyLabels;
use stagewatch::{PolledMonitor, ReplicationApi, StageCommand, StatusBadge};
use stagewatch_client::{ClientConfig, HttpReplicationClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use terminal::{print_status, TerminalBadge};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stagewatch", about = "Follow and drive content replication to a stage")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding stagewatch.json
    #[arg(long, env = "STAGEWATCH_CONFIG_DIR", default_value = ".")]
    config_dir: PathBuf,
    /// Author host, e.g. http://localhost:4502
    #[arg(long, env = "STAGEWATCH_HOST")]
    host: Option<String>,
}

#[derive(Args)]
struct Target {
    /// Release root path, e.g. /content/sites/demo
    #[arg(long)]
    path: String,
    #[arg(long, default_value = "public")]
    stage: String,
}

#[derive(Subcommand)]
enum Command {
    /// Follow the replication summary until the stage is synchron
    Watch {
        #[command(flatten)]
        target: Target,
    },
    /// Print the full status with every replication process
    Status {
        #[command(flatten)]
        target: Target,
    },
    /// Publish a release to the stage
    Publish {
        #[command(flatten)]
        target: Target,
        /// Release key to publish
        #[arg(long)]
        release: String,
        /// Keep watching after the command was accepted
        #[arg(long)]
        follow: bool,
    },
    /// Abort the running replication
    Abort {
        #[command(flatten)]
        target: Target,
        /// Release key the replication belongs to
        #[arg(long)]
        release: String,
    },
}

async fn watch(
    client: Arc<HttpReplicationClient>,
    config: &ClientConfig,
    target: &Target,
) -> Result<(), Box<dyn std::error::Error>> {
    let initial = client.summary(&target.stage, &target.path).await?;
    println!(
        "{}: {}",
        target.stage,
        terminal::paint(initial.state.as_str(), initial.state.to_string())
    );
    if initial.is_terminal() {
        return Ok(());
    }

    let badge = StatusBadge::new(
        client,
        Arc::new(TerminalBadge::default()),
        Arc::new(KeyLabels),
        target.path.clone(),
        initial,
        config.poll_policy(),
    );

    let mut tick = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("[WATCH] interrupted");
                break;
            }
            _ = tick.tick() => {
                if badge.state().is_terminal() {
                    break;
                }
            }
        }
    }
    badge.stop_refresh();
    Ok(())
}

async fn send(
    client: &HttpReplicationClient,
    command: StageCommand,
    target: &Target,
    release: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    client
        .command(command, &target.stage, &target.path, release)
        .await?;
    println!(
        "{} {} on {}:{} accepted",
        command, release, target.stage, target.path
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = ClientConfig::load_or_default(&cli.config_dir);
    if let Some(host) = cli.host {
        config = config.with_host(host);
    }
    let client = Arc::new(HttpReplicationClient::from_config(&config));

    match cli.command {
        Command::Watch { target } => watch(client, &config, &target).await,
        Command::Status { target } => {
            let snapshot = client.status(&target.stage, &target.path).await?;
            print_status(&target.path, &snapshot);
            Ok(())
        }
        Command::Publish {
            target,
            release,
            follow,
        } => {
            send(&client, StageCommand::Publish, &target, &release).await?;
            if follow {
                watch(client, &config, &target).await?;
            }
            Ok(())
        }
        Command::Abort { target, release } => {
            send(&client, StageCommand::Abort, &target, &release).await
        }
    }
}

/// Platter - play a vinyl side as one seekable timeline
use anyhow::Context;
use clap::{Parser, Subcommand};
use platter_cli::{
    render,
    sim::{DurationIndex, IndexingResolver, LoggingCuePlayer, SimulatedEngine},
    PlatterConfig,
};
use platter_core::{FileSourceResolver, LoggingPlayedSink, Side};
use platter_playback::{PlaybackEvent, PlayerSession, Timeline};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "platter")]
#[command(about = "Play a vinyl side as one continuous timeline", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./platter.toml when present)
    #[arg(short, long, global = true, env = "PLATTER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the side's timeline
    Timeline {
        /// Side description (JSON)
        side: PathBuf,
    },
    /// Play the side on a simulated engine
    Play {
        /// Side description (JSON)
        side: PathBuf,

        /// Seek to this many seconds from the start of the side
        #[arg(long)]
        seek: Option<f64>,

        /// Playback speed multiplier (overrides the config)
        #[arg(long)]
        speed: Option<f64>,

        /// Directory relative locators are resolved against
        #[arg(long)]
        root: Option<PathBuf>,

        /// Print progress ticks
        #[arg(long)]
        progress: bool,

        /// Print raw events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "platter=info,platter_cli=info,platter_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Timeline { side } => {
            print_timeline(&side)?;
        }
        Commands::Play {
            side,
            seek,
            speed,
            root,
            progress,
            json,
        } => {
            let mut config = PlatterConfig::load(cli.config.as_deref())?;
            if let Some(speed) = speed {
                config.simulation.speed = speed;
            }
            if root.is_some() {
                config.library.root = root;
            }
            config.validate()?;

            play(&side, seek, &config, progress, json).await?;
        }
    }

    Ok(())
}

fn load_side(path: &Path) -> anyhow::Result<Side> {
    Side::from_json_file(path).with_context(|| format!("failed to load side {}", path.display()))
}

fn print_timeline(path: &Path) -> anyhow::Result<()> {
    let side = load_side(path)?;
    let timeline = Timeline::from_tracks(&side.tracks);
    print!("{}", render::timeline_table(&side, &timeline));
    Ok(())
}

async fn play(
    path: &Path,
    seek: Option<f64>,
    config: &PlatterConfig,
    progress: bool,
    json: bool,
) -> anyhow::Result<()> {
    let side = load_side(path)?;

    let root = config
        .library
        .root
        .clone()
        .or_else(|| path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    tracing::info!("Resolving tracks under {}", root.display());

    let durations = DurationIndex::default();
    let resolver = IndexingResolver::new(FileSourceResolver::with_root(root), durations.clone());
    let engine = SimulatedEngine::new(durations);
    let clock = engine.clock();
    let cues = LoggingCuePlayer::new(
        config.simulation.start_cue_secs,
        config.simulation.needle_drop_secs,
    );

    let (session, task) = PlayerSession::spawn(
        engine,
        cues,
        Arc::new(resolver),
        Arc::new(LoggingPlayedSink::new()),
        config.playback.clone(),
    );

    let clock_task = clock.spawn(
        session.engine_events(),
        Duration::from_millis(config.simulation.tick_ms),
        config.simulation.speed,
    );

    let mut events = session.subscribe();
    session.load_side(side.clone())?;
    session.request_start()?;
    if let Some(seconds) = seek {
        session.seek_to(seconds)?;
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if json {
                        println!("{}", serde_json::to_string(&event)?);
                    } else if let Some(line) = render::describe(&event, &side, progress) {
                        println!("{line}");
                    }
                    if event == PlaybackEvent::SideFinished {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                session.request_stop()?;
                break;
            }
        }
    }

    session.shutdown()?;
    task.await.context("session task failed")?;
    clock_task.abort();

    Ok(())
}

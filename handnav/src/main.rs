//! handnav - replay recorded hand landmarks through the gesture navigator
//!
//! Reads an s-expression landmark recording and prints every navigation
//! command the gesture dispatcher would issue.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use handnav::gesture::ClassifierConfig;
use handnav::replay;
use handnav::{DispatcherConfig, HandSelection};

#[derive(Parser, Debug)]
#[command(name = "handnav", about = "Replay hand landmarks through the gesture navigator")]
struct Cli {
    /// Landmark recording (one s-expression frame per line)
    recording: Option<PathBuf>,

    /// Minimum time before the same gesture navigates again
    #[arg(long, default_value_t = 1500)]
    cooldown_ms: u64,

    /// Hand used for gestures: first or largest-palm
    #[arg(long, default_value = "first")]
    hand_selection: String,

    /// Pinch threshold as a fraction of palm size
    #[arg(long, default_value_t = 0.35)]
    pinch_ratio: f32,

    /// Print route paths (/dashboard) instead of destination ids
    #[arg(long)]
    routes: bool,

    /// Print the replay summary s-expression at the end
    #[arg(long)]
    summary: bool,

    /// Print the parsed recording in canonical form instead of replaying it
    #[arg(long)]
    dump: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("handnav {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handnav=info".into()),
        )
        .init();
    handnav::dispatcher::install_panic_hook();

    let Some(path) = cli.recording else {
        anyhow::bail!("no recording given (see --help)");
    };

    let config = DispatcherConfig {
        cooldown_ms: cli.cooldown_ms,
        hand_selection: HandSelection::parse(&cli.hand_selection)?,
        classifier: ClassifierConfig {
            pinch_ratio: cli.pinch_ratio,
            ..ClassifierConfig::default()
        },
    };

    let frames = replay::load_recording(&path)?;

    if cli.dump {
        for frame in &frames {
            println!("{}", replay::format_frame(frame));
        }
        return Ok(());
    }

    info!("handnav v{} replaying {}", env!("CARGO_PKG_VERSION"), path.display());

    let report = replay::replay(&frames, config)?;

    for (t, destination) in &report.navigations {
        let target = if cli.routes {
            destination.route()
        } else {
            destination.as_str()
        };
        println!("{t}\t{target}");
    }

    if cli.summary {
        println!("{}", report.summary_sexp());
    }

    info!(
        frames = report.frames,
        navigations = report.navigations.len(),
        "replay finished"
    );
    Ok(())
}

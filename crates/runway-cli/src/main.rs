mod cmd;
mod image;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, note::NoteSubcommand, Ctx};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "runway",
    about = "Campaign dashboard: mark milestones, watch the collection reveal, unlock the final look",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data root holding .runway/ (default: nearest .runway/ upward, else $HOME)
    #[arg(long, global = true, env = "RUNWAY_ROOT")]
    root: Option<PathBuf>,

    /// Backend base URL (overrides api_url in .runway/config.yaml)
    #[arg(long, global = true, env = "RUNWAY_API_URL")]
    api_url: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new campaign on the backend and make it active
    New {
        /// Life goal the roadmap breaks down
        #[arg(long)]
        goal: String,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Color palette
        #[arg(long)]
        color: String,
        /// Designer whose style the collection follows
        #[arg(long)]
        designer: String,
        /// Aesthetic vibe
        #[arg(long, default_value = "")]
        vibe: String,
        /// Inspiration image file
        #[arg(long)]
        image: PathBuf,
    },

    /// Adopt an existing campaign id as the active campaign
    Use {
        campaign_id: String,
        #[arg(long)]
        goal: String,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },

    /// Show the dashboard: progress, collection grid and finale state
    Status {
        /// Save every ready stage image into this directory
        #[arg(long)]
        images: Option<PathBuf>,
    },

    /// Mark or unmark a milestone (0-based index)
    Toggle { index: usize },

    /// Edit the free-text notes
    Note {
        #[command(subcommand)]
        subcommand: NoteSubcommand,
    },

    /// Play the finale: report the final look, optionally saving the image
    Finale {
        /// Write the decoded final image to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List past seasons
    Archive,

    /// Interactive dashboard reading commands from stdin
    Session,

    /// Forget the active campaign and its local progress
    Reset,

    /// Inspect and validate client configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Session => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Ctx {
        root: root::resolve_root(cli.root.as_deref()),
        api_url: cli.api_url,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::New {
            goal,
            date,
            color,
            designer,
            vibe,
            image,
        } => cmd::campaign::new(
            &ctx,
            cmd::campaign::Intake {
                goal,
                date,
                color,
                designer,
                vibe,
                image,
            },
        ),
        Commands::Use {
            campaign_id,
            goal,
            date,
        } => cmd::campaign::adopt(&ctx, &campaign_id, &goal, &date),
        Commands::Status { images } => cmd::status::run(&ctx, images.as_deref()),
        Commands::Toggle { index } => cmd::toggle::run(&ctx, index),
        Commands::Note { subcommand } => cmd::note::run(&ctx, subcommand),
        Commands::Finale { out } => cmd::finale::run(&ctx, out.as_deref()),
        Commands::Archive => cmd::archive::run(&ctx),
        Commands::Session => cmd::session::run(&ctx),
        Commands::Reset => cmd::campaign::reset(&ctx),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

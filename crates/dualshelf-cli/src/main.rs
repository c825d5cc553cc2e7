use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{audit, clear, config};
use library_audit_config::PathManager;
use library_audit_models::{MediaKind, ReportBucket};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "dualshelf")]
#[command(about = "DualShelf - Find what your AniList and Kitsu libraries disagree on")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to a daily-rotated file instead of stderr (defaults to the app log directory)
    #[arg(long, global = true, value_name = "PATH", num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Anime,
    Manga,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Anime => MediaKind::Anime,
            KindArg::Manga => MediaKind::Manga,
        }
    }
}

fn parse_bucket(s: &str) -> Result<ReportBucket, String> {
    ReportBucket::parse(s).ok_or_else(|| {
        let names: Vec<&str> = ReportBucket::ALL.iter().map(|b| b.as_str()).collect();
        format!("unknown bucket '{}'. Expected one of: {}", s, names.join(", "))
    })
}

#[derive(Subcommand)]
enum Commands {
    /// Compare both libraries and write a report
    #[command(long_about = "Fetch your AniList and Kitsu libraries, pair up entries by title, compare status and progress, and search each catalog for entries only one side has. The full report is written as JSON.")]
    Audit {
        /// Which library to audit (defaults to the configured media kind)
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Where to write the JSON report (defaults to the reports directory)
        #[arg(long, value_name = "PATH")]
        report_file: Option<PathBuf>,

        /// List the entries of one bucket, e.g. anilist_higher or not_found_on_kitsu
        #[arg(long, value_name = "NAME", value_parser = parse_bucket)]
        bucket: Option<ReportBucket>,
    },
    /// Configure accounts and audit options
    #[command(long_about = "Manage configuration and credentials for DualShelf. Running without a subcommand starts the interactive configuration wizard.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Remove stored credentials, configuration or reports
    Clear {
        /// Clear credentials, configuration and reports
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["credentials", "config", "reports"])]
        all: bool,

        /// Clear stored credentials and cached tokens
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,

        /// Clear the configuration file
        #[arg(long, action = ArgAction::SetTrue)]
        config: bool,

        /// Clear saved audit reports
        #[arg(long, action = ArgAction::SetTrue)]
        reports: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure the AniList account (username and personal access token)
    #[command(long_about = "Configure your AniList username and access token. Create a token by registering an API client at https://anilist.co/settings/developer and authorizing it.")]
    Anilist {
        /// AniList username (if not provided, will prompt)
        #[arg(long)]
        username: Option<String>,
    },

    /// Configure the Kitsu account (login and password)
    #[command(long_about = "Configure your Kitsu login and password. The password is stored in the credentials file and exchanged for an access token when an audit runs.")]
    Kitsu {
        /// Kitsu login, usually your email address (if not provided, will prompt)
        #[arg(long)]
        username: Option<String>,
    },

    /// Configure audit options
    Audit {
        /// Default library to audit
        #[arg(long, value_enum)]
        media_kind: Option<KindArg>,

        /// Pause between catalog searches, in milliseconds
        #[arg(long)]
        search_delay_ms: Option<u64>,

        /// Pause between library pages, in milliseconds
        #[arg(long)]
        page_delay_ms: Option<u64>,

        /// Skip light novels when auditing manga
        #[arg(long)]
        exclude_novels: Option<bool>,
    },

    /// Interactive configuration wizard
    Interactive,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .map(|path| path.unwrap_or_else(|| PathManager::default().log_file()));
    logging::init_logging(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Audit {
            kind,
            report_file,
            bucket,
        } => audit::run_audit(kind.map(MediaKind::from), report_file, bucket, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Interactive);
            config::run_config(cmd, &output)
        }
        Commands::Clear {
            all,
            credentials,
            config,
            reports,
        } => clear::run_clear(all, credentials, config, reports, &output),
    }
}

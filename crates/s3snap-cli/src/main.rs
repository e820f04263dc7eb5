mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use s3snap_core::config::SnapConfig;
use s3snap_core::confirm::{AutoConfirm, Confirm, ConsolePrompt};
use s3snap_storage::s3::S3ObjectStore;

use commands::{FlowError, FlowResult, Session};

#[derive(Parser)]
#[command(name = "s3snap")]
#[command(about = "Back up a folder to S3 as a tar.gz archive and restore the latest one")]
#[command(version)]
struct Cli {
    /// Ask for confirmation before uploading, restoring or deleting anything
    #[arg(long, global = true)]
    verify: bool,

    /// Number of most recent archives to keep in the bucket (default: 3)
    #[arg(
        long,
        global = true,
        env = "S3SNAP_KEEP",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    keep: Option<u64>,

    /// TOML config file (default: ~/.s3snap/config.toml if it exists)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bucket holding the archives
    #[arg(long, global = true, env = "AWS_BUCKET_NAME")]
    bucket: Option<String>,

    /// Endpoint of an S3-compatible service (e.g. http://localhost:9000)
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Region of the bucket
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive a folder, upload it and prune old archives
    Backup {
        /// The folder to back up
        folder_path: PathBuf,
        /// Name used in the archive file name
        folder_name: String,
    },

    /// Restore the most recent archive
    Restore {
        /// Directory to restore into
        folder_path: PathBuf,
        /// Name of the folder inside `folder_path` that gets replaced
        folder_name: String,
    },

    /// List archives in the bucket
    List,
}

fn load_config(cli: &Cli) -> Result<SnapConfig, FlowError> {
    let mut config = SnapConfig::resolve(cli.config.as_deref())?;
    if let Some(ref bucket) = cli.bucket {
        config.store.bucket = bucket.clone();
    }
    if let Some(ref url) = cli.endpoint_url {
        config.store.endpoint_url = Some(url.clone());
    }
    if let Some(ref region) = cli.region {
        config.store.region = Some(region.clone());
    }
    if let Some(keep) = cli.keep {
        config.retention.keep = keep as usize;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> FlowResult {
    let config = load_config(&cli)?;
    tracing::debug!(?config, "resolved configuration");

    let work_dir = std::env::current_dir()?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let store = rt
        .block_on(S3ObjectStore::from_config(&config.store))
        .map_err(FlowError::Client)?;

    let mut confirm: Box<dyn Confirm> = if cli.verify {
        Box::new(ConsolePrompt::stdio())
    } else {
        Box::new(AutoConfirm)
    };

    let mut session = Session {
        store: &store,
        confirm: confirm.as_mut(),
        work_dir,
        keep: config.retention.keep,
    };

    match cli.command {
        Commands::Backup {
            ref folder_path,
            ref folder_name,
        } => {
            println!(
                "Processing path {}, folder {folder_name}",
                folder_path.display()
            );
            rt.block_on(commands::backup::run(&mut session, folder_path, folder_name))
        }
        Commands::Restore {
            ref folder_path,
            ref folder_name,
        } => {
            println!(
                "Processing path {}, folder {folder_name}",
                folder_path.display()
            );
            rt.block_on(commands::restore::run(&mut session, folder_path, folder_name))
        }
        Commands::List => rt.block_on(commands::list::run(&mut session)),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s3snap=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}

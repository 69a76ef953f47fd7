//! upvault - Command-line interface for the upvault S3 upload provider
//!
//! Drives the storage adapter against a live S3-compatible store:
//! - Configuration checks, optionally including a bucket probe
//! - Offline object key construction
//! - Upload, delete and signed URL generation

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

mod commands;
mod settings;

use settings::ConnectionArgs;

/// upvault - Upload files to an S3-compatible object store
#[derive(Parser)]
#[command(name = "upvault")]
#[command(author, version, about = "Upload files to an S3-compatible object store", long_about = None)]
struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print it (secret key omitted)
    Check {
        /// Also check that the bucket exists
        #[arg(long)]
        connect: bool,
    },

    /// Print the object key a file would be stored under
    Path {
        /// Content hash used as the file name
        #[arg(long)]
        hash: String,

        /// File extension
        #[arg(long)]
        ext: String,

        /// Relative directory below the folder
        #[arg(long)]
        path: Option<String>,
    },

    /// Upload a file and print its URL
    Upload {
        /// File to upload
        file: PathBuf,

        /// Content hash to store the file under (default: BLAKE3 of the content)
        #[arg(long)]
        hash: Option<String>,

        /// Relative directory below the folder
        #[arg(long)]
        path: Option<String>,

        /// Read the whole file into memory instead of streaming it
        #[arg(long)]
        buffer: bool,
    },

    /// Delete a previously uploaded file by URL
    Delete {
        /// URL printed by `upload`
        url: String,
    },

    /// Print a signed URL for a previously uploaded file
    Sign {
        /// URL printed by `upload`
        url: String,

        /// Lifetime in seconds (default: the configured expiry)
        #[arg(long, allow_hyphen_values = true)]
        expires_in: Option<i64>,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let result = run();

    match result {
        Ok(_) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {:#}", e);

            let exit_code = map_error_to_exit_code(&e);
            process::exit(exit_code);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Check { connect } => commands::check(&cli.connection, connect),
        Commands::Path { hash, ext, path } => {
            commands::path(&cli.connection, &hash, &ext, path.as_deref())
        }
        Commands::Upload {
            file,
            hash,
            path,
            buffer,
        } => commands::upload(&cli.connection, &file, hash, path, buffer),
        Commands::Delete { url } => commands::delete(&cli.connection, &url),
        Commands::Sign { url, expires_in } => commands::sign(&cli.connection, &url, expires_in),
    }
}

fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(upvault_err) = err.downcast_ref::<upvault_core::Error>() {
        match upvault_err {
            upvault_core::Error::Configuration(_) => 2,
            upvault_core::Error::PathTraversal { .. } => 3,
            upvault_core::Error::InvalidUrl { .. } => 3,
            upvault_core::Error::Upload { .. } => 4,
            upvault_core::Error::Delete { .. } => 4,
            upvault_core::Error::SignedUrl { .. } => 4,
        }
    } else if err.is::<std::io::Error>() {
        5
    } else {
        1
    }
}

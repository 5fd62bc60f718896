// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr, controlled by RUST_LOG or --verbose)
// 3. Build the uploader from the flags and run the upload
// 4. Exit with proper code (0 = uploaded, 1 = access/upload failure, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use repo_upload::{
    ApiEndpoint, Error, UploadFile, UploadRequest, UploadedFile, Uploader, UploaderConfig,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins when set, otherwise warnings only (debug with --verbose)
fn init_logging(verbose: bool) {
    let default = if verbose { "repo_upload=debug" } else { "repo_upload=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = every file committed
//   Ok(1) = repository check or an upload was rejected
//   Ok(2) = bad input, network trouble, unreadable file, cancelled
async fn run(cli: Cli) -> Result<i32> {
    let endpoint = match &cli.proxy {
        Some(proxy) => ApiEndpoint::proxied(proxy, &cli.api_base),
        None => ApiEndpoint::direct(&cli.api_base),
    }
    .context("Invalid API endpoint")?;

    let timeout = (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout));
    let config = UploaderConfig::default()
        .with_endpoint(endpoint)
        .with_concurrency(cli.concurrency)
        .with_timeout(timeout);

    let files = cli
        .files
        .iter()
        .map(UploadFile::from_path)
        .collect::<repo_upload::Result<Vec<_>>>()?;

    let request = UploadRequest::new(&cli.repository, cli.token, files)?;
    let repository = request.repository.clone();
    let file_count = request.files.len();

    println!("📤 Uploading {} file(s) to {}", file_count, repository);

    let uploader = Uploader::new(config)?;

    // Ctrl-C aborts whatever is still in flight
    let cancel = repo_upload::CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    match uploader.upload_with_cancellation(request, cancel).await {
        Ok(uploaded) => {
            print_results(&uploaded, cli.json)?;
            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            if !e.is_before_write() {
                eprintln!("⚠️  Some files may already be committed to {}", repository);
            }
            Ok(exit_code_for(&e))
        }
    }
}

fn exit_code_for(error: &Error) -> i32 {
    match error {
        Error::Access(_) | Error::Upload { .. } => 1,
        Error::Unexpected { .. } | Error::InvalidRequest(_) | Error::Cancelled { .. } => 2,
    }
}

fn print_results(uploaded: &[UploadedFile], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(uploaded)?);
        return Ok(());
    }

    for file in uploaded {
        // GitHub puts the new commit under "commit.sha"
        let sha = file.response["commit"]["sha"].as_str().unwrap_or("-");
        println!("   ✅ {:<50} {}", file.name, sha);
    }
    println!("\n📊 {} file(s) committed", uploaded.len());
    Ok(())
}

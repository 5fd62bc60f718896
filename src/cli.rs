// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There is a single command:
//   repo-upload <REPOSITORY> <FILES>... --token <TOKEN>
//
// The token and proxy can also come from environment variables, which keeps
// the token out of shell history and CI logs.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "repo-upload",
    version,
    about = "Upload files to a GitHub repository through the Contents API",
    long_about = "repo-upload checks that a repository exists and your token can access it, \
                  then commits each file to the repository root, one commit per file. \
                  Uploads are not atomic: if one file fails, files already committed stay."
)]
pub struct Cli {
    /// Target repository, as owner/repo or a github.com URL
    pub repository: String,

    /// Files to upload. Each lands at the repository root under its file name
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// GitHub token with the "repo" scope
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Send requests through a forwarding proxy (upstream URL goes in ?url=)
    #[arg(long, env = "REPO_UPLOAD_PROXY")]
    pub proxy: Option<String>,

    /// GitHub API root
    #[arg(long, default_value = repo_upload::config::GITHUB_API_BASE)]
    pub api_base: String,

    /// Maximum number of uploads in flight at once
    #[arg(long, default_value_t = repo_upload::config::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-request timeout in seconds, 0 = no limit
    ///
    /// A timed out upload may still have been committed by GitHub
    #[arg(long, default_value_t = 0)]
    pub timeout: u64,

    /// Print the API response for each committed file as JSON
    #[arg(long)]
    pub json: bool,

    /// Log every request to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cli =
            Cli::try_parse_from(["repo-upload", "octo/hello", "a.txt", "--token", "t"]).unwrap();
        assert_eq!(cli.repository, "octo/hello");
        assert_eq!(cli.files, vec![PathBuf::from("a.txt")]);
        assert_eq!(cli.api_base, "https://api.github.com");
        assert_eq!(cli.concurrency, 4);
        assert_eq!(cli.timeout, 0);
        assert!(!cli.json);
    }

    #[test]
    fn test_requires_files() {
        let result = Cli::try_parse_from(["repo-upload", "octo/hello", "--token", "t"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "repo-upload",
            "octo/hello",
            "a.txt",
            "b.txt",
            "--token",
            "t",
            "--proxy",
            "https://proxy.example.com/proxy",
            "--concurrency",
            "8",
            "--timeout",
            "120",
            "--json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.proxy.as_deref(), Some("https://proxy.example.com/proxy"));
        assert_eq!(cli.concurrency, 8);
        assert_eq!(cli.timeout, 120);
        assert!(cli.json && cli.verbose);
    }
}

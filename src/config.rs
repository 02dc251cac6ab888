//! Process configuration.
//!
//! Every flag doubles as an environment variable so the binary slots into
//! containerized deployments without wrapper scripts.

use std::path::PathBuf;

use clap::Parser;

use crate::engine::guard::DEFAULT_CLAIM_TTL_HOURS;

#[derive(Parser, Debug)]
#[command(version, about = "GitHub pull request steward")]
pub struct Config {
    /// GitHub App ID.
    #[arg(long, env = "GITHUB_APP_ID")]
    pub app_id: u64,

    /// Path to the GitHub App RSA private key (PEM).
    #[arg(long, env = "GITHUB_APP_PRIVATE_KEY_PATH", value_name = "PATH")]
    pub private_key_path: PathBuf,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Label whose presence on a PR suppresses automatic WIP clearing.
    #[arg(long, env = "WIP_HOLD_LABEL", default_value = "pending")]
    pub wip_hold_label: String,

    /// Hours a claimed PR transition blocks redeliveries.
    #[arg(long, env = "CLAIM_TTL_HOURS", default_value_t = DEFAULT_CLAIM_TTL_HOURS)]
    pub claim_ttl_hours: i64,
}

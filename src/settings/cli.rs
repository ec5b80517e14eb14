use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Issues and rotates access/refresh token pairs")]
pub struct Cli {
    /// TOML settings file; defaults to `settings/dev.toml` (debug) or `settings/release.toml`
    #[arg(long)]
    pub settings: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

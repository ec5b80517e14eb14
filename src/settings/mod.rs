//! Process configuration: CLI flags plus layered settings
//! (defaults, TOML file, `TOKENWRIGHT__*` environment variables).

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;

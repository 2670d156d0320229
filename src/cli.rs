use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{get_config_dir, get_data_dir};

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
    /// Tick rate, i.e. number of ticks per second
    #[arg(short, long, value_name = "FLOAT", default_value_t = 4.0)]
    pub tick_rate: f64,

    /// Frame rate, i.e. number of frames per second
    #[arg(short, long, value_name = "FLOAT", default_value_t = 60.0)]
    pub frame_rate: f64,

    /// Browse read-only; composing and cloud pushes are disabled
    #[arg(long)]
    pub viewer: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl Cli {
    pub fn role(&self) -> Role {
        if self.viewer { Role::Viewer } else { Role::Owner }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Viewer,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Write all entries to a CSV file
    Export { path: PathBuf },
    /// Push every local entry to the cloud mirror
    Sync,
    /// Load entries from a JSON file, keeping their original ids
    Import { path: PathBuf },
    /// Remove one entry by id (local store only)
    Delete { id: String },
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let commit_hash = option_env!("VERGEN_GIT_SHA").unwrap_or("unknown");

    let config_dir_path = get_config_dir().display().to_string();
    let data_dir_path = get_data_dir().display().to_string();

    format!(
        "\
{commit_hash}

Authors: {author}

Config directory: {config_dir_path}
Data directory: {data_dir_path}"
    )
}

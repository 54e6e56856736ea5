//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod generate;
pub(crate) mod serve;

use std::path::PathBuf;

use clap::Args;
use tiny_site::{Site, SiteBuilder};

use crate::error::CliError;

pub(crate) use check::CheckArgs;
pub(crate) use generate::GenerateArgs;
pub(crate) use serve::ServeArgs;

/// Arguments shared by every command.
#[derive(Args)]
pub(crate) struct SiteArgs {
    /// Path to the site config file.
    #[arg(short, long, env = "TINY_CONFIG", default_value = "index.yml")]
    pub config: PathBuf,
}

impl SiteArgs {
    /// Load and build the site.
    pub(crate) fn load(&self) -> Result<Site, CliError> {
        Ok(SiteBuilder::from_file(&self.config)?.build()?)
    }
}

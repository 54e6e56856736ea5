//! `tiny serve` command implementation.

use std::sync::Arc;

use clap::Args;
use tiny_server::{ServerConfig, run_server};

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    #[command(flatten)]
    site: SiteArgs,

    /// Host to bind to.
    #[arg(long, env = "TINY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to.
    #[arg(short, long, env = "TINY_PORT", default_value_t = 8080)]
    port: u16,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if the site fails to load or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let site = Arc::new(self.site.load()?);
        let config = site.config();

        output.info(&format!("Starting server on {}:{}", self.host, self.port));
        output.setting("Config", self.site.config.display());
        output.setting("Pages", site.pages().len());
        match &config.static_dir {
            Some(dir) => output.setting(
                "Static files",
                format_args!("{} -> {}", config.static_prefix, dir.display()),
            ),
            None => output.setting("Static files", "disabled"),
        }
        if config.reload {
            output.setting("Template reload", "enabled");
        }

        let server_config = ServerConfig {
            host: self.host,
            port: self.port,
        };
        run_server(site, server_config).await?;

        Ok(())
    }
}

//! `tiny generate` command implementation.

use std::sync::Arc;

use clap::Args;
use tiny_server::generate_static_site;

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the generate command.
#[derive(Args)]
pub(crate) struct GenerateArgs {
    #[command(flatten)]
    site: SiteArgs,
}

impl GenerateArgs {
    /// Execute the generate command.
    ///
    /// # Errors
    ///
    /// Returns an error if the site fails to load or generation fails.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let site = Arc::new(self.site.load()?);
        let static_site = &site.config().static_site;
        if !static_site.enable {
            output.warning("Static site generation is disabled (set static_site.enable)");
            return Ok(());
        }

        output.info(&format!(
            "Generating into {}",
            static_site.output.root_dir.display()
        ));
        let report = generate_static_site(Arc::clone(&site)).await?;

        output.report(&report);
        Ok(())
    }
}

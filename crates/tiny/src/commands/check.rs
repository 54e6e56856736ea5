//! `tiny check` command implementation.

use clap::Args;
use tiny_site::{PageRequest, Site};

use super::SiteArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    site: SiteArgs,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if the site is invalid or any page fails to render.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let site = self.site.load()?;
        site.validate()?;

        output.page_count(site.pages().len());
        let failures = render_pages(&site, &output);
        if failures > 0 {
            return Err(CliError::Validation(format!(
                "{failures} page(s) failed to render"
            )));
        }
        output.success("Site is valid");
        Ok(())
    }
}

/// Render every page with default data, returning the number of failures.
fn render_pages(site: &Site, output: &Output) -> usize {
    let mut failures = 0;
    for (name, page) in site.pages() {
        let request = PageRequest::new(page.path.clone());
        let data = site.page_data(name, &request, None);
        match site.render(name, &data) {
            Ok(_) => output.page(name, &page.path),
            Err(err) => {
                failures += 1;
                output.page_failed(name, &page.path, err);
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn check(dir: &TempDir, home: &str) -> Result<(), CliError> {
        let root = dir.path();
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::write(root.join("pages/home.html"), home).unwrap();
        fs::write(
            root.join("index.yml"),
            "pages:\n  home:\n    path: /\n    components: [pages/home.html]\n",
        )
        .unwrap();
        CheckArgs {
            site: SiteArgs {
                config: root.join("index.yml"),
            },
        }
        .execute()
    }

    #[test]
    fn test_check_valid_site() {
        let dir = TempDir::new().unwrap();
        assert!(check(&dir, "<h1>[[ metadata.title ]]</h1>").is_ok());
    }

    #[test]
    fn test_check_reports_broken_template() {
        let dir = TempDir::new().unwrap();
        let err = check(&dir, "[[% if %]]").unwrap_err();
        assert!(matches!(err, CliError::Validation(_)), "{err}");
    }

    #[test]
    fn test_check_missing_config() {
        let args = CheckArgs {
            site: SiteArgs {
                config: PathBuf::from("/nonexistent/index.yml"),
            },
        };
        assert!(matches!(args.execute(), Err(CliError::Site(_))));
    }
}

//! Terminal reporting for the `serve`, `generate` and `check` commands.
//!
//! Messages go to stderr. The `*_line` functions build the text so the
//! layout can be tested without a terminal.

use std::fmt::Display;
use std::path::Path;

use console::{Style, Term};
use tiny_server::{GenerateReport, SkipReason};

/// Width of the page name column.
const NAME_WIDTH: usize = 16;

/// Styled stderr writer.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    fn line(&self, style: Option<&Style>, msg: &str) {
        let text = style.map_or_else(|| msg.to_owned(), |s| s.apply_to(msg).to_string());
        // Nothing useful to do when stderr is gone.
        let _ = self.term.write_line(&text);
    }

    /// Print an unstyled message.
    pub(crate) fn info(&self, msg: &str) {
        self.line(None, msg);
    }

    /// Print an error message in red.
    pub(crate) fn error(&self, msg: &str) {
        self.line(Some(&self.red), msg);
    }

    /// Print a warning message in yellow.
    pub(crate) fn warning(&self, msg: &str) {
        self.line(Some(&self.yellow), msg);
    }

    /// Print a `label: value` startup setting.
    pub(crate) fn setting(&self, label: &str, value: impl Display) {
        self.line(None, &format!("{label}: {value}"));
    }

    /// Print the page count heading of a check run.
    pub(crate) fn page_count(&self, count: usize) {
        self.line(Some(&self.cyan_bold), &format!("{count} pages"));
    }

    /// Print a page that rendered.
    pub(crate) fn page(&self, name: &str, path: &str) {
        self.line(None, &page_line(name, path));
    }

    /// Print a page that failed to render, with the reason.
    pub(crate) fn page_failed(&self, name: &str, path: &str, err: impl Display) {
        self.line(Some(&self.red), &format!("{}: {err}", page_line(name, path)));
    }

    /// Print every written file and skipped path of a generation run,
    /// followed by the totals.
    pub(crate) fn report(&self, report: &GenerateReport) {
        for file in &report.written {
            self.line(None, &written_line(file));
        }
        for (path, reason) in &report.skipped {
            self.line(Some(&self.yellow), &skipped_line(path, reason));
        }
        self.line(Some(&self.green), &summary_line(report));
    }

    /// Print a success message in green.
    pub(crate) fn success(&self, msg: &str) {
        self.line(Some(&self.green), msg);
    }
}

fn page_line(name: &str, path: &str) -> String {
    format!("  {name:<NAME_WIDTH$} {path}")
}

fn written_line(file: &Path) -> String {
    format!("  {}", file.display())
}

fn skipped_line(path: &str, reason: &SkipReason) -> String {
    let why = match reason {
        SkipReason::NotAllowed => "not in allowed_pages".to_owned(),
        SkipReason::Status(status) => format!("status {status}"),
    };
    format!("  skipped {path}: {why}")
}

fn summary_line(report: &GenerateReport) -> String {
    format!(
        "Generated {} pages ({} skipped)",
        report.written.len(),
        report.skipped.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_page_line_aligns_paths() {
        assert_eq!(page_line("home", "/"), "  home             /");
        assert_eq!(
            page_line("a_very_long_page_name", "/x"),
            "  a_very_long_page_name /x"
        );
    }

    #[test]
    fn test_skipped_line() {
        assert_eq!(
            skipped_line("/admin", &SkipReason::NotAllowed),
            "  skipped /admin: not in allowed_pages"
        );
        assert_eq!(
            skipped_line("/gone", &SkipReason::Status(404)),
            "  skipped /gone: status 404"
        );
    }

    #[test]
    fn test_report_lines() {
        let report = GenerateReport {
            written: vec![PathBuf::from("out/index.html"), PathBuf::from("out/about.html")],
            skipped: vec![("/gone".to_owned(), SkipReason::Status(500))],
        };
        assert_eq!(written_line(&report.written[0]), "  out/index.html");
        assert_eq!(summary_line(&report), "Generated 2 pages (1 skipped)");
        assert_eq!(
            summary_line(&GenerateReport::default()),
            "Generated 0 pages (0 skipped)"
        );
    }
}

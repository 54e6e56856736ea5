//! Writing generated pages to disk.

use std::fs;
use std::path::{Component, Path, PathBuf};

use regex::Regex;

use crate::SiteError;
use crate::config::StaticSiteConfig;

/// Clean the output directory and copy static files into it.
///
/// Entries of `root_dir` named in `keep` survive. Directories listed in
/// `static` are copied by content, files by name.
///
/// # Errors
///
/// Returns an error if `root_dir` is not set or any filesystem step fails.
pub fn prepare_output(config: &StaticSiteConfig) -> Result<(), SiteError> {
    let output = &config.output;
    if output.root_dir.as_os_str().is_empty() {
        return Err(SiteError::Validation(
            "static_site.output.root_dir is not set".to_owned(),
        ));
    }
    let root = &output.root_dir;
    fs::create_dir_all(root).map_err(|e| SiteError::io(root, e))?;

    for entry in fs::read_dir(root).map_err(|e| SiteError::io(root, e))? {
        let entry = entry.map_err(|e| SiteError::io(root, e))?;
        let name = entry.file_name();
        if output.keep.iter().any(|keep| name.as_os_str() == keep.as_str()) {
            continue;
        }
        let path = entry.path();
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| SiteError::io(&path, e))?;
    }

    let static_dir = if output.static_dir.as_os_str().is_empty() {
        root
    } else {
        &output.static_dir
    };
    for source in &config.static_files {
        if source.is_dir() {
            copy_dir(source, static_dir)?;
        } else {
            let name = source.file_name().ok_or_else(|| {
                SiteError::Validation(format!("invalid static file: {}", source.display()))
            })?;
            fs::create_dir_all(static_dir).map_err(|e| SiteError::io(static_dir, e))?;
            let target = static_dir.join(name);
            fs::copy(source, &target).map_err(|e| SiteError::io(source, e))?;
        }
    }
    tracing::info!(root = %root.display(), "Prepared output directory");
    Ok(())
}

/// Copy the contents of `src` into `dst`, recursively.
fn copy_dir(src: &Path, dst: &Path) -> Result<(), SiteError> {
    fs::create_dir_all(dst).map_err(|e| SiteError::io(dst, e))?;
    for entry in fs::read_dir(src).map_err(|e| SiteError::io(src, e))? {
        let entry = entry.map_err(|e| SiteError::io(src, e))?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if path.is_dir() {
            copy_dir(&path, &target)?;
        } else {
            fs::copy(&path, &target).map_err(|e| SiteError::io(&path, e))?;
        }
    }
    Ok(())
}

/// File a URL path is written to under `root`.
///
/// `/` maps to `index.html`, a trailing slash to `index.html` inside the
/// directory, and paths without an extension get `.html`. The query string
/// is ignored.
///
/// # Errors
///
/// Returns an error for paths containing `..`.
pub fn output_path(root: &Path, url_path: &str) -> Result<PathBuf, SiteError> {
    let path = url_path.split(['?', '#']).next().unwrap_or_default();
    let relative = Path::new(path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(SiteError::Validation(format!(
            "refusing to write outside the output directory: {url_path}"
        )));
    }

    if relative.as_os_str().is_empty() {
        return Ok(root.join("index.html"));
    }
    if path.ends_with('/') {
        return Ok(root.join(relative).join("index.html"));
    }
    let file = root.join(relative);
    if file.extension().is_some() {
        Ok(file)
    } else {
        Ok(file.with_extension("html"))
    }
}

/// Write a generated page, creating parent directories.
pub fn write_page(root: &Path, url_path: &str, body: &[u8]) -> Result<PathBuf, SiteError> {
    let target = output_path(root, url_path)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| SiteError::io(parent, e))?;
    }
    fs::write(&target, body).map_err(|e| SiteError::io(&target, e))?;
    Ok(target)
}

/// Paths that may be written during generation.
#[derive(Debug, Clone)]
pub struct AllowedPages {
    patterns: Vec<Regex>,
}

impl AllowedPages {
    /// Compile the `allowed_pages` patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, SiteError> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether any pattern matches somewhere in `path`.
    #[must_use]
    pub fn is_allowed(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }
}

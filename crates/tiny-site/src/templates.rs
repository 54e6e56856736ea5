//! Template compilation.
//!
//! Every page gets its own minijinja environment holding the function
//! library, the shared `common.html` macros and the page's layout and
//! component files, each registered under its file name.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment};
use minijinja::syntax::SyntaxConfig;
use tiny_funcs::FuncMap;

use crate::SiteError;
use crate::config::{DEFAULT_DELIM_LEFT, DEFAULT_DELIM_RIGHT};
use crate::page::PageData;

/// Name under which the shared macros are importable.
pub(crate) const COMMON_TEMPLATE: &str = "common.html";

const COMMON_SOURCE: &str = include_str!("../templates/common.html");

/// A built-in page added when the site file does not define it.
pub(crate) struct DefaultPage {
    pub(crate) name: &'static str,
    pub(crate) path: &'static str,
    pub(crate) template: &'static str,
    pub(crate) source: &'static str,
}

pub(crate) const DEFAULT_PAGES: [DefaultPage; 4] = [
    DefaultPage {
        name: crate::PAGE_ROBOTS_TXT,
        path: "/robots.txt",
        template: "robots.txt",
        source: include_str!("../templates/robots.txt"),
    },
    DefaultPage {
        name: crate::PAGE_SITEMAP_XML,
        path: "/sitemap.xml",
        template: "sitemap.xml",
        source: include_str!("../templates/sitemap.xml"),
    },
    DefaultPage {
        name: crate::PAGE_ERROR,
        path: "/error",
        template: "error.html",
        source: include_str!("../templates/error.html"),
    },
    DefaultPage {
        name: crate::PAGE_NOT_FOUND,
        path: "/404",
        template: "not_found.html",
        source: include_str!("../templates/not_found.html"),
    },
];

/// Variable, block and comment markers derived from a delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Delimiters {
    variable: (String, String),
    block: (String, String),
    comment: (String, String),
}

impl Delimiters {
    /// Markers for `left`/`right`: `L R` for variables, `L% %R` for blocks
    /// and `L# #R` for comments. The Jinja pair `{{ }}` keeps the standard
    /// `{% %}` and `{# #}` markers.
    pub(crate) fn new(left: &str, right: &str) -> Self {
        if left == "{{" && right == "}}" {
            return Self {
                variable: ("{{".into(), "}}".into()),
                block: ("{%".into(), "%}".into()),
                comment: ("{#".into(), "#}".into()),
            };
        }
        Self {
            variable: (left.to_owned(), right.to_owned()),
            block: (format!("{left}%"), format!("%{right}")),
            comment: (format!("{left}#"), format!("#{right}")),
        }
    }

    fn syntax(&self) -> Result<SyntaxConfig, SiteError> {
        Ok(SyntaxConfig::builder()
            .block_delimiters(self.block.0.clone(), self.block.1.clone())
            .variable_delimiters(self.variable.0.clone(), self.variable.1.clone())
            .comment_delimiters(self.comment.0.clone(), self.comment.1.clone())
            .build()?)
    }

    /// Rewrite a template written with `from` markers to these markers.
    fn translate(&self, source: &str, from: &Delimiters) -> String {
        if self == from {
            return source.to_owned();
        }
        // Longer markers first so `[[%` is not consumed as `[[`.
        [
            (&from.block.0, &self.block.0),
            (&from.comment.0, &self.comment.0),
            (&from.variable.0, &self.variable.0),
            (&from.block.1, &self.block.1),
            (&from.comment.1, &self.comment.1),
            (&from.variable.1, &self.variable.1),
        ]
        .into_iter()
        .fold(source.to_owned(), |text, (old, new)| text.replace(old.as_str(), new))
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new(DEFAULT_DELIM_LEFT, DEFAULT_DELIM_RIGHT)
    }
}

/// A compiled page ready to render.
pub(crate) struct CompiledPage {
    env: Environment<'static>,
    entry: String,
}

impl CompiledPage {
    /// Compile template files read from disk.
    pub(crate) fn from_files(
        entry: String,
        files: &[PathBuf],
        delimiters: &Delimiters,
        funcs: &FuncMap,
    ) -> Result<Self, SiteError> {
        let mut env = environment(delimiters, funcs)?;
        for file in files {
            let source = fs::read_to_string(file).map_err(|e| SiteError::io(file, e))?;
            env.add_template_owned(file_name(file), source)?;
        }
        Ok(Self { env, entry })
    }

    /// Compile one of the built-in templates.
    pub(crate) fn embedded(name: &'static str, source: &'static str, funcs: &FuncMap) -> Result<Self, SiteError> {
        let mut env = environment(&Delimiters::default(), funcs)?;
        env.add_template(name, source)?;
        Ok(Self {
            env,
            entry: name.to_owned(),
        })
    }

    pub(crate) fn render(&self, data: &PageData) -> Result<String, SiteError> {
        let template = self.env.get_template(&self.entry)?;
        Ok(template.render(data)?)
    }
}

/// Entry template of a page: its first component, which usually extends the
/// layout, or the layout itself (`.html` appended when the name has no
/// extension) for pages without components.
pub(crate) fn entry_name(layout: &str, components: &[PathBuf]) -> Option<String> {
    if let Some(first) = components.first() {
        return Some(file_name(first));
    }
    if layout.is_empty() {
        None
    } else if Path::new(layout).extension().is_some() {
        Some(layout.to_owned())
    } else {
        Some(format!("{layout}.html"))
    }
}

fn environment(delimiters: &Delimiters, funcs: &FuncMap) -> Result<Environment<'static>, SiteError> {
    let mut env = Environment::new();
    env.set_syntax(delimiters.syntax()?);
    env.set_auto_escape_callback(|name| {
        if name.ends_with(".html") || name.ends_with(".htm") {
            AutoEscape::Html
        } else {
            AutoEscape::None
        }
    });
    funcs.register(&mut env);
    let common = delimiters.translate(COMMON_SOURCE, &Delimiters::default());
    env.add_template_owned(COMMON_TEMPLATE, common)?;
    Ok(env)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetaData;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn page_data(title: &str) -> PageData {
        let mut metadata = MetaData::site_defaults();
        metadata.set_title(title);
        PageData {
            metadata,
            ..PageData::default()
        }
    }

    #[test]
    fn test_delimiters_custom_pair() {
        let d = Delimiters::new("<%", "%>");
        assert_eq!(d.variable, ("<%".to_owned(), "%>".to_owned()));
        assert_eq!(d.block, ("<%%".to_owned(), "%%>".to_owned()));
        assert_eq!(d.comment, ("<%#".to_owned(), "#%>".to_owned()));
    }

    #[test]
    fn test_delimiters_jinja_pair() {
        let d = Delimiters::new("{{", "}}");
        assert_eq!(d.block, ("{%".to_owned(), "%}".to_owned()));
    }

    #[test]
    fn test_translate_common_markers() {
        let jinja = Delimiters::new("{{", "}}");
        let out = jinja.translate("[[% if x %]][[ x ]][[# c #]][[% endif %]]", &Delimiters::default());
        assert_eq!(out, "{% if x %}{{ x }}{# c #}{% endif %}");
    }

    #[test]
    fn test_entry_name() {
        let components = vec![PathBuf::from("/t/home.html"), PathBuf::from("/t/nav.html")];
        assert_eq!(entry_name("main", &components).unwrap(), "home.html");
        assert_eq!(entry_name("main", &[]).unwrap(), "main.html");
        assert_eq!(entry_name("feed.xml", &[]).unwrap(), "feed.xml");
        assert_eq!(entry_name("", &[]), None);
    }

    #[test]
    fn test_only_html_is_escaped() {
        let dir = TempDir::new().unwrap();
        let html = write(&dir, "a.html", "[[ metadata.title ]]");
        let text = write(&dir, "a.txt", "[[ metadata.title ]]");
        let data = page_data("<b>");
        let render = |entry: &str, file: PathBuf| {
            CompiledPage::from_files(entry.into(), &[file], &Delimiters::default(), &FuncMap::standard())
                .unwrap()
                .render(&data)
                .unwrap()
        };
        assert_eq!(render("a.html", html), "&lt;b&gt;");
        assert_eq!(render("a.txt", text), "<b>");
    }

    #[test]
    fn test_render_layout_with_components() {
        let dir = TempDir::new().unwrap();
        let layout = write(
            &dir,
            "main.html",
            "<title>[[ metadata.title ]]</title>[[% include \"content.html\" %]]",
        );
        let content = write(&dir, "content.html", "<p>[[ metadata.title | upper ]]</p>");

        let page = CompiledPage::from_files(
            "main.html".into(),
            &[layout, content],
            &Delimiters::default(),
            &FuncMap::standard(),
        )
        .unwrap();
        assert_eq!(
            page.render(&page_data("Home")).unwrap(),
            "<title>Home</title><p>HOME</p>"
        );
    }

    #[test]
    fn test_render_with_custom_delimiters_and_common_macros() {
        let dir = TempDir::new().unwrap();
        let file = write(
            &dir,
            "page.html",
            "{% import \"common.html\" as common %}{{ common.meta(metadata) }}",
        );
        let page = CompiledPage::from_files(
            "page.html".into(),
            &[file],
            &Delimiters::new("{{", "}}"),
            &FuncMap::standard(),
        )
        .unwrap();
        let html = page.render(&page_data("Docs")).unwrap();
        assert!(html.contains("<title>Docs</title>"));
        assert!(html.contains(r#"<meta name="keywords" content="tiny">"#));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CompiledPage::from_files(
            "main.html".into(),
            &[PathBuf::from("/nonexistent/main.html")],
            &Delimiters::default(),
            &FuncMap::standard(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SiteError::Io { .. }));
    }

    #[test]
    fn test_missing_entry_is_template_error() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "other.html", "x");
        let page = CompiledPage::from_files(
            "main.html".into(),
            &[file],
            &Delimiters::default(),
            &FuncMap::standard(),
        )
        .unwrap();
        assert!(matches!(
            page.render(&PageData::default()),
            Err(SiteError::Template(_))
        ));
    }

    #[test]
    fn test_embedded_templates_compile() {
        for page in DEFAULT_PAGES {
            CompiledPage::embedded(page.template, page.source, &FuncMap::standard()).unwrap();
        }
    }
}

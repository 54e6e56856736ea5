//! Page route patterns.
//!
//! Page paths use `{name}` parameters, optionally after literal text in the
//! same segment (`/v{version}`), and a `{*rest}` catch-all as the whole last
//! segment. The HTTP router refuses anything else and cannot hold two routes
//! that differ only in their dynamic segments.

/// Why a page path cannot be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("path must start with '/'")]
    NotAbsolute,
    #[error("segments must not start with ':', use {{name}} parameters")]
    ColonParameter,
    #[error("a segment holds at most one parameter, at its end")]
    ParameterPlacement,
    #[error("parameter names must be non-empty letters, digits or '_'")]
    ParameterName,
    #[error("a catch-all parameter must be the whole last segment")]
    CatchAllPlacement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    /// Parameter after optional literal text.
    Param { prefix: String, name: String },
    CatchAll { name: String },
}

/// A parsed page path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a page path.
    ///
    /// # Errors
    ///
    /// Returns the first reason the path cannot be routed.
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let rest = path.strip_prefix('/').ok_or(RouteError::NotAbsolute)?;
        let parts: Vec<&str> = rest.split('/').collect();
        let last = parts.len() - 1;
        let segments = parts
            .iter()
            .enumerate()
            .map(|(i, part)| parse_segment(part, i == last))
            .collect::<Result<_, _>>()?;
        Ok(Self { segments })
    }

    /// Whether both patterns cannot be registered in the same router.
    ///
    /// Routes conflict when they have the same shape, whatever their
    /// parameter names, or when they first diverge at two dynamic segments
    /// that differ in kind, prefix or name. A static segment next to a
    /// dynamic one never conflicts.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        for (a, b) in self.segments.iter().zip(&other.segments) {
            match (a, b) {
                (Segment::Static(x), Segment::Static(y)) if x == y => {}
                (Segment::Static(_), _) | (_, Segment::Static(_)) => return false,
                (a, b) if a == b => {}
                _ => return true,
            }
        }
        self.segments.len() == other.segments.len()
    }
}

/// Routes taken by static files mounted under `prefix`: the prefix itself
/// and everything below it. Empty when the prefix cannot be mounted.
#[must_use]
pub fn static_mount_patterns(prefix: &str) -> Vec<RoutePattern> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() || !prefix.starts_with('/') {
        return Vec::new();
    }
    [prefix.to_owned(), format!("{prefix}/{{*path}}")]
        .iter()
        .filter_map(|path| RoutePattern::parse(path).ok())
        .collect()
}

fn parse_segment(part: &str, last: bool) -> Result<Segment, RouteError> {
    if part.starts_with(':') {
        return Err(RouteError::ColonParameter);
    }
    let Some(open) = part.find('{') else {
        if part.contains('}') {
            return Err(RouteError::ParameterPlacement);
        }
        return Ok(Segment::Static(part.to_owned()));
    };

    let (prefix, param) = part.split_at(open);
    let name = param[1..]
        .strip_suffix('}')
        .ok_or(RouteError::ParameterPlacement)?;
    if name.contains(['{', '}']) {
        return Err(RouteError::ParameterPlacement);
    }
    if let Some(name) = name.strip_prefix('*') {
        check_name(name)?;
        if !prefix.is_empty() || !last {
            return Err(RouteError::CatchAllPlacement);
        }
        return Ok(Segment::CatchAll { name: name.to_owned() });
    }
    check_name(name)?;
    Ok(Segment::Param {
        prefix: prefix.to_owned(),
        name: name.to_owned(),
    })
}

fn check_name(name: &str) -> Result<(), RouteError> {
    if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(RouteError::ParameterName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn conflict(a: &str, b: &str) -> bool {
        let a = RoutePattern::parse(a).unwrap();
        let b = RoutePattern::parse(b).unwrap();
        assert_eq!(a.conflicts_with(&b), b.conflicts_with(&a));
        a.conflicts_with(&b)
    }

    #[test]
    fn test_parse_accepts_supported_paths() {
        for path in [
            "/",
            "/about",
            "/blog/",
            "/sitemap.xml",
            "/posts/{id}",
            "/v{version}/docs",
            "/files/{*rest}",
        ] {
            assert!(RoutePattern::parse(path).is_ok(), "{path}");
        }
    }

    #[test]
    fn test_parse_rejects_unsupported_paths() {
        let cases = [
            ("posts", RouteError::NotAbsolute),
            ("/posts/:id", RouteError::ColonParameter),
            ("/{id}.json", RouteError::ParameterPlacement),
            ("/a/{id}{other}", RouteError::ParameterPlacement),
            ("/a/id}", RouteError::ParameterPlacement),
            ("/posts/{}", RouteError::ParameterName),
            ("/posts/{id:[0-9]+}", RouteError::ParameterName),
            ("/a/{*rest}/b", RouteError::CatchAllPlacement),
            ("/a/x{*rest}", RouteError::CatchAllPlacement),
        ];
        for (path, expected) in cases {
            assert_eq!(RoutePattern::parse(path), Err(expected), "{path}");
        }
    }

    #[test]
    fn test_same_shape_conflicts() {
        assert!(conflict("/same", "/same"));
        assert!(conflict("/posts/{id}", "/posts/{slug}"));
        assert!(conflict("/files/{*rest}", "/files/{*path}"));
    }

    #[test]
    fn test_different_dynamic_segments_conflict() {
        assert!(conflict("/a/{*rest}", "/a/{id}"));
        assert!(conflict("/a/{id}", "/a/x{id}"));
        assert!(conflict("/a/{*rest}", "/a/{id}/b"));
        assert!(conflict("/a/{id}", "/a/{slug}/b"));
    }

    #[test]
    fn test_static_and_dynamic_segments_coexist() {
        assert!(!conflict("/posts/new", "/posts/{id}"));
        assert!(!conflict("/files/readme", "/files/{*rest}"));
        assert!(!conflict("/posts/{id}", "/posts/{id}/comments"));
        assert!(!conflict("/blog", "/blog/"));
        assert!(!conflict("/a", "/b"));
    }

    #[test]
    fn test_static_mount_patterns() {
        let mount = static_mount_patterns("/static/");
        assert_eq!(mount.len(), 2);
        let overlaps = |path: &str| {
            let page = RoutePattern::parse(path).unwrap();
            mount.iter().any(|p| p.conflicts_with(&page))
        };
        assert!(overlaps("/static"));
        assert!(overlaps("/static/{*rest}"));
        assert!(overlaps("/static/{name}"));
        assert!(!overlaps("/static/x"));
        assert!(!overlaps("/statics"));

        assert!(static_mount_patterns("/").is_empty());
        assert!(static_mount_patterns("static").is_empty());
    }
}

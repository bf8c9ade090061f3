//! URL and path algebra
//!
//! Repository URLs are plain strings with path semantics: ancestry and
//! relativization always split at `/`, never inside a segment, and the
//! `scheme://authority` root is treated as an atomic prefix that no ancestor
//! computation descends below. Working-copy endpoints are ordinary
//! [`PathBuf`]s; the helpers here cover the few segment-aware operations the
//! copy handlers need on them.

use crate::error::{Error, ErrorKind, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static URL_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("valid url regex"));

/// True when the string names a repository URL rather than a local path.
pub fn is_url(s: &str) -> bool {
    URL_RE.is_match(s)
}

/// A canonical repository URL.
///
/// The empty URL is representable: it is what the ancestor computation yields
/// for two URLs with no common prefix, and the remote-access layer is
/// expected to reject it with [`ErrorKind::RaIllegalUrl`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Url(String);

impl Url {
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if !is_url(&s) {
            return Err(Error::new(
                ErrorKind::RaIllegalUrl,
                format!("'{s}' is not a repository URL"),
            ));
        }
        Ok(Url(s.trim_end_matches('/').to_string()))
    }

    pub fn empty() -> Self {
        Url(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into the atomic `scheme://authority` root and the path part.
    fn split_root(&self) -> (&str, &str) {
        match self.0.find("://") {
            Some(scheme_end) => {
                let after = scheme_end + 3;
                match self.0[after..].find('/') {
                    Some(path_start) => {
                        let root_len = after + path_start;
                        (&self.0[..root_len], &self.0[root_len + 1..])
                    }
                    None => (&self.0, ""),
                }
            }
            None => ("", &self.0),
        }
    }

    /// Append one or more path segments.
    pub fn join(&self, component: &str) -> Url {
        let component = component.trim_matches('/');
        if component.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return Url(component.to_string());
        }
        Url(format!("{}/{}", self.0, component))
    }

    /// The final path segment, or the empty string at the root.
    pub fn basename(&self) -> &str {
        let (_, path) = self.split_root();
        path.rsplit('/').next().unwrap_or("")
    }

    /// The URL with its final segment removed; the root is its own parent.
    pub fn dirname(&self) -> Url {
        let (root, path) = self.split_root();
        if path.is_empty() {
            return self.clone();
        }
        match path.rfind('/') {
            Some(idx) => Url(format!("{}/{}", root, &path[..idx])),
            None => Url(root.to_string()),
        }
    }

    /// The path of `other` relative to `self`, when `other` is strictly
    /// below `self`. Splits only at segment boundaries.
    pub fn is_child(&self, other: &Url) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let rest = other.0.strip_prefix(&self.0)?;
        let rest = rest.strip_prefix('/')?;
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }

    /// Longest ancestor shared by two URLs; empty when they do not share a
    /// `scheme://authority` root.
    pub fn longest_common_ancestor(&self, other: &Url) -> Url {
        let (root_a, path_a) = self.split_root();
        let (root_b, path_b) = other.split_root();
        if root_a.is_empty() || root_a != root_b {
            return Url::empty();
        }
        let common = longest_common_path(path_a, path_b);
        if common.is_empty() {
            Url(root_a.to_string())
        } else {
            Url(format!("{root_a}/{common}"))
        }
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One endpoint of a copy: a repository URL or a working-copy path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Repo(Url),
    Wc(PathBuf),
}

impl Target {
    /// Classify a user-supplied endpoint by its textual form.
    pub fn from_user_input(s: &str) -> Result<Target> {
        if is_url(s) {
            Ok(Target::Repo(Url::parse(s)?))
        } else {
            Ok(Target::Wc(PathBuf::from(s)))
        }
    }

    pub fn is_repo(&self) -> bool {
        matches!(self, Target::Repo(_))
    }

    pub fn as_url(&self) -> Result<&Url> {
        match self {
            Target::Repo(url) => Ok(url),
            Target::Wc(path) => Err(Error::new(
                ErrorKind::Base,
                format!("'{}' is not a repository URL", path.display()),
            )),
        }
    }

    pub fn as_wc_path(&self) -> Result<&Path> {
        match self {
            Target::Wc(path) => Ok(path),
            Target::Repo(url) => Err(Error::new(
                ErrorKind::Base,
                format!("'{url}' is not a working-copy path"),
            )),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Repo(url) => write!(f, "{url}"),
            Target::Wc(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Longest common prefix of two `/`-separated paths, splitting only at
/// segment boundaries. A shared leading `/` is preserved.
pub fn longest_common_path(a: &str, b: &str) -> String {
    let absolute = a.starts_with('/') && b.starts_with('/');
    let mut common = Vec::new();
    for (seg_a, seg_b) in a
        .trim_matches('/')
        .split('/')
        .zip(b.trim_matches('/').split('/'))
    {
        if seg_a != seg_b || seg_a.is_empty() {
            break;
        }
        common.push(seg_a);
    }
    let joined = common.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Join two `/`-separated path strings. Used by the retry-as-child fallback,
/// where the destination may be either a URL or a local path.
pub fn join(base: &str, component: &str) -> String {
    let component = component.trim_matches('/');
    if base.is_empty() {
        return component.to_string();
    }
    if component.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), component)
}

/// The final segment of a `/`-separated path string.
pub fn basename(s: &str) -> &str {
    s.trim_end_matches('/').rsplit('/').next().unwrap_or(s)
}

/// The containing directory of a local path; the current directory when the
/// path has no parent component.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// The path of `child` relative to `parent` when strictly below it.
pub fn path_is_child(parent: &Path, child: &Path) -> Option<PathBuf> {
    match child.strip_prefix(parent) {
        Ok(rest) if !rest.as_os_str().is_empty() => Some(rest.to_path_buf()),
        _ => None,
    }
}

/// Percent-decode a URI-encoded path fragment. Malformed escapes are kept
/// verbatim rather than rejected, matching lenient client behavior.
pub fn uri_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Some(byte) = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

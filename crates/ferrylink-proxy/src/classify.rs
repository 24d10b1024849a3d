//! Coarse file-type classification by URL shape.
//!
//! Classification is an ordered rule list evaluated top to bottom; the first
//! matching rule wins and [`FileKind::File`] is the fallback. Nothing here
//! touches the network.

use ferrylink_core::NormalizedUrl;
use serde::Serialize;

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "zst"];

const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "msi", "dmg", "pkg", "deb", "rpm", "apk", "appimage", "bin", "iso", "jar", "whl",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileKind {
    Release,
    #[serde(rename = "Source Code")]
    SourceCode,
    #[serde(rename = "Raw File")]
    RawFile,
    Archive,
    Binary,
    File,
}

impl FileKind {
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Release => "Release",
            FileKind::SourceCode => "Source Code",
            FileKind::RawFile => "Raw File",
            FileKind::Archive => "Archive",
            FileKind::Binary => "Binary",
            FileKind::File => "File",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Matcher {
    /// The URL path contains the fragment.
    PathContains(&'static str),
    /// The host equals one of the names.
    HostIs(&'static [&'static str]),
    /// The last path segment ends in `.ext` for one of the extensions.
    Extension(&'static [&'static str]),
}

impl Matcher {
    fn matches(&self, url: &NormalizedUrl) -> bool {
        match self {
            Matcher::PathContains(fragment) => url.path().contains(fragment),
            Matcher::HostIs(hosts) => hosts.iter().any(|h| h.eq_ignore_ascii_case(url.host())),
            Matcher::Extension(extensions) => extension(url).is_some_and(|ext| {
                extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub matcher: Matcher,
    pub kind: FileKind,
}

impl Rule {
    pub const fn new(matcher: Matcher, kind: FileKind) -> Self {
        Self { matcher, kind }
    }
}

/// The built-in rules, in evaluation order.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(Matcher::PathContains("/releases/download/"), FileKind::Release),
        Rule::new(Matcher::PathContains("/archive/"), FileKind::SourceCode),
        Rule::new(
            Matcher::HostIs(&["raw.githubusercontent.com", "gist.githubusercontent.com"]),
            FileKind::RawFile,
        ),
        Rule::new(Matcher::Extension(ARCHIVE_EXTENSIONS), FileKind::Archive),
        Rule::new(Matcher::Extension(BINARY_EXTENSIONS), FileKind::Binary),
    ]
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, url: &NormalizedUrl) -> FileKind {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(url))
            .map_or(FileKind::File, |rule| rule.kind)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

fn extension(url: &NormalizedUrl) -> Option<&str> {
    let segment = url.last_segment()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    (!stem.is_empty()).then_some(ext)
}

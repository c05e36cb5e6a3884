use crate::error::{Red64Error, Result};
use crate::markdown;
use crate::paths;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// RuleDocument / StandardDescriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDocument {
    pub name: String,
    pub content: String,
}

/// An enabled standards package that matched the current request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardDescriptor {
    pub identifier: String,
    pub file_patterns: Vec<String>,
    /// Sorted by document name.
    pub rule_documents: Vec<RuleDocument>,
    /// Position in `standards.enabled`; lower wins.
    pub enabled_rank: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardsMatch {
    /// Precedence order: earlier entries override later ones.
    pub standards: Vec<StandardDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precedence_note: Option<String>,
}

impl StandardsMatch {
    pub fn is_empty(&self) -> bool {
        self.standards.is_empty()
    }
}

pub fn precedence_note(first: &str) -> String {
    format!("Multiple standards apply. {first} takes precedence.")
}

// ---------------------------------------------------------------------------
// StandardsStore
// ---------------------------------------------------------------------------

/// Source of standards packages, keyed by identifier.
pub trait StandardsStore {
    /// Glob patterns a standard applies to. `Ok(None)` when the identifier is unknown.
    fn file_patterns(&self, identifier: &str) -> Result<Option<Vec<String>>>;

    /// Readable rule documents, sorted by name. Unknown identifiers yield an
    /// empty list.
    fn rule_documents(&self, identifier: &str) -> Result<Vec<RuleDocument>>;
}

#[derive(Debug, Deserialize)]
struct StandardsManifest {
    #[serde(default)]
    file_patterns: Vec<String>,
}

/// Plugins laid out as `<plugins>/<id>/standards.json` + `<plugins>/<id>/skills/*.md`.
#[derive(Debug, Clone)]
pub struct FsStandardsStore {
    plugins_dir: PathBuf,
}

impl FsStandardsStore {
    pub fn new(plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugins_dir: plugins_dir.into(),
        }
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }
}

impl StandardsStore for FsStandardsStore {
    fn file_patterns(&self, identifier: &str) -> Result<Option<Vec<String>>> {
        if !paths::standard_dir(&self.plugins_dir, identifier).is_dir() {
            return Ok(None);
        }
        let manifest = paths::standards_manifest(&self.plugins_dir, identifier);
        if !manifest.is_file() {
            return Ok(Some(Vec::new()));
        }
        let data = match std::fs::read_to_string(&manifest) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(standard = identifier, error = %e, "ignoring unreadable standards.json");
                return Ok(Some(Vec::new()));
            }
        };
        match serde_json::from_str::<StandardsManifest>(&data) {
            Ok(m) => Ok(Some(m.file_patterns)),
            Err(e) => {
                tracing::warn!(standard = identifier, error = %e, "ignoring unparsable standards.json");
                Ok(Some(Vec::new()))
            }
        }
    }

    fn rule_documents(&self, identifier: &str) -> Result<Vec<RuleDocument>> {
        let dir = paths::skills_dir(&self.plugins_dir, identifier);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(standard = identifier, error = %e, "ignoring unreadable skills directory");
                return Ok(Vec::new());
            }
        };
        let mut docs = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(e) => e.path(),
                Err(e) => {
                    tracing::warn!(standard = identifier, error = %e, "skipping unreadable skills entry");
                    continue;
                }
            };
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match std::fs::read_to_string(&path) {
                Ok(content) => docs.push(RuleDocument {
                    name: name.to_string(),
                    content,
                }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable rule document");
                }
            }
        }
        docs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(docs)
    }
}

// ---------------------------------------------------------------------------
// Glob matching
// ---------------------------------------------------------------------------

/// Compile a standard's patterns. Invalid patterns are logged and skipped so
/// one typo does not disable the whole standard.
pub fn compile_patterns(identifier: &str, patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => {
                let err = Red64Error::InvalidPattern {
                    standard: identifier.to_string(),
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!("{err}");
            }
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(standard = identifier, error = %e, "failed to build glob set");
        GlobSet::empty()
    })
}

fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// Whether a file signal falls under a compiled pattern set.
///
/// A bare extension (`.ts`) is tested as `test.ts`; anything else is tested
/// both as given and by its basename.
pub fn signal_matches(signal: &str, globs: &GlobSet) -> bool {
    if signal.starts_with('.') {
        return globs.is_match(format!("test{signal}"));
    }
    globs.is_match(signal) || globs.is_match(basename(signal))
}

/// Whether a concrete file path falls under a compiled pattern set (basename only).
pub fn file_matches(file_path: &str, globs: &GlobSet) -> bool {
    globs.is_match(basename(file_path))
}

// ---------------------------------------------------------------------------
// StandardsMatcher
// ---------------------------------------------------------------------------

pub struct StandardsMatcher<S> {
    store: S,
}

impl<S: StandardsStore> StandardsMatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Enabled standards whose patterns match any of `signals`, in enabled
    /// order, each with its rule documents loaded. Standards without any
    /// readable document are dropped.
    pub fn find_matches(&self, signals: &[String], enabled: &[String]) -> Result<StandardsMatch> {
        if signals.is_empty() || enabled.is_empty() {
            return Ok(StandardsMatch::default());
        }

        let mut standards = Vec::new();
        for (rank, identifier) in enabled.iter().enumerate() {
            let Some(patterns) = self.store.file_patterns(identifier)? else {
                tracing::debug!(standard = %identifier, "standard not installed");
                continue;
            };
            let globs = compile_patterns(identifier, &patterns);
            if !signals.iter().any(|s| signal_matches(s, &globs)) {
                continue;
            }
            let rule_documents = self.store.rule_documents(identifier)?;
            if rule_documents.is_empty() {
                tracing::debug!(standard = %identifier, "matched standard has no rule documents");
                continue;
            }
            standards.push(StandardDescriptor {
                identifier: identifier.clone(),
                file_patterns: patterns,
                rule_documents,
                enabled_rank: rank,
            });
        }

        let precedence_note = if standards.len() > 1 {
            Some(precedence_note(&standards[0].identifier))
        } else {
            None
        };

        Ok(StandardsMatch {
            standards,
            precedence_note,
        })
    }

    /// Enabled identifiers whose patterns match `file_path`'s basename, in
    /// enabled order.
    pub fn applicable_to_file(&self, file_path: &str, enabled: &[String]) -> Result<Vec<String>> {
        let mut applicable = Vec::new();
        for identifier in enabled {
            let Some(patterns) = self.store.file_patterns(identifier)? else {
                continue;
            };
            let globs = compile_patterns(identifier, &patterns);
            if file_matches(file_path, &globs) {
                applicable.push(identifier.clone());
            }
        }
        Ok(applicable)
    }
}

// ---------------------------------------------------------------------------
// DON'T patterns
// ---------------------------------------------------------------------------

/// Each document's DON'T section followed by the code samples inside it.
pub fn extract_dont_patterns(docs: &[RuleDocument]) -> Vec<String> {
    let mut patterns = Vec::new();
    for doc in docs {
        let section = markdown::dont_section(&doc.content);
        if section.is_empty() {
            continue;
        }
        let samples = markdown::fenced_code_blocks(&section);
        patterns.push(section);
        patterns.extend(samples);
    }
    patterns
}

/// Memoized DON'T patterns per standard identifier.
///
/// Owned by whoever runs validation; lives for one process at most. Output
/// with a fresh cache is identical to output with a warm one.
#[derive(Debug, Default)]
pub struct DontPatternCache {
    entries: HashMap<String, Vec<String>>,
}

impl DontPatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn patterns<S: StandardsStore>(&mut self, store: &S, identifier: &str) -> Result<&[String]> {
        if !self.entries.contains_key(identifier) {
            let docs = store.rule_documents(identifier)?;
            self.entries
                .insert(identifier.to_string(), extract_dont_patterns(&docs));
        }
        Ok(self
            .entries
            .get(identifier)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn install_standard(plugins: &Path, id: &str, patterns: &[&str], docs: &[(&str, &str)]) {
        let dir = paths::skills_dir(plugins, id);
        std::fs::create_dir_all(&dir).unwrap();
        let manifest = serde_json::json!({ "name": id, "file_patterns": patterns });
        std::fs::write(
            paths::standards_manifest(plugins, id),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();
        for (name, body) in docs {
            std::fs::write(dir.join(format!("{name}.md")), body).unwrap();
        }
    }

    fn ids(m: &StandardsMatch) -> Vec<&str> {
        m.standards.iter().map(|s| s.identifier.as_str()).collect()
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn two_matching_standards_keep_enabled_order() {
        let dir = TempDir::new().unwrap();
        install_standard(dir.path(), "A", &["*.ts"], &[("rules", "# A")]);
        install_standard(dir.path(), "B", &["*.ts"], &[("rules", "# B")]);
        let matcher = StandardsMatcher::new(FsStandardsStore::new(dir.path()));

        let m = matcher
            .find_matches(&strings(&[".ts"]), &strings(&["A", "B"]))
            .unwrap();
        assert_eq!(ids(&m), vec!["A", "B"]);
        assert_eq!(m.standards[0].enabled_rank, 0);
        assert_eq!(m.standards[1].enabled_rank, 1);
        let note = m.precedence_note.unwrap();
        assert!(note.contains("A takes precedence"));

        let m = matcher
            .find_matches(&strings(&[".ts"]), &strings(&["B", "A"]))
            .unwrap();
        assert_eq!(ids(&m), vec!["B", "A"]);
    }

    #[test]
    fn unreadable_package_is_skipped() {
        let dir = TempDir::new().unwrap();
        install_standard(dir.path(), "bad", &["*.ts"], &[("a", "x")]);
        install_standard(dir.path(), "good", &["*.ts"], &[("a", "y")]);
        std::fs::write(paths::standards_manifest(dir.path(), "bad"), [0xff, 0xfe, 0x00]).unwrap();
        let store = FsStandardsStore::new(dir.path());

        assert_eq!(store.file_patterns("bad").unwrap(), Some(Vec::new()));
        let m = StandardsMatcher::new(store)
            .find_matches(&strings(&[".ts"]), &strings(&["bad", "good"]))
            .unwrap();
        assert_eq!(ids(&m), vec!["good"]);
        assert!(m.precedence_note.is_none());
    }

    #[test]
    fn single_match_has_no_note() {
        let dir = TempDir::new().unwrap();
        install_standard(dir.path(), "ts", &["*.ts", "*.tsx"], &[("a", "x")]);
        install_standard(dir.path(), "py", &["*.py"], &[("a", "y")]);
        let matcher = StandardsMatcher::new(FsStandardsStore::new(dir.path()));

        let m = matcher
            .find_matches(&strings(&["app.tsx"]), &strings(&["ts", "py"]))
            .unwrap();
        assert_eq!(ids(&m), vec!["ts"]);
        assert!(m.precedence_note.is_none());
    }

    #[test]
    fn filename_and_path_signals_match_by_basename() {
        let dir = TempDir::new().unwrap();
        install_standard(dir.path(), "ts", &["*.ts"], &[("a", "x")]);
        let matcher = StandardsMatcher::new(FsStandardsStore::new(dir.path()));
        let enabled = strings(&["ts"]);

        assert_eq!(ids(&matcher.find_matches(&strings(&["app.ts"]), &enabled).unwrap()), vec!["ts"]);
        assert_eq!(
            ids(&matcher.find_matches(&strings(&["src/app.ts/"]), &enabled).unwrap()),
            vec!["ts"]
        );
        assert!(matcher
            .find_matches(&strings(&["src/lib/"]), &enabled)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn documents_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        install_standard(
            dir.path(),
            "ts",
            &["*.ts"],
            &[("zeta", "Z"), ("alpha", "A"), ("mid", "M")],
        );
        std::fs::write(paths::skills_dir(dir.path(), "ts").join("notes.txt"), "ignored").unwrap();
        let store = FsStandardsStore::new(dir.path());
        let names: Vec<_> = store
            .rule_documents("ts")
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn standard_without_documents_is_dropped() {
        let dir = TempDir::new().unwrap();
        install_standard(dir.path(), "empty", &["*.ts"], &[]);
        install_standard(dir.path(), "full", &["*.ts"], &[("a", "x")]);
        let matcher = StandardsMatcher::new(FsStandardsStore::new(dir.path()));

        let m = matcher
            .find_matches(&strings(&[".ts"]), &strings(&["empty", "full"]))
            .unwrap();
        assert_eq!(ids(&m), vec!["full"]);
        assert_eq!(m.standards[0].enabled_rank, 1);
        assert!(m.precedence_note.is_none());
    }

    #[test]
    fn missing_identifier_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let store = FsStandardsStore::new(dir.path());
        assert_eq!(store.file_patterns("ghost").unwrap(), None);
        assert!(store.rule_documents("ghost").unwrap().is_empty());

        let matcher = StandardsMatcher::new(store);
        let m = matcher
            .find_matches(&strings(&[".ts"]), &strings(&["ghost"]))
            .unwrap();
        assert!(m.is_empty());
    }

    #[test]
    fn invalid_manifest_matches_nothing() {
        let dir = TempDir::new().unwrap();
        install_standard(dir.path(), "bad", &["*.ts"], &[("a", "x")]);
        std::fs::write(paths::standards_manifest(dir.path(), "bad"), "{not json").unwrap();
        let store = FsStandardsStore::new(dir.path());
        assert_eq!(store.file_patterns("bad").unwrap(), Some(vec![]));
    }

    #[test]
    fn invalid_glob_is_skipped() {
        let globs = compile_patterns("x", &strings(&["[", "*.py"]));
        assert!(signal_matches(".py", &globs));
        assert!(!signal_matches(".ts", &globs));
    }

    #[test]
    fn star_crosses_directories_like_fnmatch() {
        let globs = compile_patterns("x", &strings(&["*.ts"]));
        assert!(globs.is_match("src/app.ts"));
    }

    #[test]
    fn applicable_to_file_uses_basename() {
        let dir = TempDir::new().unwrap();
        install_standard(dir.path(), "ts", &["*.ts"], &[("a", "x")]);
        install_standard(dir.path(), "py", &["*.py"], &[("a", "x")]);
        let matcher = StandardsMatcher::new(FsStandardsStore::new(dir.path()));
        let enabled = strings(&["py", "ts"]);

        assert_eq!(matcher.applicable_to_file("/repo/src/app.ts", &enabled).unwrap(), vec!["ts"]);
        assert!(matcher.applicable_to_file("README.md", &enabled).unwrap().is_empty());
    }

    #[test]
    fn dont_patterns_include_section_and_samples() {
        let docs = vec![
            RuleDocument {
                name: "a".into(),
                content: "## DO\n\nok\n\n## DON'T\n\nNo var.\n\n```js\nvar x = 1;\n```\n".into(),
            },
            RuleDocument {
                name: "b".into(),
                content: "## DO\n\nonly dos\n".into(),
            },
        ];
        let patterns = extract_dont_patterns(&docs);
        assert_eq!(patterns.len(), 2);
        assert!(patterns[0].starts_with("No var."));
        assert_eq!(patterns[1], "var x = 1;");
    }

    #[test]
    fn cache_matches_direct_extraction() {
        let dir = TempDir::new().unwrap();
        install_standard(dir.path(), "ts", &["*.ts"], &[("a", "## DON'T\n\nAvoid any.\n")]);
        let store = FsStandardsStore::new(dir.path());

        let direct = extract_dont_patterns(&store.rule_documents("ts").unwrap());
        let mut cache = DontPatternCache::new();
        let first = cache.patterns(&store, "ts").unwrap().to_vec();
        let second = cache.patterns(&store, "ts").unwrap().to_vec();
        assert_eq!(first, direct);
        assert_eq!(second, direct);
        assert_eq!(cache.len(), 1);
    }
}

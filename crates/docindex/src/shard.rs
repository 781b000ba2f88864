use crate::error::{DocIndexError, Result};
use crate::literal::{parse_assignment, Value};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity pattern is valid")
});

const SOURCE_EXTENSIONS: &[&str] = &[
    ".c", ".cc", ".cpp", ".cxx", ".h", ".hh", ".hpp", ".hxx", ".inl", ".ipp", ".tcc",
];

fn is_source_file(scope: &str) -> bool {
    let scope = scope.trim().to_ascii_lowercase();
    SOURCE_EXTENSIONS
        .iter()
        .any(|extension| scope.ends_with(extension))
}

/// File pages are named after the source file with `.` written as `_8`,
/// as in `_utils_8hpp.html` or `classifier_8cpp.html`.
fn is_file_page(file_name: &str) -> bool {
    let stem = file_name.strip_suffix(".html").unwrap_or(file_name);
    file_name.starts_with('_')
        || SOURCE_EXTENSIONS.iter().any(|extension| {
            stem.strip_suffix(&extension[1..])
                .is_some_and(|rest| rest.ends_with("_8"))
        })
}

/// Decode the HTML entities found in generated documentation strings
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |captures: &Captures| {
            let name = &captures[1];
            let decoded = match name.strip_prefix('#') {
                Some(code) => {
                    let code = match code.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => code.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }
                None => match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                },
            };
            decoded.map_or_else(|| captures[0].to_string(), String::from)
        })
        .into_owned()
}

/// What a search result points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    File,
    Class,
    Struct,
    FreeFunction,
    MemberFunction,
}

impl TargetKind {
    /// Infer the kind of a target from its page url and scope label
    pub fn infer(url: &str, scope: &str) -> Self {
        let (page, anchor) = match url.split_once('#') {
            Some((page, anchor)) => (page, Some(anchor)),
            None => (url, None),
        };
        let file_name = page.rsplit('/').next().unwrap_or(page);

        if anchor.is_none() {
            if is_file_page(file_name) {
                Self::File
            } else if file_name.starts_with("class") {
                Self::Class
            } else if file_name.starts_with("struct") {
                Self::Struct
            } else {
                Self::File
            }
        } else if is_source_file(scope) {
            Self::FreeFunction
        } else {
            Self::MemberFunction
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub url: String,
    pub flag: i64,
    /// Scope label, typically the enclosing file or class
    pub scope: String,
    pub kind: TargetKind,
}

/// One searchable key with the documentation anchors it leads to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEntry {
    /// Lowercase search key
    pub key: String,
    pub display: String,
    pub targets: Vec<Target>,
}

/// Search index shard, entries in file order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shard {
    pub entries: Vec<SearchEntry>,
}

impl Shard {
    /// Keys that appear in more than one entry, sorted, each listed once
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.key.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(key, _)| key)
            .collect()
    }

    /// First entry whose key matches the token, ignoring case
    pub fn lookup(&self, token: &str) -> Option<&SearchEntry> {
        let token = token.to_lowercase();
        self.entries.iter().find(|entry| entry.key.to_lowercase() == token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn invalid(index: usize, message: impl Into<String>) -> DocIndexError {
    DocIndexError::InvalidEntry {
        index,
        message: message.into(),
    }
}

fn parse_target(index: usize, value: &Value) -> Result<Target> {
    match value.as_list() {
        Some([url, flag, scope]) => {
            let url = url.as_str().ok_or_else(|| invalid(index, "target url is not a string"))?;
            let flag = flag.as_int().ok_or_else(|| invalid(index, "target flag is not an integer"))?;
            let scope = decode_entities(
                scope
                    .as_str()
                    .ok_or_else(|| invalid(index, "target scope is not a string"))?,
            );
            Ok(Target {
                kind: TargetKind::infer(url, &scope),
                url: url.to_string(),
                flag,
                scope,
            })
        }
        _ => Err(invalid(index, "target is not a [url, flag, scope] triple")),
    }
}

fn parse_entry(index: usize, value: &Value) -> Result<SearchEntry> {
    let (key, body) = match value.as_list() {
        Some([key, body]) => (key, body),
        _ => return Err(invalid(index, "entry is not a [key, [display, targets...]] pair")),
    };
    let key = key.as_str().ok_or_else(|| invalid(index, "key is not a string"))?;

    let (display, targets) = match body.as_list() {
        Some([display, targets @ ..]) => (display, targets),
        _ => return Err(invalid(index, "entry has no display name")),
    };
    let display = display
        .as_str()
        .ok_or_else(|| invalid(index, "display name is not a string"))?;

    Ok(SearchEntry {
        key: decode_entities(key),
        display: decode_entities(display),
        targets: targets
            .iter()
            .map(|target| parse_target(index, target))
            .collect::<Result<_>>()?,
    })
}

/// Parse a shard: `var searchData=[ [key, [display, [url, flag, scope], ...]], ... ];`
pub fn parse_shard(text: &str) -> Result<Shard> {
    let value = parse_assignment(text)?;
    let entries = value.as_list().ok_or(DocIndexError::Syntax {
        offset: 0,
        message: "search data is not an array".into(),
    })?;

    let shard = Shard {
        entries: entries
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_entry(index, entry))
            .collect::<Result<_>>()?,
    };
    log::debug!("parsed search shard with {} entries", shard.len());
    Ok(shard)
}

pub fn read_shard(path: impl AsRef<Path>) -> Result<Shard> {
    let text = std::fs::read_to_string(path)?;
    parse_shard(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SHARD: &str = r#"var searchData=
[
  ['scaletype',['ScaleType',['../_felzenszwalb_8hpp.html#aa40',1,'Felzenszwalb.hpp']]],
  ['segmentation_2eh',['Segmentation.h',['../_segmentation_8h.html',1,'']]],
  ['selftuningkernelmatrix',['SelfTuningKernelMatrix',['../class_self_tuning_kernel_matrix.html',1,'']]],
  ['setunion',['setUnion',['../class_disjoint_set_forest.html#a89',1,'DisjointSetForest']]],
  ['edge',['Edge',['../struct_edge.html',1,'']]],
  ['solve',['solve',['../_solver_8h.html#a30',1,'solve(const Eigen::SparseMatrix&lt; double &gt; &amp;L):&#160;Solver.cpp'],['../class_solver.html#ae9',1,'Solver']]],
  ['size',['size',['../class_disjoint_set_forest.html#a01',1,'DisjointSetForest']]],
  ['setunion',['setUnion',['../_utils_8hpp.html#a02',1,'Utils.cpp']]]
];
"#;

    #[test]
    fn test_parse_shard() {
        let shard = parse_shard(SHARD).unwrap();
        assert_eq!(shard.len(), 8);
        assert_eq!(shard.entries[0].display, "ScaleType");
        assert_eq!(shard.entries[5].targets.len(), 2);
        assert_eq!(
            shard.entries[5].targets[0].scope,
            "solve(const Eigen::SparseMatrix< double > &L):\u{a0}Solver.cpp"
        );
    }

    #[test]
    fn test_target_kinds() {
        let shard = parse_shard(SHARD).unwrap();
        let kinds: Vec<TargetKind> = shard.entries.iter().map(|entry| entry.targets[0].kind).collect();
        assert_eq!(
            kinds,
            vec![
                TargetKind::FreeFunction,
                TargetKind::File,
                TargetKind::Class,
                TargetKind::MemberFunction,
                TargetKind::Struct,
                TargetKind::FreeFunction,
                TargetKind::MemberFunction,
                TargetKind::FreeFunction,
            ]
        );
        assert_eq!(
            TargetKind::infer("../_graph_8h.html#a1", "WeightedGraph"),
            TargetKind::MemberFunction
        );
    }

    #[test]
    fn test_lowercase_type_pages() {
        let shard = parse_shard(
            "var searchData=[['svm_5fmodel',['svm_model',['../structsvm__model.html',1,'']]],\
             ['foo',['foo',['../classfoo.html',1,'']]],\
             ['classifier_2ecpp',['Classifier.cpp',['../classifier_8cpp.html',1,'']]],\
             ['structures_2eh',['structures.h',['../_structures_8h.html',1,'']]]];",
        )
        .unwrap();
        let kinds: Vec<TargetKind> = shard.entries.iter().map(|entry| entry.targets[0].kind).collect();
        assert_eq!(
            kinds,
            vec![TargetKind::Struct, TargetKind::Class, TargetKind::File, TargetKind::File]
        );
    }

    #[test]
    fn test_duplicates_and_lookup() {
        let shard = parse_shard(SHARD).unwrap();
        assert_eq!(shard.duplicate_keys(), vec!["setunion"]);
        assert_eq!(shard.lookup("SetUnion").map(|entry| entry.targets[0].flag), Some(1));
        assert_eq!(
            shard.lookup("SETUNION").map(|entry| entry.targets[0].scope.as_str()),
            Some("DisjointSetForest")
        );
        assert!(shard.lookup("missing").is_none());
    }

    #[test]
    fn test_invalid_entries() {
        assert!(matches!(
            parse_shard("var searchData=[['key']];"),
            Err(DocIndexError::InvalidEntry { index: 0, .. })
        ));
        assert!(matches!(
            parse_shard("var searchData=[['a',['A',['u',1,'s']]], ['b',['B',['u','x','s']]]];"),
            Err(DocIndexError::InvalidEntry { index: 1, .. })
        ));
        assert!(parse_shard("var searchData='text';").is_err());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#x41;&#66; &unknown;"), "a <b> AB &unknown;");
    }

    #[test]
    fn test_read_shard() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SHARD.as_bytes()).unwrap();
        assert_eq!(read_shard(file.path()).unwrap().len(), 8);
    }
}

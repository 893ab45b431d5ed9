use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};

use super::PostError;

/// One top-level key of the front matter together with its continuation
/// lines, or leading trivia (comments, blank lines) when `key` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub key: Option<String>,
    /// 1-based line in the whole file.
    pub line: usize,
    pub raw: String,
}

/// Lossless front matter block: concatenating `open`, every entry and `close`
/// gives back the exact bytes of the source.
#[derive(Debug, Clone)]
pub(crate) struct FrontMatter {
    pub open: String,
    pub entries: Vec<Entry>,
    pub close: String,
    pub values: Mapping,
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([A-Za-z0-9_][^:]*?)\s*:(\s|$)").unwrap())
}

fn yaml_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\bline (\d+)").unwrap())
}

/// serde_yaml counts lines from the start of the block; shift every
/// `line N` it mentions to a file line.
fn rebase_lines(message: &str, offset: usize) -> String {
    yaml_line_pattern()
        .replace_all(message, |caps: &regex::Captures| match caps[1].parse::<usize>() {
            Ok(line) => format!("line {}", line + offset),
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}

fn strip_eol(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Splits `source` into its front matter and the byte offset where the body
/// starts. Returns `Ok(None)` when the first line is not a `---` delimiter.
pub(crate) fn split(source: &str) -> Result<Option<(FrontMatter, usize)>, PostError> {
    let mut lines = source.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if strip_eol(first).trim_end() != "---" {
        return Ok(None);
    }

    let mut offset = first.len();
    let mut block = vec![];
    for line in lines {
        let content = strip_eol(line).trim_end();
        if content == "---" || content == "..." {
            let front_matter = FrontMatter::build(first, &block, line)?;
            return Ok(Some((front_matter, offset + line.len())));
        }
        block.push(line);
        offset += line.len();
    }

    Err(PostError::UnterminatedFrontMatter { line: 1 })
}

impl FrontMatter {
    fn build(open: &str, block: &[&str], close: &str) -> Result<Self, PostError> {
        let mut entries: Vec<Entry> = vec![];
        for (idx, line) in block.iter().enumerate() {
            // block lines start right after the opening delimiter
            let line_no = idx + 2;
            if let Some(caps) = key_pattern().captures(line) {
                entries.push(Entry {
                    key: Some(caps[1].to_string()),
                    line: line_no,
                    raw: line.to_string(),
                });
                continue;
            }
            match entries.last_mut() {
                Some(entry) => entry.raw.push_str(line),
                None => entries.push(Entry {
                    key: None,
                    line: line_no,
                    raw: line.to_string(),
                }),
            }
        }

        let yaml: String = block.concat();
        let values = if yaml.trim().is_empty() {
            Mapping::new()
        } else {
            match serde_yaml::from_str::<Value>(&yaml) {
                Ok(Value::Mapping(mapping)) => mapping,
                Ok(Value::Null) => Mapping::new(),
                Ok(_) => return Err(PostError::NotAMapping),
                Err(e) => {
                    // the block starts on the second line of the file
                    return Err(PostError::Yaml {
                        line: e.location().map_or(1, |l| l.line() + 1),
                        message: rebase_lines(&e.to_string(), 1),
                    });
                }
            }
        };

        Ok(Self {
            open: open.to_string(),
            entries,
            close: close.to_string(),
            values,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Line on which `key` is declared.
    pub fn line_of(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.key.as_deref() == Some(key))
            .map(|e| e.line)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| e.key.as_deref())
    }

    /// Number of lines taken by the block, delimiters included.
    pub fn line_count(&self) -> usize {
        2 + self.entries.iter().map(|e| e.raw.lines().count()).sum::<usize>()
    }

    pub fn to_source(&self) -> String {
        let mut out = self.open.clone();
        for entry in self.entries.iter() {
            out.push_str(&entry.raw);
        }
        out.push_str(&self.close);
        out
    }
}

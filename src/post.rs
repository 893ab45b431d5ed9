use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_yaml::Value;

mod front_matter;

pub(crate) use front_matter::FrontMatter;

#[derive(Debug, thiserror::Error)]
pub(crate) enum PostError {
    #[error("front matter opened on line {line} is never closed")]
    UnterminatedFrontMatter { line: usize },

    #[error("invalid YAML in front matter at line {line}: {message}")]
    Yaml { line: usize, message: String },

    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,
}

impl PostError {
    pub fn line(&self) -> Option<usize> {
        match self {
            PostError::UnterminatedFrontMatter { line } | PostError::Yaml { line, .. } => {
                Some(*line)
            }
            PostError::NotAMapping => Some(1),
        }
    }
}

/// A Markdown post: optional front matter followed by the body.
#[derive(Debug, Clone)]
pub(crate) struct Post {
    pub path: PathBuf,
    pub front_matter: Option<FrontMatter>,
    pub body: String,
    body_start_line: usize,
}

impl Post {
    pub fn parse(path: impl Into<PathBuf>, source: &str) -> Result<Self, PostError> {
        let (front_matter, body) = match front_matter::split(source)? {
            Some((front_matter, offset)) => (Some(front_matter), &source[offset..]),
            None => (None, source),
        };
        let body_start_line = front_matter.as_ref().map_or(1, |fm| fm.line_count() + 1);

        Ok(Self {
            path: path.into(),
            front_matter,
            body: body.to_string(),
            body_start_line,
        })
    }

    /// Re-serializes the post. For anything produced by `parse` this is the
    /// original source byte for byte.
    pub fn to_source(&self) -> String {
        let mut out = self
            .front_matter
            .as_ref()
            .map(FrontMatter::to_source)
            .unwrap_or_default();
        out.push_str(&self.body);
        out
    }

    /// 1-based file line of a byte offset into `body`.
    pub fn body_line(&self, offset: usize) -> usize {
        let offset = offset.min(self.body.len());
        let newlines = self.body.as_bytes()[..offset]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        self.body_start_line + newlines
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.front_matter.as_ref()?.get(key)
    }

    pub fn layout(&self) -> Option<String> {
        self.field("layout").and_then(scalar_to_string)
    }

    pub fn title(&self) -> Option<String> {
        self.field("title").and_then(scalar_to_string)
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.field("date")
            .and_then(scalar_to_string)
            .and_then(|s| parse_date(&s))
    }

    /// `categories` (or the singular `category`) as a list: either a YAML
    /// sequence or a space separated string. Order kept, duplicates dropped.
    pub fn categories(&self) -> Vec<String> {
        let Some(value) = self.categories_field().map(|(_, v)| v) else {
            return vec![];
        };
        let candidates: Vec<String> = match value {
            Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
            other => scalar_to_string(other)
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        };

        let mut categories: Vec<String> = vec![];
        for category in candidates {
            let category = category.trim().to_string();
            if !category.is_empty() && !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }

    /// Key actually used for categories along with its value.
    pub fn categories_field(&self) -> Option<(&'static str, &Value)> {
        ["categories", "category"]
            .into_iter()
            .find_map(|key| self.field(key).map(|v| (key, v)))
    }
}

pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time (`T` or space
/// separated, fractional seconds allowed) and a UTC offset, the way Jekyll
/// and YAML timestamps write post dates. The calendar date as written is kept.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }

    let with_offset = [
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S%.f %z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ];
    if let Some(datetime) = with_offset
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
    {
        return Some(datetime.date_naive());
    }

    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ]
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    .map(|datetime| datetime.date())
}

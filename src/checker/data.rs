use std::{fmt, path::PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Rule {
    FrontMatter,
    MissingField,
    Title,
    Date,
    Categories,
    Layout,
    CodeFence,
    CodeLanguage,
    Anchor,
    Section,
    RoundTrip,
    Io,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::FrontMatter => "front-matter",
            Rule::MissingField => "missing-field",
            Rule::Title => "title",
            Rule::Date => "date",
            Rule::Categories => "categories",
            Rule::Layout => "layout",
            Rule::CodeFence => "code-fence",
            Rule::CodeLanguage => "code-language",
            Rule::Anchor => "anchor",
            Rule::Section => "section",
            Rule::RoundTrip => "round-trip",
            Rule::Io => "io",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct Diagnostic {
    pub severity: Severity,
    pub rule: Rule,
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(rule: Rule, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            rule,
            line,
            message: message.into(),
        }
    }

    pub fn warning(rule: Rule, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            rule,
            line,
            message: message.into(),
        }
    }
}

#[derive(Serialize, Debug)]
pub(crate) struct FileReport {
    pub path: PathBuf,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

#[derive(Serialize, Debug, Default)]
pub(crate) struct Report {
    pub files: Vec<FileReport>,
    pub errors: usize,
    pub warnings: usize,
}

impl Report {
    pub fn push(&mut self, file: FileReport) {
        self.errors += file.count(Severity::Error);
        self.warnings += file.count(Severity::Warning);
        self.files.push(file);
    }
}

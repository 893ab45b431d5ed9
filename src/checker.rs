use std::path::PathBuf;

use chrono::NaiveDate;
use log::{debug, info};

use crate::{
    collect::{read_source, LoadError},
    config::Config,
    outline::Outline,
    post::Post,
};

pub(crate) mod data;
mod rules;

use data::{Diagnostic, FileReport, Report, Rule};

/// Runs every rule against a parsed post. `source` is the text the post was
/// parsed from; `today` bounds the date check. Diagnostics come back ordered
/// by line, file-level ones first.
pub(crate) fn check_post(
    post: &Post,
    source: &str,
    config: &Config,
    today: NaiveDate,
) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];

    match post.front_matter {
        Some(ref fm) => {
            rules::required_fields(fm, config, &mut diagnostics);
            rules::layout(fm, config, &mut diagnostics);
            rules::title(fm, &mut diagnostics);
            rules::date(fm, today, &mut diagnostics);
            rules::categories(post, fm, &mut diagnostics);
        }
        None => diagnostics.push(Diagnostic::error(
            Rule::FrontMatter,
            Some(1),
            "no front matter block (expected `---` on the first line)",
        )),
    }

    let outline = Outline::of(post);
    rules::code_blocks(&outline, config, &mut diagnostics);
    rules::anchors(&outline, &mut diagnostics);
    rules::sections(&outline, config, &mut diagnostics);
    rules::round_trip(post, source, &mut diagnostics);

    diagnostics.sort_by_key(|d| d.line.unwrap_or(0));
    diagnostics
}

pub(crate) fn check_files(files: &[PathBuf], config: &Config, today: NaiveDate) -> Report {
    let mut report = Report::default();

    for path in files {
        debug!("checking {path:?}");
        let loaded = read_source(path).and_then(|source| {
            let post = Post::parse(path, &source).map_err(LoadError::from)?;
            Ok((post, source))
        });
        let file_report = match loaded {
            Ok((post, source)) => FileReport {
                path: path.clone(),
                title: post.title(),
                date: post.date(),
                diagnostics: check_post(&post, &source, config, today),
            },
            Err(e) => FileReport {
                path: path.clone(),
                title: None,
                date: None,
                diagnostics: vec![e.to_diagnostic()],
            },
        };
        report.push(file_report);
    }

    info!(
        "checked {} posts: {} errors, {} warnings",
        report.files.len(),
        report.errors,
        report.warnings
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::data::Severity;
    use pretty_assertions::assert_eq;

    const GOOD: &str = r#"---
layout: post
title: "Request validation as middleware"
date: 2019-03-12 09:30:00 +0900
categories: [typescript, express]
---

Validation lives in a [middleware](#the-middleware) registered in the container.

## The middleware

```typescript
export class ValidationMiddleware {}
```

## References

- [class-validator](https://github.com/typestack/class-validator)
"#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    fn check(source: &str) -> Vec<Diagnostic> {
        check_with(source, &Config::default())
    }

    fn check_with(source: &str, config: &Config) -> Vec<Diagnostic> {
        let post = Post::parse("post.md", source).unwrap();
        check_post(&post, source, config, today())
    }

    fn rules(diagnostics: &[Diagnostic]) -> Vec<(Rule, Option<usize>)> {
        diagnostics.iter().map(|d| (d.rule, d.line)).collect()
    }

    #[test]
    fn well_formed_post_passes() {
        assert_eq!(check(GOOD), vec![]);
    }

    #[test]
    fn missing_front_matter() {
        let diagnostics = check("# Just a heading\n\n## References\n\nx\n");
        assert_eq!(rules(&diagnostics), vec![(Rule::FrontMatter, Some(1))]);
    }

    #[test]
    fn missing_fields_are_reported_individually() {
        let source = GOOD
            .replace("layout: post\n", "")
            .replace("categories: [typescript, express]\n", "");
        let diagnostics = check(&source);
        assert_eq!(
            diagnostics.iter().map(|d| d.message.as_str()).collect::<Vec<_>>(),
            vec!["front matter has no `layout`", "front matter has no `categories`"]
        );
    }

    #[test]
    fn singular_category_satisfies_required_categories() {
        let source = GOOD.replace("categories: [typescript, express]", "category: notes");
        assert_eq!(check(&source), vec![]);
    }

    #[test]
    fn iso_timestamps_are_valid_dates() {
        for date in ["2019-03-12T09:30:00+09:00", "2019-03-12T09:30:00Z"] {
            let source = GOOD.replace("2019-03-12 09:30:00 +0900", date);
            assert_eq!(check(&source), vec![], "for {date}");
        }
    }

    #[test]
    fn invalid_and_future_dates() {
        let diagnostics = check(&GOOD.replace("2019-03-12 09:30:00 +0900", "2019-13-40"));
        assert_eq!(rules(&diagnostics), vec![(Rule::Date, Some(4))]);
        assert_eq!(diagnostics[0].severity, Severity::Error);

        let diagnostics = check(&GOOD.replace("2019-03-12 09:30:00 +0900", "2030-01-01"));
        assert_eq!(rules(&diagnostics), vec![(Rule::Date, Some(4))]);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn categories_must_be_a_non_empty_set_of_tags() {
        let cases = [
            ("categories: []", "`categories` has no tags"),
            ("categories:", "`categories` has no tags"),
            ("categories: [rust, {a: b}]", "`categories` items must be text, found a mapping"),
            ("categories: [rust, '']", "`categories` contains an empty tag"),
            ("categories: {a: b}", "`categories` must be a list of tags, found a mapping"),
        ];
        for (line, message) in cases {
            let diagnostics = check(&GOOD.replace("categories: [typescript, express]", line));
            assert_eq!(
                diagnostics.iter().map(|d| d.message.as_str()).collect::<Vec<_>>(),
                vec![message],
                "for {line}"
            );
        }

        let diagnostics = check(&GOOD.replace("[typescript, express]", "rust rust"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn empty_title_and_disallowed_layout() {
        let config = Config {
            allowed_layouts: vec!["article".to_string()],
            ..Config::default()
        };
        let source = GOOD.replace("\"Request validation as middleware\"", "\"\"");
        let diagnostics = check_with(&source, &config);
        assert_eq!(
            rules(&diagnostics),
            vec![(Rule::Layout, Some(2)), (Rule::Title, Some(3))]
        );
    }

    #[test]
    fn unterminated_fence_is_an_error() {
        let source = GOOD.replace("## References\n", "```js\n\n## References\n");
        let diagnostics = check(&source);
        let fence: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.rule == Rule::CodeFence)
            .collect();
        assert_eq!(fence.len(), 1);
        assert_eq!(fence[0].line, Some(16));
    }

    #[test]
    fn untagged_fence_severity_follows_config() {
        let source = GOOD.replace("```typescript", "```");
        let diagnostics = check(&source);
        assert_eq!(rules(&diagnostics), vec![(Rule::CodeLanguage, Some(12))]);
        assert_eq!(diagnostics[0].severity, Severity::Warning);

        let config = Config {
            require_code_language: true,
            ..Config::default()
        };
        assert_eq!(check_with(&source, &config)[0].severity, Severity::Error);
    }

    #[test]
    fn broken_anchor_and_missing_references() {
        let source = GOOD
            .replace("(#the-middleware)", "(#no-such-heading)")
            .replace("## References", "## Links");
        let diagnostics = check(&source);
        assert_eq!(
            rules(&diagnostics),
            vec![(Rule::Section, None), (Rule::Anchor, Some(8))]
        );
    }

    #[test]
    fn empty_references_section() {
        let source = GOOD.replace(
            "- [class-validator](https://github.com/typestack/class-validator)\n",
            "",
        );
        let diagnostics = check(&source);
        assert_eq!(rules(&diagnostics), vec![(Rule::Section, Some(16))]);
    }

    #[test]
    fn round_trip_mismatch_is_reported() {
        let post = Post::parse("post.md", GOOD).unwrap();
        let altered = GOOD.replace("Validation lives", "Validation sits");
        let diagnostics = check_post(&post, &altered, &Config::default(), today());
        assert_eq!(rules(&diagnostics), vec![(Rule::RoundTrip, Some(8))]);
    }

    #[test]
    fn check_files_collects_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.md");
        let broken = dir.path().join("broken.md");
        std::fs::write(&good, GOOD).unwrap();
        std::fs::write(&broken, "---\ntitle: [\n---\n").unwrap();

        let report = check_files(&[broken.clone(), good.clone()], &Config::default(), today());
        assert_eq!(report.errors, 1);
        assert_eq!(report.warnings, 0);
        assert_eq!(report.files[0].diagnostics[0].rule, Rule::FrontMatter);
        assert_eq!(
            report.files[1].title.as_deref(),
            Some("Request validation as middleware")
        );
    }
}

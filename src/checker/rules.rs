use chrono::NaiveDate;
use serde_yaml::Value;

use crate::{
    config::Config,
    outline::Outline,
    post::{parse_date, scalar_to_string, FrontMatter, Post},
};

use super::data::{Diagnostic, Rule};

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

pub(super) fn required_fields(fm: &FrontMatter, config: &Config, out: &mut Vec<Diagnostic>) {
    for field in config.required_fields.iter() {
        let present = fm.contains(field) || (field == "categories" && fm.contains("category"));
        if !present {
            out.push(Diagnostic::error(
                Rule::MissingField,
                Some(1),
                format!("front matter has no `{field}`"),
            ));
        }
    }
}

/// Shared shape of `title` and `layout`: a non-empty scalar.
fn non_empty_scalar(
    fm: &FrontMatter,
    key: &str,
    rule: Rule,
    out: &mut Vec<Diagnostic>,
) -> Option<String> {
    let value = fm.get(key)?;
    let line = fm.line_of(key);
    match scalar_to_string(value) {
        Some(s) if !s.trim().is_empty() => Some(s),
        Some(_) => {
            out.push(Diagnostic::error(rule, line, format!("`{key}` is empty")));
            None
        }
        None if value.is_null() => {
            out.push(Diagnostic::error(rule, line, format!("`{key}` is empty")));
            None
        }
        None => {
            out.push(Diagnostic::error(
                rule,
                line,
                format!("`{key}` must be text, found a {}", type_name(value)),
            ));
            None
        }
    }
}

pub(super) fn title(fm: &FrontMatter, out: &mut Vec<Diagnostic>) {
    non_empty_scalar(fm, "title", Rule::Title, out);
}

pub(super) fn layout(fm: &FrontMatter, config: &Config, out: &mut Vec<Diagnostic>) {
    let Some(layout) = non_empty_scalar(fm, "layout", Rule::Layout, out) else {
        return;
    };
    if !config.allowed_layouts.is_empty() && !config.allowed_layouts.contains(&layout) {
        out.push(Diagnostic::error(
            Rule::Layout,
            fm.line_of("layout"),
            format!(
                "layout `{layout}` is not one of: {}",
                config.allowed_layouts.join(", ")
            ),
        ));
    }
}

pub(super) fn date(fm: &FrontMatter, today: NaiveDate, out: &mut Vec<Diagnostic>) {
    let Some(value) = fm.get("date") else {
        return;
    };
    let line = fm.line_of("date");
    let Some(text) = scalar_to_string(value) else {
        out.push(Diagnostic::error(
            Rule::Date,
            line,
            format!("`date` must be a date, found a {}", type_name(value)),
        ));
        return;
    };

    match parse_date(&text) {
        Some(date) if date > today => out.push(Diagnostic::warning(
            Rule::Date,
            line,
            format!("date {date} is in the future"),
        )),
        Some(_) => {}
        None => out.push(Diagnostic::error(
            Rule::Date,
            line,
            format!("`{text}` is not a valid date (expected YYYY-MM-DD)"),
        )),
    }
}

pub(super) fn categories(post: &Post, fm: &FrontMatter, out: &mut Vec<Diagnostic>) {
    let Some((key, value)) = post.categories_field() else {
        return;
    };
    let line = fm.line_of(key);

    let tags: Vec<String> = match value {
        Value::Sequence(items) => {
            let mut tags = vec![];
            for item in items {
                match scalar_to_string(item) {
                    Some(tag) if !tag.trim().is_empty() => tags.push(tag.trim().to_string()),
                    Some(_) => out.push(Diagnostic::error(
                        Rule::Categories,
                        line,
                        format!("`{key}` contains an empty tag"),
                    )),
                    None => out.push(Diagnostic::error(
                        Rule::Categories,
                        line,
                        format!("`{key}` items must be text, found a {}", type_name(item)),
                    )),
                }
            }
            tags
        }
        Value::Null => vec![],
        other => match scalar_to_string(other) {
            Some(s) => s.split_whitespace().map(str::to_string).collect(),
            None => {
                out.push(Diagnostic::error(
                    Rule::Categories,
                    line,
                    format!("`{key}` must be a list of tags, found a {}", type_name(other)),
                ));
                return;
            }
        },
    };

    if tags.is_empty() {
        out.push(Diagnostic::error(
            Rule::Categories,
            line,
            format!("`{key}` has no tags"),
        ));
        return;
    }

    let mut seen: Vec<&str> = vec![];
    for tag in tags.iter() {
        if seen.contains(&tag.as_str()) {
            out.push(Diagnostic::warning(
                Rule::Categories,
                line,
                format!("duplicate tag `{tag}`"),
            ));
        } else {
            seen.push(tag);
        }
    }
}

pub(super) fn code_blocks(outline: &Outline, config: &Config, out: &mut Vec<Diagnostic>) {
    for block in outline.code_blocks.iter() {
        if !block.closed {
            out.push(Diagnostic::error(
                Rule::CodeFence,
                Some(block.line),
                format!("code block opened with `{}` is never closed", block.fence),
            ));
        }
        if block.language.is_none() {
            let message = "code block has no language tag";
            out.push(if config.require_code_language {
                Diagnostic::error(Rule::CodeLanguage, Some(block.line), message)
            } else {
                Diagnostic::warning(Rule::CodeLanguage, Some(block.line), message)
            });
        }
    }
}

pub(super) fn anchors(outline: &Outline, out: &mut Vec<Diagnostic>) {
    for link in outline.anchor_links.iter() {
        if !outline.has_slug(&link.target) {
            out.push(Diagnostic::error(
                Rule::Anchor,
                Some(link.line),
                format!("link to `#{}` does not match any heading", link.target),
            ));
        }
    }
}

pub(super) fn sections(outline: &Outline, config: &Config, out: &mut Vec<Diagnostic>) {
    for name in config.required_sections.iter() {
        match outline.find_heading(name) {
            None => out.push(Diagnostic::error(
                Rule::Section,
                None,
                format!("missing `{name}` section"),
            )),
            Some(heading) if !heading.has_content => out.push(Diagnostic::error(
                Rule::Section,
                Some(heading.line),
                format!("`{}` section is empty", heading.text),
            )),
            Some(_) => {}
        }
    }
}

pub(super) fn round_trip(post: &Post, source: &str, out: &mut Vec<Diagnostic>) {
    let regenerated = post.to_source();
    if regenerated == source {
        return;
    }
    let line = regenerated
        .lines()
        .zip(source.lines())
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| regenerated.lines().count().min(source.lines().count()))
        + 1;
    out.push(Diagnostic::error(
        Rule::RoundTrip,
        Some(line),
        "re-serialized post differs from the file",
    ));
}

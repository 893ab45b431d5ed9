use std::collections::HashSet;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;

use crate::post::Post;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct Heading {
    pub level: u8,
    pub text: String,
    pub slug: String,
    pub line: usize,
    /// Whether anything but further headings follows before the section ends.
    pub has_content: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct CodeBlock {
    pub language: Option<String>,
    pub line: usize,
    pub fence: String,
    pub closed: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct AnchorLink {
    pub target: String,
    pub line: usize,
}

/// Structural view of a post body: headings, fenced code blocks and links
/// pointing inside the document.
#[derive(Serialize, Debug, Default)]
pub(crate) struct Outline {
    pub headings: Vec<Heading>,
    pub code_blocks: Vec<CodeBlock>,
    pub anchor_links: Vec<AnchorLink>,
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

/// Anchor id the way kramdown and GitHub derive it from heading text.
pub(crate) fn slugify(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else if c.is_whitespace() {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}

/// `base`, or `base-N` with the smallest N not taken yet.
fn unique_slug(base: String, assigned: &mut HashSet<String>) -> String {
    let mut slug = base.clone();
    let mut n = 0;
    while assigned.contains(&slug) {
        n += 1;
        slug = format!("{base}-{n}");
    }
    assigned.insert(slug.clone());
    slug
}

/// Fence marker (the run of backticks or tildes) opening a code block.
fn fence_marker(block: &str) -> String {
    let opener = block
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches([' ', '\t', '>']);
    match opener.chars().next() {
        Some(c @ ('`' | '~')) => opener.chars().take_while(|x| *x == c).collect(),
        _ => String::new(),
    }
}

/// pulldown-cmark closes an unterminated fence at the end of its container,
/// so look for a real closing fence on the last line of the block's span.
fn fence_is_closed(block: &str, marker: &str) -> bool {
    let Some(ch) = marker.chars().next() else {
        return false;
    };
    let Some(last) = block.lines().skip(1).last() else {
        return false;
    };
    let closer = last.trim_start_matches([' ', '\t', '>']).trim_end();
    closer.len() >= marker.len() && closer.chars().all(|c| c == ch)
}

impl Outline {
    pub fn of(post: &Post) -> Self {
        let body = post.body.as_str();
        let mut outline = Outline::default();
        let mut assigned_slugs: HashSet<String> = HashSet::new();

        // indices into `headings` of the sections still open
        let mut open_sections: Vec<usize> = vec![];
        let mut current_heading: Option<(u8, Option<String>, usize, String)> = None;

        for (event, range) in Parser::new_ext(body, parser_options()).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { level, id, .. }) => {
                    current_heading = Some((
                        level as u8,
                        id.map(|id| id.to_string()),
                        post.body_line(range.start),
                        String::new(),
                    ));
                }
                Event::End(TagEnd::Heading(_)) => {
                    let Some((level, id, line, text)) = current_heading.take() else {
                        continue;
                    };
                    let text = text.trim().to_string();
                    let slug = match id {
                        Some(id) => {
                            assigned_slugs.insert(id.clone());
                            id
                        }
                        None => unique_slug(slugify(&text), &mut assigned_slugs),
                    };

                    while open_sections
                        .last()
                        .is_some_and(|idx| outline.headings[*idx].level >= level)
                    {
                        open_sections.pop();
                    }
                    open_sections.push(outline.headings.len());
                    outline.headings.push(Heading {
                        level,
                        text,
                        slug,
                        line,
                        has_content: false,
                    });
                }
                Event::Text(text) | Event::Code(text) if current_heading.is_some() => {
                    if let Some((_, _, _, ref mut heading_text)) = current_heading {
                        heading_text.push_str(&text);
                    }
                }
                Event::Start(Tag::Link { dest_url, .. }) => {
                    if let Some(target) = dest_url.strip_prefix('#') {
                        if !target.is_empty() {
                            outline.anchor_links.push(AnchorLink {
                                target: target.to_string(),
                                line: post.body_line(range.start),
                            });
                        }
                    }
                }
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    let block = &body[range.clone()];
                    let fence = fence_marker(block);
                    outline.code_blocks.push(CodeBlock {
                        language: info.split_whitespace().next().map(str::to_string),
                        line: post.body_line(range.start),
                        closed: fence_is_closed(block, &fence),
                        fence,
                    });
                    mark_content(&mut outline.headings, &open_sections);
                }
                Event::Text(text) if !text.trim().is_empty() => {
                    mark_content(&mut outline.headings, &open_sections);
                }
                Event::Code(_)
                | Event::Html(_)
                | Event::InlineHtml(_)
                | Event::Rule
                | Event::FootnoteReference(_)
                | Event::Start(Tag::Image { .. })
                | Event::Start(Tag::Table(_)) => {
                    mark_content(&mut outline.headings, &open_sections);
                }
                _ => {}
            }
        }

        outline
    }

    pub fn find_heading(&self, text: &str) -> Option<&Heading> {
        self.headings
            .iter()
            .find(|h| h.text.eq_ignore_ascii_case(text.trim()))
    }

    pub fn has_slug(&self, slug: &str) -> bool {
        self.headings.iter().any(|h| h.slug == slug)
    }
}

fn mark_content(headings: &mut [Heading], open_sections: &[usize]) {
    for idx in open_sections {
        headings[*idx].has_content = true;
    }
}

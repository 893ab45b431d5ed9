use std::{
    borrow::Borrow,
    cmp::Ordering,
    collections::BTreeMap,
    fmt::Write as _,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use log::warn;
use serde::Serialize;

use crate::{collect::load_post, post::Post};

#[derive(Serialize, Debug, Clone)]
pub(crate) struct PostMeta {
    pub title: String,
    pub categories: Vec<String>,
    pub date: Option<NaiveDate>,
    pub path: PathBuf,
}

impl PostMeta {
    pub fn from_post(post: &Post) -> Self {
        let title = post.title().unwrap_or_else(|| {
            post.path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default()
        });
        Self {
            title,
            categories: post.categories(),
            date: post.date(),
            path: post.path.clone(),
        }
    }
}

/// Newest first; undated posts after dated ones; ties broken by title.
pub(crate) fn sort_post<T: Borrow<PostMeta>>(a: &T, b: &T) -> Ordering {
    let (a, b) = (a.borrow(), b.borrow());
    match (a.date, b.date) {
        (Some(ref a_date), Some(ref b_date)) => {
            b_date.cmp(a_date).then_with(|| a.title.cmp(&b.title))
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.title.cmp(&b.title),
    }
}

/// Loads every file, skipping the ones that fail to parse.
pub(crate) fn load_metas(files: &[PathBuf]) -> Vec<PostMeta> {
    let mut posts = vec![];
    for path in files {
        match load_post(path) {
            Ok(post) => posts.push(PostMeta::from_post(&post)),
            Err(e) => warn!("skipping {path:?}: {e}"),
        }
    }
    posts.sort_by(sort_post);
    posts
}

pub(crate) fn category_index(posts: &[PostMeta]) -> BTreeMap<&str, Vec<&PostMeta>> {
    let mut index: BTreeMap<&str, Vec<&PostMeta>> = BTreeMap::new();
    for post in posts {
        for category in post.categories.iter() {
            index.entry(category.as_str()).or_default().push(post);
        }
    }
    for entries in index.values_mut() {
        entries.sort_by(sort_post);
    }
    index
}

fn push_line(out: &mut String, post: &PostMeta, root: &Path, indent: &str) {
    let date = post
        .date
        .map_or_else(|| "----------".to_string(), |d| d.to_string());
    let path = post.path.strip_prefix(root).unwrap_or(&post.path);
    let _ = writeln!(out, "{indent}{date}  {}  ({})", post.title, path.display());
}

pub(crate) fn render_list(posts: &[PostMeta], root: &Path, by_category: bool) -> String {
    let mut out = String::new();
    if !by_category {
        for post in posts {
            push_line(&mut out, post, root, "");
        }
        return out;
    }

    for (category, entries) in category_index(posts) {
        let _ = writeln!(out, "{category} ({})", entries.len());
        for post in entries {
            push_line(&mut out, post, root, "  ");
        }
    }
    let uncategorized: Vec<_> = posts.iter().filter(|p| p.categories.is_empty()).collect();
    if !uncategorized.is_empty() {
        let _ = writeln!(out, "(uncategorized) ({})", uncategorized.len());
        for post in uncategorized {
            push_line(&mut out, post, root, "  ");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meta(title: &str, date: Option<(i32, u32, u32)>, categories: &[&str]) -> PostMeta {
        PostMeta {
            title: title.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            path: PathBuf::from(format!("/blog/{title}.md")),
        }
    }

    #[test]
    fn newest_first_then_undated_by_title() {
        let mut posts = vec![
            meta("b", None, &[]),
            meta("old", Some((2018, 1, 1)), &[]),
            meta("a", None, &[]),
            meta("new", Some((2020, 1, 1)), &[]),
        ];
        posts.sort_by(sort_post);
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "a", "b"]);
    }

    #[test]
    fn index_groups_by_category() {
        let posts = vec![
            meta("one", Some((2019, 1, 1)), &["rust", "web"]),
            meta("two", Some((2020, 1, 1)), &["web"]),
        ];
        let index = category_index(&posts);
        let web: Vec<_> = index["web"].iter().map(|p| p.title.as_str()).collect();
        assert_eq!(index.keys().copied().collect::<Vec<_>>(), vec!["rust", "web"]);
        assert_eq!(web, vec!["two", "one"]);
    }

    #[test]
    fn renders_listing() {
        let posts = vec![
            meta("two", Some((2020, 1, 1)), &["web"]),
            meta("draft", None, &[]),
        ];
        let root = Path::new("/blog");
        assert_eq!(
            render_list(&posts, root, false),
            "2020-01-01  two  (two.md)\n----------  draft  (draft.md)\n"
        );
        assert_eq!(
            render_list(&posts, root, true),
            "web (1)\n  2020-01-01  two  (two.md)\n\
             (uncategorized) (1)\n  ----------  draft  (draft.md)\n"
        );
    }

    #[test]
    fn title_falls_back_to_file_stem() {
        let post = Post::parse("posts/hello-world.md", "no front matter\n").unwrap();
        assert_eq!(PostMeta::from_post(&post).title, "hello-world");
    }
}

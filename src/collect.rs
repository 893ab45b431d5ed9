use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use log::debug;

use crate::{
    checker::data::{Diagnostic, Rule},
    post::{Post, PostError},
};

#[derive(Debug, thiserror::Error)]
pub(crate) enum LoadError {
    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] PostError),
}

impl LoadError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            LoadError::Io(_) => Diagnostic::error(Rule::Io, None, self.to_string()),
            LoadError::Parse(e) => Diagnostic::error(Rule::FrontMatter, e.line(), self.to_string()),
        }
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Every post below `article_dir`, traversed breadth first and returned
/// sorted by path.
pub(crate) fn find_posts(
    article_dir: &Path,
    extensions: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let mut posts = vec![];

    let mut q = VecDeque::new();
    q.push_back(article_dir.to_path_buf());
    while let Some(path) = q.pop_front() {
        let entries =
            std::fs::read_dir(&path).with_context(|| format!("while listing {path:?}"))?;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if is_hidden(&name) {
                debug!("skipping hidden entry {:?}", entry.path());
                continue;
            }

            let meta = entry.metadata()?;
            if meta.is_dir() {
                q.push_back(entry.path());
            } else if meta.is_file() && has_extension(&entry.path(), extensions) {
                posts.push(entry.path());
            }
        }
    }

    posts.sort();
    Ok(posts)
}

/// Expands explicit command line paths: directories are searched, files are
/// taken as they are.
pub(crate) fn expand_paths(
    paths: &[PathBuf],
    extensions: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = vec![];
    for path in paths {
        if path.is_dir() {
            files.extend(find_posts(path, extensions)?);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("{path:?} does not exist.");
        }
    }
    Ok(files)
}

pub(crate) fn read_source(path: &Path) -> Result<String, LoadError> {
    Ok(std::fs::read_to_string(path)?)
}

pub(crate) fn load_post(path: &Path) -> Result<Post, LoadError> {
    let source = read_source(path)?;
    Ok(Post::parse(path, &source)?)
}

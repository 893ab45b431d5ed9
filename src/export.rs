use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    outline::{CodeBlock, Heading, Outline},
    post::Post,
};

const KNOWN_KEYS: [&str; 5] = ["layout", "title", "date", "categories", "category"];

#[derive(Serialize, Debug)]
pub(crate) struct PostExport {
    pub path: PathBuf,
    pub layout: Option<String>,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub categories: Vec<String>,
    /// Front matter keys other than the ones above, in file order.
    pub extra: Map<String, Value>,
    pub headings: Vec<Heading>,
    pub code_blocks: Vec<CodeBlock>,
}

impl PostExport {
    pub fn from_post(post: &Post) -> anyhow::Result<Self> {
        let mut extra = Map::new();
        if let Some(ref fm) = post.front_matter {
            for key in fm.keys().filter(|k| !KNOWN_KEYS.contains(k)) {
                if let Some(value) = fm.get(key) {
                    let value = serde_json::to_value(value)
                        .with_context(|| format!("while converting `{key}` to JSON"))?;
                    extra.insert(key.to_string(), value);
                }
            }
        }

        let outline = Outline::of(post);
        Ok(Self {
            path: post.path.clone(),
            layout: post.layout(),
            title: post.title(),
            date: post.date(),
            categories: post.categories(),
            extra,
            headings: outline.headings,
            code_blocks: outline.code_blocks,
        })
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

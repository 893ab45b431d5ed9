use std::{path::PathBuf, sync::OnceLock};

use anyhow::anyhow;

use crate::config::Config;

#[derive(Debug)]
pub(crate) struct Context {
    pub article_dir: PathBuf,
    pub config: Config,
}

static CONTEXT: OnceLock<Context> = OnceLock::new();

impl Context {
    pub fn init(article_dir: PathBuf, config: Config) -> anyhow::Result<()> {
        CONTEXT
            .set(Self {
                article_dir,
                config,
            })
            .map_err(|_| anyhow!("context is already initialized"))
    }

    pub fn instance() -> &'static Context {
        CONTEXT.get().expect("context is not initialized")
    }
}

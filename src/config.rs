use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;
use log::info;
use serde::Deserialize;

/// Settings read from `postlint.json`. Every key is optional.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub required_fields: Vec<String>,
    /// Empty means any layout is accepted.
    pub allowed_layouts: Vec<String>,
    pub required_sections: Vec<String>,
    pub require_code_language: bool,
    pub extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            required_fields: ["layout", "title", "date", "categories"]
                .map(String::from)
                .to_vec(),
            allowed_layouts: vec![],
            required_sections: vec!["References".to_string()],
            require_code_language: false,
            extensions: vec!["md".to_string(), "markdown".to_string()],
        }
    }
}

pub(crate) fn load_config(config_path: &Path) -> anyhow::Result<Config> {
    if config_path.exists() {
        let fd = File::open(config_path)?;
        let reader = BufReader::new(fd);
        serde_json::from_reader(reader).with_context(|| format!("while reading {config_path:?}"))
    } else {
        info!("Config file({config_path:?}) does not exist. using defaults...");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("postlint.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"allowed_layouts": ["post"], "required_sections": []}}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.allowed_layouts, vec!["post"]);
        assert!(config.required_sections.is_empty());
        assert_eq!(config.extensions, vec!["md", "markdown"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"required_feilds": []}}"#).unwrap();
        assert!(load_config(file.path()).is_err());
    }
}

use std::path::Path;

use anyhow::Result;
use tracing::warn;
use vigil_common::{VigilConfig, VigilConfigStore};

pub fn load_config(path: &Path) -> Result<VigilConfig> {
    let store: VigilConfigStore = if path.exists() {
        serde_yaml::from_str(&std::fs::read_to_string(path)?)?
    } else {
        warn!(path = %path.display(), "Config file not found, using defaults");
        VigilConfigStore::default()
    };

    Ok(VigilConfig {
        store,
        paths_relative_to: path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    })
}

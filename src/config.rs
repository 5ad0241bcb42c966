use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchConfig {
    /// Extension appended to resolver-supplied file components that lack one.
    pub html_extension: String,
    /// URL base prepended to targets marked external.
    pub external_url_base: String,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            html_extension: ".html".to_string(),
            external_url_base: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    html_extension: Option<String>,
    external_url_base: Option<String>,
}

impl ConfigFile {
    fn apply(self, config: &mut PatchConfig) {
        if let Some(v) = self.html_extension {
            config.html_extension = v;
        }
        if let Some(v) = self.external_url_base {
            config.external_url_base = v;
        }
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<PatchConfig> {
    let mut config = PatchConfig::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;
    parsed.apply(&mut config);
    Ok(config)
}

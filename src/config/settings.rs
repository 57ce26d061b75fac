use serde::{Deserialize, Serialize};

/// Contents of config.json
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Settings {
    /// Root folder for orders, quotes and printouts. Empty means the
    /// platform default location.
    #[serde(default)]
    pub custom_data_path: String,
}

impl Settings {
    pub fn custom_data_path(&self) -> Option<&str> {
        let path = self.custom_data_path.trim();
        (!path.is_empty()).then_some(path)
    }
}

use serde::{Deserialize, Serialize};

/// Loader settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderParams {
    /// Parse at most this many stages; later stages are skipped and the skip
    /// is logged. `None` parses every stage.
    ///
    /// Useful for fast iteration with a short cascade excerpt, or to trade
    /// precision for speed with a full cascade.
    pub max_stages: Option<usize>,
}

impl LoaderParams {
    pub fn with_max_stages(max_stages: usize) -> Self {
        Self {
            max_stages: Some(max_stages),
        }
    }
}

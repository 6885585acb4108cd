//! Release loader configuration

use tracing::debug;

/// Environment variable that toggles parallel parsing of definitions
pub const PARALLEL_LOAD_ENV: &str = "CHISEL_PARALLEL_LOAD";

/// Where the release documents live and how they are read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    /// Root document, relative to the release directory
    pub release_file: String,
    /// Directory holding package definitions, relative to the release directory
    pub slices_dir: String,
    /// Parse package definitions on the rayon pool
    pub parallel: bool,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            release_file: "chisel.yaml".to_string(),
            slices_dir: "slices".to_string(),
            parallel: true,
        }
    }
}

impl ReleaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with [`PARALLEL_LOAD_ENV`] applied when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(PARALLEL_LOAD_ENV) {
            config.parallel = !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
            debug!("{}={} sets parallel loading to {}", PARALLEL_LOAD_ENV, value, config.parallel);
        }
        config
    }

    pub fn with_release_file(mut self, name: impl Into<String>) -> Self {
        self.release_file = name.into();
        self
    }

    pub fn with_slices_dir(mut self, name: impl Into<String>) -> Self {
        self.slices_dir = name.into();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

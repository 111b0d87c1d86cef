/// Runtime settings for disk control

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the record directory
pub const SAVE_DIR_ENV: &str = "DISKSWAP_SAVE_DIR";
/// Environment variable turning off suppressible notifications
pub const QUIET_ENV: &str = "DISKSWAP_QUIET";

/// Settings consumed by the presentation layer when driving a [`DiskControl`]
///
/// [`DiskControl`]: crate::DiskControl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory for index record files; `None` stores them beside the content
    pub save_dir: Option<PathBuf>,
    /// Show suppressible (informational) notifications
    pub notify: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_dir: Self::default_save_dir(),
            notify: true,
        }
    }
}

impl Settings {
    /// Settings that keep records next to the content
    pub fn beside_content() -> Self {
        Self {
            save_dir: None,
            notify: true,
        }
    }

    /// Platform data directory used when nothing else is configured
    pub fn default_save_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|mut p| {
            p.push("diskswap");
            p.push("saves");
            p
        })
    }

    /// Default settings overlaid with environment overrides
    pub fn from_env() -> Self {
        Self::default().with_overrides(env::var(SAVE_DIR_ENV).ok(), env::var(QUIET_ENV).ok())
    }

    fn with_overrides(mut self, save_dir: Option<String>, quiet: Option<String>) -> Self {
        if let Some(dir) = save_dir {
            self.save_dir = if dir.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }

        if let Some(quiet) = quiet {
            self.notify = !matches!(quiet.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        self
    }

    /// Set the record directory
    pub fn save_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    /// Set notification verbosity
    pub fn notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }
}

//! CLI command implementations.

pub mod build;
pub mod inspect;

use anyhow::Context as _;
use kiln_classpath::{EmbeddedResources, ResourceResolver};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{KilnConfig, CONFIG_FILE};
use crate::home::{find_home, IMAGE_DIR};

/// The classpath every command resolves against: configured entries in front
/// of the runtime image.
pub type Classpath = ResourceResolver<EmbeddedResources>;

/// Loaded configuration plus command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub config: KilnConfig,

    /// Directory relative classpath entries are resolved against.
    pub base_dir: PathBuf,

    /// `--classpath` entries, searched before the configured ones.
    pub extra_classpath: Vec<PathBuf>,
}

impl Context {
    /// Load the config named on the command line, or `./kiln.toml` if present.
    pub fn load(config_path: Option<&Path>, classpath: Option<&OsStr>) -> anyhow::Result<Self> {
        let (config, base_dir) = match config_path {
            Some(path) => {
                let config = KilnConfig::from_file(path)
                    .with_context(|| format!("failed to load {}", path.display()))?;
                (config, parent_dir(path))
            }
            None if Path::new(CONFIG_FILE).is_file() => {
                let path = Path::new(CONFIG_FILE);
                let config = KilnConfig::from_file(path)
                    .with_context(|| format!("failed to load {}", path.display()))?;
                (config, PathBuf::from("."))
            }
            None => (KilnConfig::default(), PathBuf::from(".")),
        };

        let extra_classpath = classpath
            .map(|value| std::env::split_paths(value).collect())
            .unwrap_or_default();

        Ok(Self {
            config,
            base_dir,
            extra_classpath,
        })
    }

    /// Effective classpath, highest precedence first.
    pub fn classpath_entries(&self) -> Vec<PathBuf> {
        let mut entries = self.extra_classpath.clone();
        entries.extend(self.config.classpath(&self.base_dir));
        entries
    }

    /// Runtime home directory, if one is configured.
    pub fn home(&self) -> Option<PathBuf> {
        find_home(self.config.image.home.as_deref())
    }

    /// Open the classpath. Fails if any declared archive cannot be opened.
    pub fn open_classpath(&self) -> anyhow::Result<Classpath> {
        let image = match self.home() {
            Some(home) => {
                let dir = home.join(IMAGE_DIR);
                debug!(path = %dir.display(), "runtime image");
                EmbeddedResources::from_dir(&dir)
            }
            None => EmbeddedResources::new(),
        };
        ResourceResolver::new(self.classpath_entries(), image).context("failed to open classpath")
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

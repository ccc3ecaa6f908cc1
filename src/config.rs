use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Store-name prefix for the app shell. The version tag is appended so a new
/// deploy never reads a previous deploy's entries.
const STATIC_STORE_PREFIX: &str = "static-news";
/// Store-name prefix for cached news API responses.
const DYNAMIC_STORE_PREFIX: &str = "dynamic-news";

/// URL schemes owned by browser extensions. Requests on these schemes are
/// left to the host entirely.
pub const EXTENSION_SCHEMES: &[&str] = &["chrome-extension", "moz-extension"];

/// Worker configuration, constructed once at startup and passed into each
/// handler. Asset membership is indexed up front so the fetch interceptor
/// classifies by set lookup rather than substring matching.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
  /// Version tag embedded in store names; bump it to invalidate every store
  /// from the previous deploy.
  pub version: String,
  /// Origin the app is served from; relative shell paths resolve against it.
  pub origin: String,
  /// App-shell assets cached at install time. Site-relative paths or
  /// absolute URLs.
  #[serde(default = "default_shell_assets")]
  pub shell_assets: Vec<String>,
  /// Requests under this path prefix are treated as news API traffic.
  #[serde(default = "default_api_prefix")]
  pub api_prefix: String,

  /// Normalized (leading-slash-stripped) shell paths for classification.
  #[serde(skip)]
  asset_paths: BTreeSet<String>,
  /// Absolute shell URLs, kept verbatim.
  #[serde(skip)]
  asset_urls: BTreeSet<String>,
}

fn default_shell_assets() -> Vec<String> {
  [
    "/",
    "/index.html",
    "/styles/main.css",
    "/scripts/app.js",
    "/icons/favicon.png",
    "https://fonts.googleapis.com/css2?family=Inter&display=swap",
  ]
  .iter()
  .map(|s| s.to_string())
  .collect()
}

fn default_api_prefix() -> String {
  "/api/news".to_string()
}

impl WorkerConfig {
  /// Create a configuration with the default shell list and API prefix.
  pub fn new(version: impl Into<String>, origin: impl Into<String>) -> Self {
    Self {
      version: version.into(),
      origin: origin.into(),
      shell_assets: default_shell_assets(),
      api_prefix: default_api_prefix(),
      asset_paths: BTreeSet::new(),
      asset_urls: BTreeSet::new(),
    }
    .indexed()
  }

  /// Replace the shell asset list.
  pub fn with_shell_assets(mut self, assets: Vec<String>) -> Self {
    self.shell_assets = assets;
    self.indexed()
  }

  /// Replace the news API path prefix.
  pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.api_prefix = prefix.into();
    self
  }

  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./newsproxy.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/newsproxy/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/newsproxy/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("newsproxy.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("newsproxy").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  /// Parse a YAML configuration document.
  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: WorkerConfig =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Invalid configuration: {}", e))?;
    Ok(config.indexed())
  }

  /// Build the classification indexes from the shell list. Paths lose their
  /// leading slash; absolute URLs are kept whole.
  fn indexed(mut self) -> Self {
    self.asset_paths.clear();
    self.asset_urls.clear();
    for asset in &self.shell_assets {
      if asset.contains("://") {
        self.asset_urls.insert(asset.clone());
      } else {
        self.asset_paths.insert(asset.trim_start_matches('/').to_string());
      }
    }
    self
  }

  /// Name of the app-shell store for the configured version.
  pub fn static_store_name(&self) -> String {
    format!("{}-{}", STATIC_STORE_PREFIX, self.version)
  }

  /// Name of the news-response store for the configured version.
  pub fn dynamic_store_name(&self) -> String {
    format!("{}-{}", DYNAMIC_STORE_PREFIX, self.version)
  }

  /// The two store names activation keeps; everything else is deleted.
  pub fn current_store_names(&self) -> [String; 2] {
    [self.static_store_name(), self.dynamic_store_name()]
  }

  /// Whether a request URL addresses one of the shell assets. Exact
  /// membership on the normalized path (or the whole URL for external
  /// assets); the root path always counts as shell.
  pub fn is_shell_asset(&self, url: &Url) -> bool {
    if self.asset_urls.contains(url.as_str()) {
      return true;
    }
    let path = url.path();
    if path == "/" {
      return true;
    }
    self.asset_paths.contains(path.trim_start_matches('/'))
  }

  /// Resolve a shell list entry to a fetchable URL.
  pub fn asset_url(&self, asset: &str) -> Result<Url> {
    if asset.contains("://") {
      return Url::parse(asset).map_err(|e| eyre!("Invalid shell asset URL {}: {}", asset, e));
    }
    let base =
      Url::parse(&self.origin).map_err(|e| eyre!("Invalid origin {}: {}", self.origin, e))?;
    base
      .join(asset)
      .map_err(|e| eyre!("Cannot resolve shell asset {} against {}: {}", asset, self.origin, e))
  }
}

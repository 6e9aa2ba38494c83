use crate::utils::get_data_dir;
use crate::validators::SanitizePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable replacing the configured primitive program
pub const PRIMITIVE_ENV: &str = "FWBRIDGE_PRIMITIVE";

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Program that implements the firewall primitive
    #[serde(default = "default_primitive_program")]
    pub primitive_program: String,
    /// Arguments placed before the sub-operation tag (e.g. a script path).
    /// Defaults to `firewall_controller.py` in the data directory.
    #[serde(default = "default_primitive_args")]
    pub primitive_args: Vec<String>,
    /// Run the primitive through run0/sudo/pkexec
    #[serde(default)]
    pub elevate: bool,
    /// Upper bound on concurrently running primitive processes
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_invocations: usize,
    /// Timeout applied by the CLI around each operation (0 = unbounded)
    #[serde(default)]
    pub timeout_secs: u64,
    /// Whether disallowed characters in rule names/ports are stripped or rejected
    #[serde(default)]
    pub sanitize_policy: SanitizePolicy,
    /// Cap on the number of managed rules returned by a listing
    #[serde(default)]
    pub max_listed_rules: Option<usize>,
    /// Record Toggle/AddRule in the audit log
    #[serde(default = "default_true")]
    pub enable_audit_log: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            primitive_program: default_primitive_program(),
            primitive_args: default_primitive_args(),
            elevate: false,
            max_concurrent_invocations: default_max_concurrent(),
            timeout_secs: 0,
            sanitize_policy: SanitizePolicy::default(),
            max_listed_rules: None,
            enable_audit_log: true,
        }
    }
}

fn default_primitive_program() -> String {
    "python".to_string()
}

/// Script run by the default interpreter, looked up next to `config.json`
pub const DEFAULT_PRIMITIVE_SCRIPT: &str = "firewall_controller.py";

/// Default script path, absolute when the data directory is known
fn default_primitive_args() -> Vec<String> {
    let script = get_data_dir().map_or_else(
        || DEFAULT_PRIMITIVE_SCRIPT.to_string(),
        |dir| dir.join(DEFAULT_PRIMITIVE_SCRIPT).display().to_string(),
    );
    vec![script]
}

fn default_max_concurrent() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl BridgeConfig {
    /// Timeout to wrap operations in, if any
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Points the bridge at a different primitive program.
    ///
    /// Prefix arguments belong to the previous program and are cleared.
    pub fn with_primitive(mut self, program: impl Into<String>) -> Self {
        self.primitive_program = program.into();
        self.primitive_args.clear();
        self
    }

    /// Applies `FWBRIDGE_PRIMITIVE` if set and non-empty
    pub fn apply_env(self) -> Self {
        match std::env::var(PRIMITIVE_ENV) {
            Ok(program) if !program.trim().is_empty() => self.with_primitive(program),
            _ => self,
        }
    }
}

/// Saves the config to `path` using an atomic write pattern.
/// 1. Writes to a temporary file.
/// 2. Sets restrictive permissions (0o600).
/// 3. Atomically renames to the target path.
pub async fn save_config_to(config: &BridgeConfig, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    let temp_path = path.with_extension("json.tmp");

    #[cfg(unix)]
    {
        use tokio::fs::OpenOptions;
        use tokio::io::AsyncWriteExt;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(0o600) // Set permissions BEFORE any data is written
            .open(&temp_path)
            .await?;

        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
    }

    #[cfg(not(unix))]
    {
        use tokio::io::AsyncWriteExt;

        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
    }

    tokio::fs::rename(temp_path, path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::StorageFull {
            std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                "Disk full: cannot save configuration. Free up space and try again.",
            )
        } else {
            e
        }
    })
}

/// Saves the config to the data directory
pub async fn save_config(config: &BridgeConfig) -> std::io::Result<()> {
    if let Some(mut path) = get_data_dir() {
        path.push("config.json");
        save_config_to(config, &path).await?;
    }
    Ok(())
}

/// Loads the config from `path`, or returns defaults if missing or invalid
pub async fn load_config_from(path: &Path) -> BridgeConfig {
    match tokio::fs::read_to_string(path).await {
        Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid config {}: {e}", path.display());
            BridgeConfig::default()
        }),
        Err(_) => BridgeConfig::default(),
    }
}

/// Loads the config from the data directory, or returns defaults
pub async fn load_config() -> BridgeConfig {
    match get_data_dir() {
        Some(mut path) => {
            path.push("config.json");
            load_config_from(&path).await
        }
        None => BridgeConfig::default(),
    }
}

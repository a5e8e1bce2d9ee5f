//! Services config loading, validation and persistence
//!
//! The services file is JSON: `{"services": [{"name", "workDir", "command"}, ...]}`.
//! Missing files are created empty on first load. Writes are crash-safe via
//! write-to-temp + fsync + rename.

use crate::{CoreError, Result};
use schema::{ServiceDefinition, ServicesFile};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding the config location
pub const CONFIG_ENV_VAR: &str = "TRAYMUX_CONFIG";

/// Return the default config path.
///
/// Order:
/// - `TRAYMUX_CONFIG` env var if provided
/// - `$HOME/.traymux/config.json` if HOME exists
/// - `./config.json` otherwise
pub fn default_config_path() -> PathBuf {
    if let Ok(p) = std::env::var(CONFIG_ENV_VAR) {
        return PathBuf::from(p);
    }
    if let Some(home) = dirs_next::home_dir() {
        return home.join(".traymux").join("config.json");
    }
    PathBuf::from("config.json")
}

/// Validate a single definition
pub fn validate_definition(definition: &ServiceDefinition) -> Result<()> {
    if definition.name.trim().is_empty() {
        return Err(CoreError::ValidationError(
            "service name cannot be empty".to_string(),
        ));
    }
    if definition.command.trim().is_empty() {
        return Err(CoreError::ValidationError(format!(
            "service '{}': command cannot be empty",
            definition.name
        )));
    }
    Ok(())
}

/// Validate the whole file: every definition valid, names unique
pub fn validate(file: &ServicesFile) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, definition) in file.services.iter().enumerate() {
        validate_definition(definition).map_err(|e| match e {
            CoreError::ValidationError(msg) => {
                CoreError::ValidationError(format!("services[{index}]: {msg}"))
            }
            other => other,
        })?;
        if !seen.insert(definition.name.as_str()) {
            return Err(CoreError::ValidationError(format!(
                "services[{index}]: duplicate service name '{}'",
                definition.name
            )));
        }
    }
    Ok(())
}

/// Load and validate a services file
pub fn load(path: impl AsRef<Path>) -> Result<ServicesFile> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|e| {
        CoreError::ConfigurationError(format!("Failed to read config {}: {}", path.display(), e))
    })?;
    let file: ServicesFile = serde_json::from_str(&data)?;
    validate(&file)?;
    debug!("Loaded {} services from {}", file.services.len(), path.display());
    Ok(file)
}

/// Load the services file, creating an empty one if it does not exist
pub fn load_or_create(path: impl AsRef<Path>) -> Result<ServicesFile> {
    let path = path.as_ref();
    if path.exists() {
        return load(path);
    }

    let file = ServicesFile::default();
    save(path, &file)?;
    info!("Created default config file: {}", path.display());
    Ok(file)
}

/// Atomically write the services file.
///
/// Steps:
/// - Ensure parent directory exists
/// - Write JSON to a temp file in the same directory
/// - `flush` + `sync_all` on the temp file
/// - `rename` temp file over the destination
/// - Best-effort fsync of the directory to persist rename
pub fn save(path: impl AsRef<Path>, file: &ServicesFile) -> Result<()> {
    let path = path.as_ref();
    validate(file)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CoreError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to create config dir {}: {}", parent.display(), e),
            ))
        })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let mut json = serde_json::to_vec_pretty(file)?;
    json.push(b'\n');

    {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| {
                CoreError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to open temp config {}: {}", tmp_path.display(), e),
                ))
            })?;
        f.write_all(&json).map_err(|e| {
            CoreError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to write temp config {}: {}", tmp_path.display(), e),
            ))
        })?;
        f.flush()?;
        // Best-effort durability
        let _ = f.sync_all();
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        CoreError::IoError(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to replace config {} with {}: {}",
                path.display(),
                tmp_path.display(),
                e
            ),
        ))
    })?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    debug!("Saved {} services to {}", file.services.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> ServicesFile {
        ServicesFile {
            services: vec![
                ServiceDefinition::new("web", "/srv/web", "python3 -m http.server 8000"),
                ServiceDefinition::new("worker", "/srv/app", "./worker --queue default"),
            ],
        }
    }

    #[test]
    fn load_or_create_writes_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let file = load_or_create(&path).expect("create");
        assert!(file.services.is_empty());
        assert!(path.exists());

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, serde_json::json!({"services": []}));
    }

    #[test]
    fn save_then_load_preserves_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        save(&path, &sample()).expect("save");
        let loaded = load_or_create(&path).expect("load");
        assert_eq!(loaded, sample());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupted_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ invalid json").unwrap();

        let err = load_or_create(&path).unwrap_err();
        assert!(matches!(err, CoreError::SerializationError(_)));
        // The broken file is left alone for the user to fix
        assert_eq!(fs::read(&path).unwrap(), b"{ invalid json");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut file = sample();
        file.services.push(ServiceDefinition::new("web", "/", "true"));

        let err = validate(&file).unwrap_err();
        assert!(err.to_string().contains("services[2]"), "{err}");
        assert!(err.to_string().contains("duplicate service name 'web'"));

        let dir = tempdir().unwrap();
        assert!(save(dir.path().join("config.json"), &file).is_err());
    }

    #[test]
    fn empty_fields_are_rejected() {
        let err = validate_definition(&ServiceDefinition::new("", "/", "true")).unwrap_err();
        assert_eq!(err.code(), "CORE002");

        let err = validate_definition(&ServiceDefinition::new("x", "/", "   ")).unwrap_err();
        assert!(err.to_string().contains("command cannot be empty"));

        // An empty working directory is allowed and means "inherit"
        assert!(validate_definition(&ServiceDefinition::new("x", "", "true")).is_ok());
    }

    #[test]
    fn missing_file_is_a_configuration_error_for_plain_load() {
        let dir = tempdir().unwrap();
        let err = load(dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), "CORE001");
    }
}

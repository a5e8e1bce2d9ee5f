//! Services file subcommands: list, add, edit, remove
//!
//! Each command loads the file (creating it if missing), applies one
//! change, and saves it back immediately.

use crate::{CliError, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;
use traymux_core::{config, CoreError, ServiceDefinition};

/// Field changes for `edit`; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceChanges {
    /// New name
    pub name: Option<String>,
    /// New working directory
    pub work_dir: Option<String>,
    /// New command line
    pub command: Option<String>,
}

impl ServiceChanges {
    /// Whether no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.work_dir.is_none() && self.command.is_none()
    }

    fn apply(self, definition: &mut ServiceDefinition) {
        if let Some(name) = self.name {
            definition.name = name;
        }
        if let Some(work_dir) = self.work_dir {
            definition.work_dir = work_dir;
        }
        if let Some(command) = self.command {
            definition.command = command;
        }
    }
}

/// Print every service as `name<TAB>workDir<TAB>command`
pub fn list(config_path: &Path, out: &mut impl Write) -> Result<()> {
    let file = config::load_or_create(config_path)?;
    if file.services.is_empty() {
        writeln!(out, "No services configured in {}", config_path.display())?;
        return Ok(());
    }
    for service in &file.services {
        let work_dir = if service.work_dir.is_empty() {
            "-"
        } else {
            service.work_dir.as_str()
        };
        writeln!(out, "{}\t{}\t{}", service.name, work_dir, service.command)?;
    }
    Ok(())
}

/// Append a service
pub fn add(config_path: &Path, definition: ServiceDefinition) -> Result<()> {
    let mut file = config::load_or_create(config_path)?;
    config::validate_definition(&definition)?;
    if file.find(&definition.name).is_some() {
        return Err(CoreError::DuplicateService(definition.name).into());
    }
    info!("Adding service '{}'", definition.name);
    file.services.push(definition);
    config::save(config_path, &file)?;
    Ok(())
}

/// Change fields of a service in place; returns the updated definition
pub fn edit(config_path: &Path, name: &str, changes: ServiceChanges) -> Result<ServiceDefinition> {
    if changes.is_empty() {
        return Err(CliError::InvalidArgument(
            "nothing to change; pass --name, --work-dir or --command".to_string(),
        ));
    }

    let mut file = config::load_or_create(config_path)?;
    let index = file
        .position(name)
        .ok_or_else(|| CoreError::ServiceNotFound(name.to_string()))?;

    let mut updated = file.services[index].clone();
    changes.apply(&mut updated);
    if updated.name != name && file.find(&updated.name).is_some() {
        return Err(CoreError::DuplicateService(updated.name).into());
    }

    info!("Save service: old:{:?}, new:{:?}", file.services[index], updated);
    file.services[index] = updated.clone();
    config::save(config_path, &file)?;
    Ok(updated)
}

/// Delete a service; returns the removed definition
pub fn remove(config_path: &Path, name: &str) -> Result<ServiceDefinition> {
    let mut file = config::load_or_create(config_path)?;
    let index = file
        .position(name)
        .ok_or_else(|| CoreError::ServiceNotFound(name.to_string()))?;
    let removed = file.services.remove(index);
    info!("Deleting service: {}", removed.name);
    config::save(config_path, &file)?;
    Ok(removed)
}

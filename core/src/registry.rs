//! Ordered registry of supervised services
//!
//! Services are addressed by name rather than by reference, so front ends
//! never hold on to a definition that a later add/edit/delete moved or
//! removed. All supervisors share one event channel; subscribe once with
//! [`ServiceRegistry::subscribe`] to hear about every unsolicited exit.

use crate::config::validate_definition;
use crate::supervisor::{ServiceSupervisor, EVENT_CHANNEL_CAPACITY};
use crate::{CoreError, Result};
use schema::{ServiceDefinition, ServiceStatus, ServicesFile, SupervisorEvent};
use tokio::sync::broadcast;
use tracing::{error, info};

/// Ordered collection of service supervisors keyed by name
#[derive(Debug)]
pub struct ServiceRegistry {
    services: Vec<ServiceSupervisor>,
    event_tx: broadcast::Sender<SupervisorEvent>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            services: Vec::new(),
            event_tx,
        }
    }

    /// Build a registry from definitions in display order
    ///
    /// # Errors
    ///
    /// Fails on the first invalid definition or duplicate name.
    pub fn from_definitions(definitions: impl IntoIterator<Item = ServiceDefinition>) -> Result<Self> {
        let mut registry = Self::new();
        for definition in definitions {
            registry.add(definition)?;
        }
        Ok(registry)
    }

    /// Build a registry from a loaded services file
    pub fn from_file(file: &ServicesFile) -> Result<Self> {
        Self::from_definitions(file.services.iter().cloned())
    }

    /// Receive exit notifications for every service
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.event_tx.subscribe()
    }

    /// Number of services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the registry has no services
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Service names in display order
    pub fn names(&self) -> Vec<String> {
        self.services.iter().map(|s| s.name().to_string()).collect()
    }

    /// Supervisors in display order
    pub fn iter(&self) -> impl Iterator<Item = &ServiceSupervisor> {
        self.services.iter()
    }

    /// Look up a supervisor by name
    pub fn get(&self, name: &str) -> Result<&ServiceSupervisor> {
        self.services
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| CoreError::ServiceNotFound(name.to_string()))
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.services
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| CoreError::ServiceNotFound(name.to_string()))
    }

    /// Definitions in display order
    pub fn definitions(&self) -> Vec<ServiceDefinition> {
        self.services.iter().map(|s| s.definition().clone()).collect()
    }

    /// The registry as a services file, ready to save
    pub fn to_file(&self) -> ServicesFile {
        ServicesFile {
            services: self.definitions(),
        }
    }

    /// `(name, status)` pairs in display order
    pub fn statuses(&self) -> Vec<(String, ServiceStatus)> {
        self.services
            .iter()
            .map(|s| (s.name().to_string(), s.status()))
            .collect()
    }

    /// Status of one service
    pub fn status(&self, name: &str) -> Result<ServiceStatus> {
        Ok(self.get(name)?.status())
    }

    /// Start a service by name
    pub async fn start(&self, name: &str) -> Result<()> {
        self.get(name)?.start().await
    }

    /// Stop a service by name
    pub async fn stop(&self, name: &str) -> Result<()> {
        self.get(name)?.stop().await
    }

    /// Toggle a service by name
    pub async fn toggle(&self, name: &str) -> Result<()> {
        self.get(name)?.toggle().await
    }

    /// Append a new service
    pub fn add(&mut self, definition: ServiceDefinition) -> Result<()> {
        validate_definition(&definition)?;
        if self.get(&definition.name).is_ok() {
            return Err(CoreError::DuplicateService(definition.name));
        }
        info!("Adding service '{}'", definition.name);
        self.services
            .push(ServiceSupervisor::new(definition, self.event_tx.clone()));
        Ok(())
    }

    /// Replace the definition of `name`, keeping its display position
    ///
    /// A running service is stopped first; the new definition starts stopped.
    pub async fn update(&mut self, name: &str, definition: ServiceDefinition) -> Result<()> {
        validate_definition(&definition)?;
        let index = self.position(name)?;
        if definition.name != name && self.get(&definition.name).is_ok() {
            return Err(CoreError::DuplicateService(definition.name));
        }

        self.services[index].stop().await?;
        info!("Updating service '{}' -> '{}'", name, definition.name);
        self.services[index] = ServiceSupervisor::new(definition, self.event_tx.clone());
        Ok(())
    }

    /// Remove a service, stopping it first if it is running
    pub async fn remove(&mut self, name: &str) -> Result<ServiceDefinition> {
        let index = self.position(name)?;
        self.services[index].stop().await?;
        let removed = self.services.remove(index);
        info!("Deleted service '{}'", name);
        Ok(removed.definition().clone())
    }

    /// Stop every running service
    ///
    /// Every service is attempted; the first error is returned afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        let mut first_error = None;
        for service in &self.services {
            if !service.status().is_running() {
                continue;
            }
            if let Err(e) = service.stop().await {
                error!("Error stopping service {}: {}", service.name(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

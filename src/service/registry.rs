use std::path::PathBuf;

use crate::config::Settings;
use crate::errors::{Result, TaskvisorError};
use crate::types::Service;

/// Static per-service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub service: Service,
    pub install_source: String,
    pub executable: PathBuf,
    pub log_path: PathBuf,
    pub pid_path: PathBuf,
}

/// Fixed mapping of services to their install source and on-disk paths.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    specs: Vec<ServiceSpec>,
}

impl ServiceRegistry {
    pub fn from_settings(settings: &Settings) -> Self {
        let specs = Service::ALL
            .iter()
            .map(|&service| ServiceSpec {
                service,
                install_source: settings.install_source(service).to_string(),
                executable: settings.layout.executable(service),
                log_path: settings.layout.log_path(service),
                pid_path: settings.layout.pid_path(service),
            })
            .collect();
        Self { specs }
    }

    /// Look a service up by name.
    pub fn resolve(&self, name: &str) -> Result<&ServiceSpec> {
        let service: Service = name
            .parse()
            .map_err(|_| TaskvisorError::ServiceNotFound(name.to_string()))?;
        Ok(self.spec(service))
    }

    pub fn spec(&self, service: Service) -> &ServiceSpec {
        // `from_settings` registers every variant of `Service::ALL` in order.
        &self.specs[service as usize]
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.specs.iter()
    }
}

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::{Layout, PRODUCT, Settings, ToolTemplate};
use crate::errors::{Result, TaskvisorError};
use crate::exec::{OutputMode, ToolInvocation, ToolRunner};
use crate::fs::FileSystem;
use crate::process::ProcessBackend;
use crate::service::launcher::Launcher;
use crate::service::liveness::{Liveness, LivenessChecker};
use crate::service::pid::PidStore;
use crate::service::registry::{ServiceRegistry, ServiceSpec};
use crate::service::stop::{StopPolicy, StopProtocol, StopReport};
use crate::types::{Service, ServiceStatus};

/// How deep below the package cache root product entries are searched for.
const CACHE_SEARCH_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    AlreadyInstalled,
    Installed,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(u32),
    AlreadyRunning(u32),
}

impl StartOutcome {
    pub fn pid(&self) -> u32 {
        match self {
            StartOutcome::Started(pid) | StartOutcome::AlreadyRunning(pid) => *pid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    NotRunning,
    Restarted(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRow {
    pub service: Service,
    pub status: ServiceStatus,
}

/// Status of every installed service, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub rows: Vec<StatusRow>,
}

impl StatusReport {
    pub fn status_of(&self, service: Service) -> Option<ServiceStatus> {
        self.rows
            .iter()
            .find(|row| row.service == service)
            .map(|row| row.status)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(8);
        writeln!(f, "{rule} SERVICES {rule}")?;
        writeln!(f, "{:<18} {:<18}", "NAME", "STATUS")?;
        for row in &self.rows {
            writeln!(f, "{:<18} {:<18}", row.service.as_str(), row.status.to_string())?;
        }
        write!(f, "{rule} SERVICES {rule}")
    }
}

/// Install, start, stop, restart and report on the registered services.
pub struct Supervisor<P, T> {
    layout: Layout,
    installer: ToolTemplate,
    registry: ServiceRegistry,
    fs: Arc<dyn FileSystem>,
    process: Arc<P>,
    tools: T,
    liveness: LivenessChecker<P>,
    launcher: Launcher<P>,
    stopper: StopProtocol<P>,
}

impl<P, T> fmt::Debug for Supervisor<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("layout", &self.layout)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<P: ProcessBackend, T: ToolRunner> Supervisor<P, T> {
    pub fn new(settings: &Settings, fs: Arc<dyn FileSystem>, process: P, tools: T) -> Self {
        let process = Arc::new(process);
        let pids = PidStore::new(Arc::clone(&fs));
        let liveness = LivenessChecker::new(pids.clone(), Arc::clone(&process));
        let launcher = Launcher::new(Arc::clone(&fs), pids.clone(), Arc::clone(&process));
        let stopper = StopProtocol::new(
            pids,
            liveness.clone(),
            Arc::clone(&process),
            StopPolicy::default(),
        );

        Self {
            layout: settings.layout.clone(),
            installer: settings.installer.clone(),
            registry: ServiceRegistry::from_settings(settings),
            fs,
            process,
            tools,
            liveness,
            launcher,
            stopper,
        }
    }

    pub fn with_stop_policy(mut self, policy: StopPolicy) -> Self {
        let pids = PidStore::new(Arc::clone(&self.fs));
        self.stopper = StopProtocol::new(
            pids,
            self.liveness.clone(),
            Arc::clone(&self.process),
            policy,
        );
        self
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    pub fn is_installed(&self, service: Service) -> bool {
        self.fs.is_file(&self.registry.spec(service).executable)
    }

    pub fn liveness(&self, service: Service) -> Liveness {
        self.liveness.check(self.registry.spec(service))
    }

    pub fn is_running(&self, service: Service) -> bool {
        self.liveness(service).is_running()
    }

    /// Install `service` with the configured installer.
    ///
    /// Already-installed services are left alone unless `update` is set; an
    /// update restarts the service if it is running.
    pub async fn install(
        &self,
        service: Service,
        update: bool,
        clear_cache: bool,
    ) -> Result<InstallOutcome> {
        let spec = self.registry.spec(service);
        if self.is_installed(service) && !update {
            warn!(%service, "service is already installed, pass update to reinstall it");
            return Ok(InstallOutcome::AlreadyInstalled);
        }
        if clear_cache {
            self.clear_cache()?;
        }

        if update {
            info!(%service, source = %spec.install_source, "updating");
        } else {
            info!(%service, source = %spec.install_source, "installing");
        }
        let invocation = ToolInvocation::new(
            self.installer.program.clone(),
            self.installer.args_for(&spec.install_source),
        )
        .with_mode(OutputMode::Captured);
        self.tools.run(invocation).await?;
        info!(%service, "ok");

        if !update {
            return Ok(InstallOutcome::Installed);
        }
        info!(%service, "restarting service");
        self.restart(service).await?;
        Ok(InstallOutcome::Updated)
    }

    /// Clear the cache once, then install every service; stops at the first failure.
    pub async fn install_all(&self, update: bool, clear_cache: bool) -> Result<()> {
        if clear_cache {
            self.clear_cache()?;
        }
        warn!("installing all services...");
        for service in Service::ALL {
            self.install(service, update, false).await?;
        }
        Ok(())
    }

    /// Wipe the whole package cache. Destructive; only on explicit request.
    pub fn clear_cache(&self) -> Result<()> {
        warn!(path = %self.layout.package_cache.display(), "cleaning package cache...");
        self.fs.remove_dir_all(&self.layout.package_cache)?;
        Ok(())
    }

    /// Start `service` unless it is already running.
    pub fn start(&self, service: Service) -> Result<StartOutcome> {
        let spec = self.registry.spec(service);
        if let Liveness::Running(pid) = self.liveness.check(spec) {
            warn!(%service, pid, "service already running");
            return Ok(StartOutcome::AlreadyRunning(pid));
        }
        let pid = self.launcher.launch(spec)?;
        info!(%service, pid, "service started with pid {pid}");
        Ok(StartOutcome::Started(pid))
    }

    pub fn start_all(&self) -> Result<()> {
        for service in Service::ALL {
            self.start(service)?;
        }
        Ok(())
    }

    /// Interrupt a running service and wait for it to exit.
    pub async fn stop(&self, service: Service) -> Result<StopReport> {
        let spec = self.registry.spec(service);
        match self.liveness.check(spec) {
            Liveness::Running(_) => self.stopper.run(spec).await,
            Liveness::Foreign(pid) => Err(TaskvisorError::PermissionDenied(format!(
                "{service} runs as process {pid} owned by another user"
            ))),
            Liveness::NoRecord | Liveness::Stale(_) | Liveness::Unknown(..) => {
                Err(TaskvisorError::NotRunning(service))
            }
        }
    }

    /// Stop every running service.
    ///
    /// Services that are not running are skipped; a failing service does not
    /// prevent the others from being stopped. The first failure is returned.
    pub async fn stop_all(&self) -> Result<()> {
        let mut first_err = None;
        for spec in self.registry.services() {
            if !self.liveness.is_running(spec) {
                warn!(service = %spec.service, "service is not running");
                continue;
            }
            if let Err(err) = self.stopper.run(spec).await {
                error!(service = %spec.service, error = %err, "stop failed");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Stop then start a running service. Not a forced start.
    pub async fn restart(&self, service: Service) -> Result<RestartOutcome> {
        if !self.is_running(service) {
            warn!(%service, "service is not running");
            return Ok(RestartOutcome::NotRunning);
        }
        self.stop(service).await?;
        let started = self.start(service)?;
        Ok(RestartOutcome::Restarted(started.pid()))
    }

    pub async fn restart_all(&self) -> Result<()> {
        warn!("restarting all services");
        for service in Service::ALL {
            self.restart(service).await?;
        }
        info!("ok");
        Ok(())
    }

    /// Online/offline state of every installed service.
    ///
    /// Problems with one service are logged and do not affect the others.
    pub fn status(&self) -> StatusReport {
        let mut rows = Vec::new();
        for spec in self.registry.services() {
            if !self.fs.is_file(&spec.executable) {
                error!(service = %spec.service, "service not installed");
                continue;
            }
            let status = if self.liveness.is_running(spec) {
                ServiceStatus::Online
            } else {
                ServiceStatus::Offline
            };
            rows.push(StatusRow {
                service: spec.service,
                status,
            });
        }
        StatusReport { rows }
    }

    /// Remove services, workspace, system files and cached packages.
    ///
    /// Requires root. Services are stopped first on a best-effort basis.
    pub async fn uninstall_all(&self) -> Result<()> {
        if !self.process.is_elevated() {
            return Err(TaskvisorError::PermissionDenied(
                "this command must be run as root, please use sudo".to_string(),
            ));
        }

        if let Err(err) = self.stop_all().await {
            error!(error = %err, "could not stop all services, continuing uninstall");
        }

        for spec in self.registry.services() {
            warn!(service = %spec.service, "uninstalling service");
            self.remove_binary(spec)?;
        }

        warn!("removing workspace");
        self.fs.remove_dir_all(&self.layout.workspace)?;

        warn!("deleting system folder");
        self.fs.remove_dir_all(&self.layout.system_root)?;

        let purged = self.purge_package_cache()?;
        info!(purged, "package cache cleaned");

        if !self.fs.remove_file(&self.layout.cli_binary())? {
            warn!(path = %self.layout.cli_binary().display(), "cli binary already absent");
        }

        info!("uninstall complete");
        Ok(())
    }

    fn remove_binary(&self, spec: &ServiceSpec) -> Result<()> {
        if !self.fs.remove_file(&spec.executable)? {
            warn!(service = %spec.service, "service binary already absent");
        }
        Ok(())
    }

    /// Delete every cache entry whose name carries the product name.
    fn purge_package_cache(&self) -> Result<usize> {
        let root = &self.layout.package_cache;
        if !self.fs.is_dir(root) {
            warn!(path = %root.display(), "package cache not found");
            return Ok(0);
        }

        let mut removed = 0;
        let mut pending: Vec<(PathBuf, usize)> = vec![(root.clone(), 0)];
        while let Some((dir, depth)) = pending.pop() {
            for entry in self.fs.read_dir(&dir)? {
                if is_product_entry(&entry) {
                    warn!(path = %entry.display(), "deleting");
                    if self.fs.is_dir(&entry) {
                        self.fs.remove_dir_all(&entry)?;
                    } else {
                        self.fs.remove_file(&entry)?;
                    }
                    removed += 1;
                } else if depth + 1 < CACHE_SEARCH_DEPTH && self.fs.is_dir(&entry) {
                    pending.push((entry, depth + 1));
                }
            }
        }
        Ok(removed)
    }
}

fn is_product_entry(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.contains(PRODUCT))
}

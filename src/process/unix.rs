use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use libc::{EPERM, ESRCH, SIGINT, pid_t, setsid};
use tracing::debug;

use super::{LaunchSpec, Probe, ProcessBackend, Signal, SignalError};

/// Process backend built on `kill(2)` and `setsid(2)`.
#[derive(Debug, Clone, Default)]
pub struct UnixProcessBackend;

impl UnixProcessBackend {
    pub fn new() -> Self {
        Self
    }
}

/// PIDs <= 0 address process groups, never a single process.
fn to_pid_t(pid: u32) -> Option<pid_t> {
    pid_t::try_from(pid).ok().filter(|p| *p > 0)
}

fn raw_signal(signal: Signal) -> libc::c_int {
    match signal {
        Signal::Interrupt => SIGINT,
    }
}

/// A zombie still answers `kill(pid, 0)` but will never run again.
#[cfg(target_os = "linux")]
fn is_zombie(pid: pid_t) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // Format: "<pid> (<comm>) <state> ...", comm may itself contain ')'.
    stat.rfind(')')
        .and_then(|idx| stat[idx + 1..].trim_start().chars().next())
        .is_some_and(|state| state == 'Z')
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: pid_t) -> bool {
    false
}

impl ProcessBackend for UnixProcessBackend {
    fn probe(&self, pid: u32) -> Probe {
        let Some(raw) = to_pid_t(pid) else {
            return Probe::Failed(format!("invalid pid {pid}"));
        };

        #[allow(unsafe_code)]
        let rc = unsafe { libc::kill(raw, 0) };
        if rc == 0 {
            if is_zombie(raw) {
                debug!(pid, "process is a zombie");
                return Probe::Gone;
            }
            return Probe::Alive;
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(ESRCH) => Probe::Gone,
            Some(EPERM) => Probe::PermissionDenied,
            _ => Probe::Failed(err.to_string()),
        }
    }

    fn signal(&self, pid: u32, signal: Signal) -> Result<(), SignalError> {
        let raw = to_pid_t(pid).ok_or(SignalError::NoSuchProcess)?;

        #[allow(unsafe_code)]
        let rc = unsafe { libc::kill(raw, raw_signal(signal)) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(ESRCH) => Err(SignalError::NoSuchProcess),
            Some(EPERM) => Err(SignalError::PermissionDenied),
            _ => Err(SignalError::Other(err)),
        }
    }

    fn spawn_detached(&self, spec: &LaunchSpec) -> io::Result<u32> {
        if let Some(parent) = spec.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Truncate on start, then append for the lifetime of the process.
        File::create(&spec.log_path)?;
        let stdout = OpenOptions::new().append(true).open(&spec.log_path)?;
        let stderr = stdout.try_clone()?;

        let mut cmd = Command::new(&spec.program);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        // New session: no controlling terminal, so the service outlives the CLI
        // and does not receive the terminal's Ctrl-C.
        #[allow(unsafe_code)]
        unsafe {
            cmd.pre_exec(|| {
                if setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }

        // `spawn` only returns once exec succeeded, so the PID is real.
        let child = cmd.spawn()?;
        Ok(child.id())
    }

    fn is_elevated(&self) -> bool {
        #[allow(unsafe_code)]
        let euid = unsafe { libc::geteuid() };
        euid == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_process_is_alive() {
        let backend = UnixProcessBackend::new();
        assert_eq!(backend.probe(std::process::id()), Probe::Alive);
    }

    #[test]
    fn pid_zero_is_never_probed() {
        let backend = UnixProcessBackend::new();
        assert!(matches!(backend.probe(0), Probe::Failed(_)));
        assert!(matches!(
            backend.signal(0, Signal::Interrupt),
            Err(SignalError::NoSuchProcess)
        ));
    }

    #[test]
    fn reaped_child_is_gone() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        assert_eq!(UnixProcessBackend::new().probe(pid), Probe::Gone);
    }
}

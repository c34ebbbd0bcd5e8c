use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use taskvisor::process::{LaunchSpec, Probe, ProcessBackend, Signal, SignalError};

const FIRST_PID: u32 = 4000;

#[derive(Debug, Default, Clone, Copy)]
struct FakeProcess {
    /// Owned by another user: probes and signals are refused.
    foreign: bool,
    /// Ignores the interrupt.
    stubborn: bool,
    /// Probes that still see the process after it was interrupted.
    linger: u32,
    /// Remaining probes before the process disappears, once interrupted.
    exiting: Option<u32>,
}

#[derive(Debug, Default)]
struct ProcessTable {
    next_pid: u32,
    processes: HashMap<u32, FakeProcess>,
    signals: Vec<(u32, Signal)>,
    spawns: Vec<LaunchSpec>,
    probes: u32,
    elevated: bool,
    fail_spawn: bool,
}

/// In-memory process table. Clones share the same table, so a test can keep
/// one handle while the supervisor owns another.
#[derive(Debug, Clone)]
pub struct FakeProcessBackend {
    table: Arc<Mutex<ProcessTable>>,
}

impl Default for FakeProcessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProcessBackend {
    pub fn new() -> Self {
        let table = ProcessTable {
            next_pid: FIRST_PID,
            ..ProcessTable::default()
        };
        Self {
            table: Arc::new(Mutex::new(table)),
        }
    }

    /// Register a running process that exits as soon as it is interrupted.
    pub fn add_process(&self, pid: u32) {
        self.table
            .lock()
            .unwrap()
            .processes
            .insert(pid, FakeProcess::default());
    }

    pub fn add_foreign(&self, pid: u32) {
        self.table.lock().unwrap().processes.insert(
            pid,
            FakeProcess {
                foreign: true,
                ..FakeProcess::default()
            },
        );
    }

    /// The process keeps running after an interrupt.
    pub fn make_stubborn(&self, pid: u32) {
        self.update(pid, |p| p.stubborn = true);
    }

    /// After an interrupt, the next `probes` liveness probes still see the
    /// process alive.
    pub fn linger(&self, pid: u32, probes: u32) {
        self.update(pid, |p| p.linger = probes);
    }

    /// Simulate a crash: the process vanishes without being signalled.
    pub fn kill(&self, pid: u32) {
        self.table.lock().unwrap().processes.remove(&pid);
    }

    pub fn set_elevated(&self, elevated: bool) {
        self.table.lock().unwrap().elevated = elevated;
    }

    pub fn fail_spawns(&self, fail: bool) {
        self.table.lock().unwrap().fail_spawn = fail;
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.table.lock().unwrap().processes.contains_key(&pid)
    }

    pub fn signals(&self) -> Vec<(u32, Signal)> {
        self.table.lock().unwrap().signals.clone()
    }

    pub fn spawns(&self) -> Vec<LaunchSpec> {
        self.table.lock().unwrap().spawns.clone()
    }

    pub fn probe_count(&self) -> u32 {
        self.table.lock().unwrap().probes
    }

    fn update(&self, pid: u32, f: impl FnOnce(&mut FakeProcess)) {
        let mut table = self.table.lock().unwrap();
        let process = table.processes.entry(pid).or_default();
        f(process);
    }
}

impl ProcessBackend for FakeProcessBackend {
    fn probe(&self, pid: u32) -> Probe {
        let mut guard = self.table.lock().unwrap();
        let table = &mut *guard;
        table.probes += 1;
        let Some(process) = table.processes.get_mut(&pid) else {
            return Probe::Gone;
        };
        if process.foreign {
            return Probe::PermissionDenied;
        }
        match process.exiting {
            Some(0) => {
                table.processes.remove(&pid);
                Probe::Gone
            }
            Some(remaining) => {
                process.exiting = Some(remaining - 1);
                Probe::Alive
            }
            None => Probe::Alive,
        }
    }

    fn signal(&self, pid: u32, signal: Signal) -> Result<(), SignalError> {
        let mut guard = self.table.lock().unwrap();
        let table = &mut *guard;
        let Some(process) = table.processes.get_mut(&pid) else {
            return Err(SignalError::NoSuchProcess);
        };
        if process.foreign {
            return Err(SignalError::PermissionDenied);
        }
        if !process.stubborn {
            process.exiting = Some(process.linger);
        }
        table.signals.push((pid, signal));
        Ok(())
    }

    fn spawn_detached(&self, spec: &LaunchSpec) -> io::Result<u32> {
        let mut table = self.table.lock().unwrap();
        if table.fail_spawn {
            return Err(io::Error::other("spawn refused by fake backend"));
        }
        let pid = table.next_pid;
        table.next_pid += 1;
        table.processes.insert(pid, FakeProcess::default());
        table.spawns.push(spec.clone());
        Ok(pid)
    }

    fn is_elevated(&self) -> bool {
        self.table.lock().unwrap().elevated
    }
}

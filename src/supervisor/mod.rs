//! Supervision of one worker process per node.
//!
//! The [`ProcessSupervisor`] is the only owner of worker handles. It keeps
//! one slot per node behind its own lock, so a slow kill on one node never
//! holds up spawn or kill on another.
//!
//! ## Kill sequence
//!
//! ```text
//! slot ──take──▶ alive? ──no──▶ NotRunning
//!                  │
//!                 yes
//!                  ▼
//!              SIGTERM ──exit within grace──▶ Graceful
//!                  │
//!              timeout / signal error
//!                  ▼
//!               SIGKILL ─────────────────────▶ Forced
//! ```

mod launcher;

pub use launcher::{ChildProcess, CommandLauncher, Launcher, WorkerProcess};

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::SupervisorError;
use crate::node::{NodeId, NodeRoster};

/// How long a worker gets to exit after the graceful termination signal.
pub const TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between liveness checks while waiting for a worker to exit.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a worker was stopped by [`ProcessSupervisor::kill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The worker exited after the graceful signal.
    Graceful,
    /// The worker had to be killed forcefully.
    Forced,
}

/// Point-in-time view of a node's worker slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum WorkerStatus {
    /// No worker is running.
    #[default]
    Idle,
    /// A live worker exists.
    Running { pid: u32 },
    /// A spawn or kill is in progress for this node.
    Busy,
}

type Slot = Mutex<Option<Box<dyn WorkerProcess>>>;

/// Owns the table of managed worker processes.
///
/// At most one handle exists per node. Liveness is always polled before a
/// stored handle is trusted, so workers that crashed or exited on their own
/// are treated as not running.
pub struct ProcessSupervisor {
    roster: NodeRoster,
    launcher: Box<dyn Launcher>,
    slots: Vec<Slot>,
    grace_period: Duration,
}

impl ProcessSupervisor {
    /// Create a supervisor for every node in `roster`.
    pub fn new(roster: NodeRoster, launcher: impl Launcher + 'static) -> Self {
        Self {
            roster,
            launcher: Box::new(launcher),
            slots: roster.iter().map(|_| Mutex::new(None)).collect(),
            grace_period: TERMINATE_TIMEOUT,
        }
    }

    /// Override the graceful termination timeout.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// The nodes this supervisor manages.
    pub fn roster(&self) -> &NodeRoster {
        &self.roster
    }

    fn slot(&self, node: NodeId) -> Result<&Slot, SupervisorError> {
        if !self.roster.contains(node) {
            return Err(SupervisorError::UnknownNode(node));
        }
        self.slots
            .get(node.slot())
            .ok_or(SupervisorError::UnknownNode(node))
    }

    /// Start the worker for `node`.
    ///
    /// Returns the new process id. If a live worker already exists this is a
    /// no-op reported as [`SupervisorError::AlreadyRunning`]. A launch
    /// failure leaves the slot empty and is not retried.
    pub fn spawn(&self, node: NodeId) -> Result<u32, SupervisorError> {
        let mut slot = self.slot(node)?.lock();

        if let Some(worker) = slot.as_mut() {
            if is_alive(node, worker.as_mut()) {
                return Err(SupervisorError::AlreadyRunning(node));
            }
            debug!(%node, pid = worker.id(), "clearing exited worker");
            *slot = None;
        }

        let worker = self.launcher.launch(node).map_err(|source| {
            warn!(%node, error = %source, "failed to spawn worker");
            SupervisorError::SpawnFailed { node, source }
        })?;

        let pid = worker.id();
        info!(%node, pid, "spawned worker");
        *slot = Some(worker);
        Ok(pid)
    }

    /// Stop the worker for `node`.
    ///
    /// Sends the graceful termination signal, waits up to the grace period
    /// and then kills forcefully. The handle is removed on every path. With
    /// no live worker this is a no-op reported as
    /// [`SupervisorError::NotRunning`] and no signal is sent.
    ///
    /// Blocks for at most the grace period plus the time to reap the
    /// process. Only this node's slot is held meanwhile.
    pub fn kill(&self, node: NodeId) -> Result<Termination, SupervisorError> {
        let mut slot = self.slot(node)?.lock();

        let Some(mut worker) = slot.take() else {
            return Err(SupervisorError::NotRunning(node));
        };
        if !is_alive(node, worker.as_mut()) {
            debug!(%node, pid = worker.id(), "worker already exited");
            return Err(SupervisorError::NotRunning(node));
        }

        Ok(self.stop(node, worker))
    }

    fn stop(&self, node: NodeId, mut worker: Box<dyn WorkerProcess>) -> Termination {
        let pid = worker.id();

        match worker.terminate() {
            Ok(()) => {
                if self.wait_for_exit(worker.as_mut()) {
                    info!(%node, pid, "worker stopped");
                    return Termination::Graceful;
                }
                warn!(
                    %node,
                    pid,
                    grace_ms = self.grace_period.as_millis() as u64,
                    "worker ignored termination, killing"
                );
            }
            Err(e) => {
                warn!(%node, pid, error = %e, "termination signal failed, killing");
            }
        }

        if let Err(e) = worker.kill() {
            error!(%node, pid, error = %e, "forced kill failed");
        } else {
            info!(%node, pid, "worker force killed");
        }
        Termination::Forced
    }

    fn wait_for_exit(&self, worker: &mut dyn WorkerProcess) -> bool {
        let deadline = Instant::now() + self.grace_period;
        loop {
            match worker.has_exited() {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => debug!(pid = worker.id(), error = %e, "liveness check failed"),
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(EXIT_POLL_INTERVAL.min(deadline - now));
        }
    }

    /// Whether a live worker exists for `node`. Waits for an in-flight
    /// operation on the same node.
    pub fn is_running(&self, node: NodeId) -> bool {
        let Ok(slot) = self.slot(node) else {
            return false;
        };
        let mut slot = slot.lock();
        match slot.as_mut() {
            Some(worker) => is_alive(node, worker.as_mut()),
            None => false,
        }
    }

    /// Non-blocking view of a node's slot for display.
    pub fn status(&self, node: NodeId) -> WorkerStatus {
        let Ok(slot) = self.slot(node) else {
            return WorkerStatus::Idle;
        };
        let Some(mut slot) = slot.try_lock() else {
            return WorkerStatus::Busy;
        };

        let running = match slot.as_mut() {
            Some(worker) => is_alive(node, worker.as_mut()).then(|| worker.id()),
            None => None,
        };
        match running {
            Some(pid) => WorkerStatus::Running { pid },
            None => {
                *slot = None;
                WorkerStatus::Idle
            }
        }
    }

    /// Stop every running worker, in parallel. Returns how many were stopped.
    pub fn shutdown(&self) -> usize {
        let running: Vec<NodeId> = self.roster.iter().filter(|&n| self.is_running(n)).collect();
        if running.is_empty() {
            return 0;
        }
        info!(count = running.len(), "stopping workers");

        thread::scope(|scope| {
            let handles: Vec<_> = running
                .into_iter()
                .map(|node| scope.spawn(move || self.kill(node)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join())
                .filter(|result| matches!(result, Ok(Ok(_))))
                .count()
        })
    }
}

impl fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("nodes", &self.roster.len())
            .field("grace_period", &self.grace_period)
            .finish()
    }
}

/// Poll liveness. A failed check counts as alive so that a worker we cannot
/// see is never duplicated or silently dropped.
fn is_alive(node: NodeId, worker: &mut dyn WorkerProcess) -> bool {
    match worker.has_exited() {
        Ok(exited) => !exited,
        Err(e) => {
            warn!(%node, pid = worker.id(), error = %e, "liveness check failed");
            true
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory launcher for exercising the supervisor without real processes.

    use std::io;
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{Launcher, WorkerProcess};
    use crate::node::NodeId;

    /// Shared view of one fake worker.
    #[derive(Debug, Default)]
    pub struct FakeState {
        pub exited: AtomicBool,
        pub terminate_calls: AtomicUsize,
        pub kill_calls: AtomicUsize,
    }

    /// Counts launches and hands out fake workers.
    #[derive(Debug, Default)]
    pub struct FakeLauncher {
        pub launches: AtomicUsize,
        pub fail: AtomicBool,
        /// Workers ignore graceful termination when set.
        pub stubborn: AtomicBool,
        pub workers: parking_lot::Mutex<Vec<(NodeId, Arc<FakeState>)>>,
        next_pid: AtomicU32,
    }

    impl FakeLauncher {
        pub fn launches(&self) -> usize {
            self.launches.load(Ordering::SeqCst)
        }

        pub fn last_worker(&self, node: NodeId) -> Option<Arc<FakeState>> {
            self.workers
                .lock()
                .iter()
                .rev()
                .find(|(n, _)| *n == node)
                .map(|(_, s)| s.clone())
        }
    }

    impl Launcher for Arc<FakeLauncher> {
        fn launch(&self, node: NodeId) -> io::Result<Box<dyn WorkerProcess>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            self.launches.fetch_add(1, Ordering::SeqCst);
            let state = Arc::new(FakeState::default());
            self.workers.lock().push((node, state.clone()));
            Ok(Box::new(FakeWorker {
                pid: 1000 + self.next_pid.fetch_add(1, Ordering::SeqCst),
                stubborn: self.stubborn.load(Ordering::SeqCst),
                state,
            }))
        }
    }

    struct FakeWorker {
        pid: u32,
        stubborn: bool,
        state: Arc<FakeState>,
    }

    impl WorkerProcess for FakeWorker {
        fn id(&self) -> u32 {
            self.pid
        }

        fn has_exited(&mut self) -> io::Result<bool> {
            Ok(self.state.exited.load(Ordering::SeqCst))
        }

        fn terminate(&mut self) -> io::Result<()> {
            self.state.terminate_calls.fetch_add(1, Ordering::SeqCst);
            if !self.stubborn {
                self.state.exited.store(true, Ordering::SeqCst);
            }
            Ok(())
        }

        fn kill(&mut self) -> io::Result<()> {
            self.state.kill_calls.fetch_add(1, Ordering::SeqCst);
            self.state.exited.store(true, Ordering::SeqCst);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeLauncher;
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn node(index: u16) -> NodeId {
        NodeId::new(index).unwrap()
    }

    fn supervisor() -> (Arc<FakeLauncher>, ProcessSupervisor) {
        let launcher = Arc::new(FakeLauncher::default());
        let supervisor = ProcessSupervisor::new(NodeRoster::default(), launcher.clone())
            .with_grace_period(Duration::from_millis(100));
        (launcher, supervisor)
    }

    #[test]
    fn test_spawn_twice_launches_once() {
        let (launcher, supervisor) = supervisor();

        supervisor.spawn(node(7)).unwrap();
        let second = supervisor.spawn(node(7));

        assert!(matches!(second, Err(SupervisorError::AlreadyRunning(n)) if n == node(7)));
        assert_eq!(launcher.launches(), 1);
        assert!(supervisor.is_running(node(7)));
    }

    #[test]
    fn test_spawn_replaces_exited_worker() {
        let (launcher, supervisor) = supervisor();

        supervisor.spawn(node(1)).unwrap();
        launcher
            .last_worker(node(1))
            .unwrap()
            .exited
            .store(true, Ordering::SeqCst);

        assert!(!supervisor.is_running(node(1)));
        supervisor.spawn(node(1)).unwrap();
        assert_eq!(launcher.launches(), 2);
    }

    #[test]
    fn test_spawn_failure_leaves_slot_empty() {
        let (launcher, supervisor) = supervisor();
        launcher.fail.store(true, Ordering::SeqCst);

        let err = supervisor.spawn(node(2)).unwrap_err();
        assert!(matches!(err, SupervisorError::SpawnFailed { .. }));
        assert!(!supervisor.is_running(node(2)));
        assert_eq!(supervisor.status(node(2)), WorkerStatus::Idle);
    }

    #[test]
    fn test_kill_without_worker_is_not_running() {
        let (launcher, supervisor) = supervisor();

        let err = supervisor.kill(node(2)).unwrap_err();
        assert!(matches!(err, SupervisorError::NotRunning(n) if n == node(2)));
        assert!(launcher.workers.lock().is_empty());
    }

    #[test]
    fn test_kill_exited_worker_sends_no_signal() {
        let (launcher, supervisor) = supervisor();
        supervisor.spawn(node(4)).unwrap();
        let state = launcher.last_worker(node(4)).unwrap();
        state.exited.store(true, Ordering::SeqCst);

        assert!(matches!(
            supervisor.kill(node(4)),
            Err(SupervisorError::NotRunning(_))
        ));
        assert_eq!(state.terminate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.kill_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_kill_graceful() {
        let (launcher, supervisor) = supervisor();
        supervisor.spawn(node(5)).unwrap();

        assert_eq!(supervisor.kill(node(5)).unwrap(), Termination::Graceful);

        let state = launcher.last_worker(node(5)).unwrap();
        assert_eq!(state.terminate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.kill_calls.load(Ordering::SeqCst), 0);
        assert!(!supervisor.is_running(node(5)));
        assert!(matches!(
            supervisor.kill(node(5)),
            Err(SupervisorError::NotRunning(_))
        ));
    }

    #[test]
    fn test_kill_escalates_after_grace_period() {
        let (launcher, supervisor) = supervisor();
        launcher.stubborn.store(true, Ordering::SeqCst);
        supervisor.spawn(node(6)).unwrap();

        let started = Instant::now();
        assert_eq!(supervisor.kill(node(6)).unwrap(), Termination::Forced);
        assert!(started.elapsed() >= Duration::from_millis(100));

        let state = launcher.last_worker(node(6)).unwrap();
        assert_eq!(state.terminate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.kill_calls.load(Ordering::SeqCst), 1);
        assert!(state.exited.load(Ordering::SeqCst));
        assert_eq!(supervisor.status(node(6)), WorkerStatus::Idle);
    }

    #[test]
    fn test_unknown_node_is_rejected() {
        let (launcher, supervisor) = supervisor();
        assert!(matches!(
            supervisor.spawn(node(11)),
            Err(SupervisorError::UnknownNode(_))
        ));
        assert_eq!(launcher.launches(), 0);
    }

    #[test]
    fn test_slow_kill_does_not_block_other_nodes() {
        let launcher = Arc::new(FakeLauncher::default());
        launcher.stubborn.store(true, Ordering::SeqCst);
        let supervisor = Arc::new(
            ProcessSupervisor::new(NodeRoster::default(), launcher.clone())
                .with_grace_period(Duration::from_secs(2)),
        );
        supervisor.spawn(node(1)).unwrap();

        let killer = {
            let supervisor = supervisor.clone();
            thread::spawn(move || supervisor.kill(node(1)))
        };

        // Wait until the kill holds node 1's slot.
        let deadline = Instant::now() + Duration::from_secs(1);
        while supervisor.status(node(1)) != WorkerStatus::Busy {
            assert!(Instant::now() < deadline, "kill never started");
            thread::sleep(Duration::from_millis(5));
        }

        let started = Instant::now();
        supervisor.spawn(node(2)).unwrap();
        assert!(matches!(supervisor.status(node(2)), WorkerStatus::Running { .. }));
        assert!(started.elapsed() < Duration::from_secs(1));

        assert_eq!(killer.join().unwrap().unwrap(), Termination::Forced);
    }

    #[test]
    fn test_shutdown_stops_all_running() {
        let (launcher, supervisor) = supervisor();
        supervisor.spawn(node(1)).unwrap();
        supervisor.spawn(node(3)).unwrap();
        supervisor.spawn(node(9)).unwrap();
        launcher
            .last_worker(node(9))
            .unwrap()
            .exited
            .store(true, Ordering::SeqCst);

        assert_eq!(supervisor.shutdown(), 2);
        assert!(supervisor.roster().iter().all(|n| !supervisor.is_running(n)));
        assert_eq!(supervisor.shutdown(), 0);
    }
}

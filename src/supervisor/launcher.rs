//! OS process seam for the supervisor.
//!
//! [`Launcher`] creates worker processes and [`WorkerProcess`] is the small
//! set of operations the supervisor needs on one. The production
//! implementations wrap `std::process`; tests substitute their own.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::node::NodeId;

/// Creates the worker process for a node.
pub trait Launcher: Send + Sync {
    /// Start the worker for `node`.
    fn launch(&self, node: NodeId) -> io::Result<Box<dyn WorkerProcess>>;
}

/// A running (or recently exited) worker process.
pub trait WorkerProcess: Send {
    /// OS process id.
    fn id(&self) -> u32;

    /// Poll whether the process has exited, reaping it if so.
    fn has_exited(&mut self) -> io::Result<bool>;

    /// Ask the process to shut down gracefully.
    fn terminate(&mut self) -> io::Result<()>;

    /// Forcefully kill the process and reap it.
    fn kill(&mut self) -> io::Result<()>;
}

/// Launches a fixed executable with the node's numeric index as its only
/// argument.
///
/// The dashboard owns the terminal, so the worker's stdin, stdout and stderr
/// are all detached.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: PathBuf,
}

impl CommandLauncher {
    /// Create a launcher for the given executable.
    pub fn new<P: AsRef<Path>>(program: P) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
        }
    }

    fn command(&self, node: NodeId) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(node.index().to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl Launcher for CommandLauncher {
    fn launch(&self, node: NodeId) -> io::Result<Box<dyn WorkerProcess>> {
        let child = self.command(node).spawn()?;
        Ok(Box::new(ChildProcess::from(child)))
    }
}

/// [`WorkerProcess`] backed by a [`std::process::Child`].
pub struct ChildProcess {
    child: Child,
}

impl From<Child> for ChildProcess {
    fn from(child: Child) -> Self {
        Self { child }
    }
}

impl WorkerProcess for ChildProcess {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn has_exited(&mut self) -> io::Result<bool> {
        Ok(self.child.try_wait()?.is_some())
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> io::Result<()> {
        let pid = libc::pid_t::try_from(self.child.id())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: kill(2) has no memory-safety preconditions. The pid belongs
        // to a child we have not reaped yet, so it cannot have been recycled.
        let result = unsafe { libc::kill(pid, libc::SIGTERM) };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> io::Result<()> {
        self.child.kill()
    }

    fn kill(&mut self) -> io::Result<()> {
        let killed = self.child.kill();
        // Reap even if kill raced with a natural exit.
        self.child.wait()?;
        killed
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        // An unwinding dashboard must not leave workers behind.
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl fmt::Debug for ChildProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildProcess").field("pid", &self.child.id()).finish()
    }
}

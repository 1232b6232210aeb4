//! Externally created process with exclusively owned handles

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::core::types::{build_command_line, join_arguments, DebugResult, ProcessId};
use crate::windows::bindings::kernel32::{self, CreatedProcess};
use crate::windows::types::Handle;
use crate::windows::utils::strings::expand_environment_strings;

/// Fixed delay between two polling queries
pub const POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Number of tolerated transient query failures before a polling operation
/// gives up with a negative result
pub const QUERY_FAILURE_BUDGET: u32 = 3;

/// A process created and controlled by this program.
///
/// Owns the process and main-thread handles exclusively once started; both
/// are released when the value is dropped, on every code path. The handles
/// are either both absent (not started) or both present.
pub struct ManagedProcess {
    executable: String,
    arguments: Vec<String>,
    process: Option<Handle>,
    thread: Option<Handle>,
    pid: Option<ProcessId>,
}

impl ManagedProcess {
    /// Creates a process description; no OS resources are acquired until one
    /// of the start operations runs.
    pub fn new(executable: impl Into<String>, arguments: Vec<String>) -> Self {
        ManagedProcess {
            executable: executable.into(),
            arguments,
            process: None,
            thread: None,
            pid: None,
        }
    }

    /// Path of the executable this process was described with
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Whether one of the start operations has succeeded
    pub fn is_started(&self) -> bool {
        self.process.is_some()
    }

    /// PID of the started process
    pub fn pid(&self) -> Option<ProcessId> {
        self.pid
    }

    /// Full command line: expanded executable path, quoted when it contains
    /// whitespace, arguments appended space-separated.
    pub fn command_line(&self) -> String {
        let expanded = expand_environment_strings(&self.executable);
        build_command_line(&expanded, &self.arguments)
    }

    pub(crate) fn adopt(&mut self, created: CreatedProcess) {
        debug!(pid = created.pid, "adopted process handles");
        self.process = Some(created.process);
        self.thread = Some(created.thread);
        self.pid = Some(created.pid);
    }

    /// Starts the process in the caller's own session and desktop.
    ///
    /// With `suspended` the main thread is fully initialized but not
    /// scheduled until [`resume`](Self::resume) is called. No partial
    /// handles are retained on failure.
    pub fn start(&mut self, suspended: bool) -> DebugResult<()> {
        let created = kernel32::create_process(&self.command_line(), suspended)?;
        self.adopt(created);
        Ok(())
    }

    /// Relaunches this process image through the OS elevation prompt.
    ///
    /// Only used on the interactive configuration path; no process or
    /// thread handles are owned by this call.
    pub fn start_as_admin(&self) -> DebugResult<()> {
        let expanded = expand_environment_strings(&self.executable);
        crate::windows::bindings::shell32::shell_execute_runas(
            &expanded,
            &join_arguments(&self.arguments),
        )
    }

    /// Suspends the main thread. No-op if the process was never started.
    pub fn suspend(&self) -> DebugResult<()> {
        if let Some(thread) = &self.thread {
            unsafe {
                kernel32::suspend_thread(thread.raw())?;
            }
        }
        Ok(())
    }

    /// Resumes the main thread, undoing exactly one suspension level.
    /// No-op if the process was never started; resuming a thread that is
    /// not suspended does not error.
    pub fn resume(&self) -> DebugResult<()> {
        if let Some(thread) = &self.thread {
            unsafe {
                kernel32::resume_thread(thread.raw())?;
            }
        }
        Ok(())
    }

    /// Polls until the process exits.
    ///
    /// Returns `true` when the process has exited and `false` when the
    /// process was never started or the exit-code query failed more than
    /// the tolerated budget. Completes early as soon as the process exits.
    pub async fn wait_for_exit(&self) -> bool {
        let process = match &self.process {
            Some(process) => process,
            None => return false,
        };

        let mut failures = 0;
        loop {
            match unsafe { kernel32::exit_code(process.raw()) } {
                Ok(Some(_)) => return true,
                Ok(None) => {}
                Err(_) => {
                    failures += 1;
                    if failures > QUERY_FAILURE_BUDGET {
                        return false;
                    }
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Polls until a remote debugger is attached to the process.
    ///
    /// Same polling and failure-budget semantics as
    /// [`wait_for_exit`](Self::wait_for_exit).
    pub async fn wait_for_debugger(&self) -> bool {
        let process = match &self.process {
            Some(process) => process,
            None => return false,
        };

        let mut failures = 0;
        loop {
            match unsafe { kernel32::is_remote_debugger_present(process.raw()) } {
                Ok(true) => return true,
                Ok(false) => {}
                Err(_) => {
                    failures += 1;
                    if failures > QUERY_FAILURE_BUDGET {
                        return false;
                    }
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Terminates the process. Idempotent: a process that has already
    /// exited (or was never started) is left alone and no error is raised;
    /// only a failing kill call reports an error.
    pub fn terminate(&self) -> DebugResult<()> {
        let process = match &self.process {
            Some(process) => process,
            None => return Ok(()),
        };

        unsafe {
            if let Ok(Some(_)) = kernel32::exit_code(process.raw()) {
                return Ok(());
            }
            kernel32::terminate_process(process.raw(), 1)
        }
    }
}

impl fmt::Debug for ManagedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedProcess")
            .field("executable", &self.executable)
            .field("started", &self.is_started())
            .field("pid", &self.pid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_holds_no_resources() {
        let process = ManagedProcess::new("C:\\svc\\slow.exe", vec!["-x".to_string()]);
        assert!(!process.is_started());
        assert!(process.pid().is_none());
    }

    #[test]
    fn test_command_line_quoting() {
        let process = ManagedProcess::new(
            "C:\\Program Files\\svc\\slow.exe",
            vec!["--flag".to_string()],
        );
        assert_eq!(
            process.command_line(),
            "\"C:\\Program Files\\svc\\slow.exe\" --flag"
        );
    }

    #[test]
    fn test_suspend_resume_noop_when_not_started() {
        let process = ManagedProcess::new("C:\\svc\\slow.exe", vec![]);
        assert!(process.suspend().is_ok());
        assert!(process.resume().is_ok());
    }

    #[test]
    fn test_terminate_noop_when_not_started() {
        let process = ManagedProcess::new("C:\\svc\\slow.exe", vec![]);
        assert!(process.terminate().is_ok());
    }

    #[tokio::test]
    async fn test_polls_report_negative_when_not_started() {
        let process = ManagedProcess::new("C:\\svc\\slow.exe", vec![]);
        assert!(!process.wait_for_exit().await);
        assert!(!process.wait_for_debugger().await);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_start_failure_retains_no_handles() {
        let mut process = ManagedProcess::new("Z:\\does\\not\\exist\\missing.exe", vec![]);
        assert!(process.start(true).is_err());
        assert!(!process.is_started());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_suspended_lifecycle_against_real_process() {
        // cmd /c exit terminates on its own once resumed
        let mut process = ManagedProcess::new(
            "%SystemRoot%\\System32\\cmd.exe",
            vec!["/c".to_string(), "exit".to_string()],
        );
        if process.start(true).is_err() {
            return;
        }

        // Suspended creation plus one extra suspend level
        assert!(process.suspend().is_ok());
        assert!(process.resume().is_ok());
        assert!(process.resume().is_ok());

        // Terminate twice: the second call must see the exited process
        assert!(process.terminate().is_ok());
        assert!(process.terminate().is_ok());
    }
}

// Tokio-based worker spawner
//
// Runs the Python automation script as a child process with piped stdio and
// streams its output as WorkerEvents. One reader task per child owns the
// process handle; the daemon only ever sees the event stream and the pid.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use sdw_core::port::{SpawnError, WorkerEvent, WorkerHandle, WorkerSpawner, WorkerSpec};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How to launch one worker process
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    /// Python interpreter, e.g. `python3` or a venv binary
    pub python_bin: String,
    /// Path to the automation script
    pub script_path: String,
}

/// Spawner producing real child processes
pub struct TokioWorkerSpawner {
    command: WorkerCommand,
}

impl TokioWorkerSpawner {
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }
}

/// Handle over one running child's event stream
pub struct TokioWorkerHandle {
    pid: Option<i32>,
    events: mpsc::Receiver<WorkerEvent>,
}

#[async_trait]
impl WorkerHandle for TokioWorkerHandle {
    fn pid(&self) -> Option<i32> {
        self.pid
    }

    async fn next_event(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }
}

#[async_trait]
impl WorkerSpawner for TokioWorkerSpawner {
    async fn spawn(&self, spec: &WorkerSpec) -> Result<Box<dyn WorkerHandle>, SpawnError> {
        info!(
            job_id = %spec.job_id,
            order_number = %spec.order_number,
            script = %self.command.script_path,
            "Spawning automation worker"
        );

        // `-u` keeps Python's stdout unbuffered so progress lines arrive as
        // they are printed, not when the pipe buffer fills.
        let mut child = Command::new(&self.command.python_bin)
            .arg("-u")
            .arg(&self.command.script_path)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpawnError::SpawnFailed(e.to_string()))?;

        let pid = child.id().map(|p| p as i32);
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SpawnError::SpawnFailed("stdout not piped".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SpawnError::SpawnFailed("stderr not piped".to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let job_id = spec.job_id.clone();

        // Single reader task per child: drains both pipes, then waits for
        // the exit status so Exited is always the final event.
        tokio::spawn(async move {
            let mut stdout_lines = BufReader::new(stdout).lines();
            let mut stderr_lines = BufReader::new(stderr).lines();
            let mut stdout_open = true;
            let mut stderr_open = true;

            while stdout_open || stderr_open {
                tokio::select! {
                    line = stdout_lines.next_line(), if stdout_open => match line {
                        Ok(Some(line)) => {
                            if tx.send(WorkerEvent::Stdout(line)).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => stdout_open = false,
                        Err(e) => {
                            warn!(job_id = %job_id, error = %e, "Worker stdout read failed");
                            stdout_open = false;
                        }
                    },
                    line = stderr_lines.next_line(), if stderr_open => match line {
                        Ok(Some(line)) => {
                            if tx.send(WorkerEvent::Stderr(line)).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => stderr_open = false,
                        Err(e) => {
                            warn!(job_id = %job_id, error = %e, "Worker stderr read failed");
                            stderr_open = false;
                        }
                    },
                }
            }

            match child.wait().await {
                Ok(status) => {
                    debug!(job_id = %job_id, status = %status, "Worker process reaped");
                    let _ = tx
                        .send(WorkerEvent::Exited {
                            exit_code: status.code(),
                        })
                        .await;
                }
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "Failed to reap worker process");
                    let _ = tx.send(WorkerEvent::Exited { exit_code: None }).await;
                }
            }
        });

        Ok(Box::new(TokioWorkerHandle { pid, events: rx }))
    }

    async fn kill(&self, pid: i32) -> Result<(), SpawnError> {
        kill_graceful(pid).await
    }

    fn is_alive(&self, pid: i32) -> bool {
        #[cfg(unix)]
        {
            use nix::sys::signal::kill;
            use nix::unistd::Pid;

            // Signal 0 checks existence without delivering anything
            kill(Pid::from_raw(pid), None).is_ok()
        }

        #[cfg(windows)]
        {
            use std::process::Command;

            let output = Command::new("tasklist")
                .args(["/FI", &format!("PID eq {}", pid), "/NH"])
                .output();

            match output {
                Ok(output) => {
                    String::from_utf8_lossy(&output.stdout).contains(&pid.to_string())
                }
                Err(_) => false,
            }
        }
    }
}

/// SIGTERM first, SIGKILL if the process is still around after the grace
/// period.
async fn kill_graceful(pid: i32) -> Result<(), SpawnError> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        info!(pid = %pid, "Sending SIGTERM for graceful shutdown");
        kill(Pid::from_raw(pid), Signal::SIGTERM)
            .map_err(|e| SpawnError::Killed(format!("SIGTERM failed: {e}")))?;

        let deadline = tokio::time::Instant::now() + GRACEFUL_SHUTDOWN_TIMEOUT;
        loop {
            tokio::time::sleep(Duration::from_millis(100)).await;

            if kill(Pid::from_raw(pid), None).is_err() {
                info!(pid = %pid, "Process exited gracefully after SIGTERM");
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                warn!(pid = %pid, "Process did not exit after SIGTERM, sending SIGKILL");
                kill(Pid::from_raw(pid), Signal::SIGKILL)
                    .map_err(|e| SpawnError::Killed(format!("SIGKILL failed: {e}")))?;
                return Ok(());
            }
        }
    }

    #[cfg(windows)]
    {
        use std::process::Command;

        info!(pid = %pid, "Killing process on Windows");
        let output = Command::new("taskkill")
            .args(["/F", "/PID", &pid.to_string()])
            .output()
            .map_err(|e| SpawnError::Killed(e.to_string()))?;

        if !output.status.success() {
            return Err(SpawnError::Killed(format!(
                "taskkill failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh_spawner(script: &str) -> (TokioWorkerSpawner, WorkerSpec) {
        let spawner = TokioWorkerSpawner::new(WorkerCommand {
            python_bin: "/bin/sh".to_string(),
            script_path: "-c".to_string(),
        });
        let spec = WorkerSpec {
            job_id: "job-test".to_string(),
            order_number: "1001".to_string(),
            args: vec![script.to_string()],
        };
        (spawner, spec)
    }

    async fn drain(handle: &mut Box<dyn WorkerHandle>) -> (Vec<String>, Vec<String>, Option<i32>) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut exit = None;
        while let Some(event) = handle.next_event().await {
            match event {
                WorkerEvent::Stdout(l) => out.push(l),
                WorkerEvent::Stderr(l) => err.push(l),
                WorkerEvent::Exited { exit_code } => {
                    exit = exit_code;
                    break;
                }
            }
        }
        (out, err, exit)
    }

    #[tokio::test]
    async fn streams_stdout_lines_then_exit() {
        let (spawner, spec) = sh_spawner("echo one; echo two");
        let mut handle = spawner.spawn(&spec).await.unwrap();
        let (out, _, exit) = drain(&mut handle).await;

        assert_eq!(out, vec!["one", "two"]);
        assert_eq!(exit, Some(0));
    }

    #[tokio::test]
    async fn separates_stderr_from_stdout() {
        let (spawner, spec) = sh_spawner("echo good; echo bad >&2");
        let mut handle = spawner.spawn(&spec).await.unwrap();
        let (out, err, _) = drain(&mut handle).await;

        assert_eq!(out, vec!["good"]);
        assert_eq!(err, vec!["bad"]);
    }

    #[tokio::test]
    async fn reports_nonzero_exit_code() {
        let (spawner, spec) = sh_spawner("exit 3");
        let mut handle = spawner.spawn(&spec).await.unwrap();
        let (_, _, exit) = drain(&mut handle).await;

        assert_eq!(exit, Some(3));
    }

    #[tokio::test]
    async fn spawn_failure_surfaces_as_error() {
        let spawner = TokioWorkerSpawner::new(WorkerCommand {
            python_bin: "/nonexistent/interpreter".to_string(),
            script_path: "worker.py".to_string(),
        });
        let spec = WorkerSpec {
            job_id: "job-test".to_string(),
            order_number: "1001".to_string(),
            args: vec![],
        };

        let result = spawner.spawn(&spec).await;
        assert!(matches!(result, Err(SpawnError::SpawnFailed(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn kill_terminates_sleeping_worker() {
        let (spawner, spec) = sh_spawner("sleep 30");
        let mut handle = spawner.spawn(&spec).await.unwrap();
        let pid = handle.pid().expect("child has a pid");
        assert!(spawner.is_alive(pid));

        spawner.kill(pid).await.unwrap();
        let (_, _, exit) = drain(&mut handle).await;

        // Killed by signal, so no exit code.
        assert_eq!(exit, None);
    }
}

use std::{os::unix::process::CommandExt, process::Stdio, time::Duration};

use nix::{
    errno::Errno,
    sys::signal::{Signal, killpg},
    unistd::Pid,
};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Child,
};

use crate::{
    constants::POST_KILL_GRACE_MS,
    core::{
        domain::{Command, ExecutionResult},
        traits::process::ProcessRunner,
    },
};

/// Runs commands as real child processes, each in its own process group.
///
/// Per call, a reader (drains stdout/stderr to EOF, then reaps the child) races
/// a watchdog (sleeps for the timeout, then SIGKILLs the whole group). The
/// loser is dropped before the result is assembled, so nothing outlives the
/// call and no field is observable before both sides are settled.
#[derive(Clone, Debug)]
pub struct NativeProcessRunner {
    post_kill_grace: Duration,
}

impl NativeProcessRunner {
    pub fn new() -> Self {
        NativeProcessRunner {
            post_kill_grace: Duration::from_millis(POST_KILL_GRACE_MS),
        }
    }
}

impl Default for NativeProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

enum Race {
    Finished(std::io::Result<std::process::ExitStatus>),
    Expired,
}

#[async_trait::async_trait]
impl ProcessRunner for NativeProcessRunner {
    #[tracing::instrument(skip(self, command), fields(command = %command))]
    async fn run(&self, command: &Command, timeout: Duration) -> ExecutionResult {
        let mut child = match spawn(command) {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("Failed to spawn {}: {}", command.program(), e);
                return ExecutionResult::spawn_failure(command, &e);
            }
        };

        // The child was made leader of a fresh group, so its pid is the pgid.
        let group = child.id().map(|id| Pid::from_raw(id as i32));
        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let race = {
            let reader = async {
                let (out, err) = tokio::join!(
                    drain(stdout_pipe.as_mut(), &mut stdout),
                    drain(stderr_pipe.as_mut(), &mut stderr)
                );
                if let Err(e) = out.and(err) {
                    tracing::warn!("Failed to read child output: {}", e);
                }
                child.wait().await
            };
            let watchdog = async {
                tokio::time::sleep(timeout).await;
                if let Some(group) = group {
                    kill_group(group);
                }
            };

            tokio::select! {
                biased;
                status = reader => Race::Finished(status),
                _ = watchdog => Race::Expired,
            }
        };

        let (status, timed_out) = match race {
            Race::Finished(Ok(status)) => {
                tracing::debug!("Process exited: {}", status);
                (status.code(), false)
            }
            Race::Finished(Err(e)) => {
                tracing::warn!("Failed to wait for process: {}", e);
                (None, false)
            }
            Race::Expired => {
                tracing::warn!("Process timed out after {:?}, group killed", timeout);
                self.settle_killed(&mut child, stdout_pipe, stderr_pipe, &mut stdout, &mut stderr)
                    .await;
                (None, true)
            }
        };

        ExecutionResult {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            status,
            timed_out,
        }
    }
}

impl NativeProcessRunner {
    /// Collects whatever the killed group left in its pipes and reaps the
    /// child. Both steps are bounded: a descendant that escaped the group can
    /// hold a pipe open indefinitely.
    async fn settle_killed<O, E>(
        &self,
        child: &mut Child,
        mut stdout_pipe: Option<O>,
        mut stderr_pipe: Option<E>,
        stdout: &mut Vec<u8>,
        stderr: &mut Vec<u8>,
    ) where
        O: AsyncRead + Unpin,
        E: AsyncRead + Unpin,
    {
        let drained = tokio::time::timeout(self.post_kill_grace, async {
            tokio::join!(
                drain(stdout_pipe.as_mut(), stdout),
                drain(stderr_pipe.as_mut(), stderr)
            )
        })
        .await;
        if drained.is_err() {
            tracing::warn!("Output pipes still open after kill, output truncated");
        }

        if tokio::time::timeout(self.post_kill_grace, child.wait())
            .await
            .is_err()
        {
            // kill_on_drop hands the child to tokio's orphan reaper.
            tracing::warn!("Killed process was not reaped within grace period");
        }
    }
}

fn spawn(command: &Command) -> std::io::Result<Child> {
    let mut std_command = std::process::Command::new(command.program());
    std_command
        .args(&command.argv()[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);
    if let Some(dir) = command.workdir() {
        std_command.current_dir(dir);
    }

    let mut command = tokio::process::Command::from(std_command);
    command.kill_on_drop(true);
    command.spawn()
}

/// Reads `pipe` to EOF, appending to `buf` chunk by chunk. Dropping the
/// returned future keeps every byte read so far.
async fn drain<R>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return Ok(());
    };

    let mut chunk = [0u8; 8192];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn kill_group(group: Pid) {
    match killpg(group, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::error!("Failed to kill process group {}: {}", group, e),
    }
}

use std::time::Duration;

use crate::core::domain::{Command, ExecutionResult};

/// Runs one external command under a hard wall-clock timeout.
///
/// Never fails: spawn errors, non-zero exits and timeouts are all reported
/// inside the returned [`ExecutionResult`].
#[mockall::automock]
#[async_trait::async_trait]
pub trait ProcessRunner: std::fmt::Debug + Send + Sync {
    async fn run(&self, command: &Command, timeout: Duration) -> ExecutionResult;
}

use std::path::Path;

use crate::core::domain::{ExecutionResult, RunTestResult};

/// Per-language checks built on top of a [`ProcessRunner`].
///
/// `workdir` is a scratch directory owned exclusively by the caller for the
/// duration of the call. Two checks must never share one concurrently.
///
/// [`ProcessRunner`]: crate::core::traits::process::ProcessRunner
#[mockall::automock]
#[async_trait::async_trait]
pub trait LanguageTester: std::fmt::Debug + Send + Sync {
    /// Syntax-checks `path` once per configuration variant, in declaration
    /// order. A failing variant does not stop the remaining ones.
    async fn check_compile(
        &self,
        path: &Path,
        basedir: &Path,
        workdir: &Path,
    ) -> Vec<(String, ExecutionResult)>;

    /// Builds `path` into `workdir` and, if that succeeded, executes it.
    async fn run_test(&self, path: &Path, basedir: &Path, workdir: &Path) -> RunTestResult;

    /// Applies the canonical formatter in place, or reports whether the file
    /// already matches its canonical formatting exactly.
    async fn format_check(&self, path: &Path, apply_in_place: bool) -> bool;
}

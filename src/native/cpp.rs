use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::fs;
use uuid::Uuid;

use crate::{
    config::{CppToolchain, Limits},
    core::{
        domain::{Command, ExecutionResult, RunTestResult},
        traits::{process::ProcessRunner, tester::LanguageTester},
    },
};

/// C++ checks driven through g++ and clang-format.
#[derive(Clone, Debug)]
pub struct CppTester {
    runner: Arc<dyn ProcessRunner>,
    toolchain: CppToolchain,
    limits: Limits,
}

impl CppTester {
    pub fn new(runner: Arc<dyn ProcessRunner>, toolchain: CppToolchain, limits: Limits) -> Self {
        CppTester {
            runner,
            toolchain,
            limits,
        }
    }

    fn compiler_args(&self, basedir: &Path, standard: &str) -> Vec<String> {
        vec![
            self.toolchain.compiler.clone(),
            "-I".to_string(),
            path_arg(basedir),
            "-Wall".to_string(),
            "-Wno-comment".to_string(),
            format!("-std={}", standard),
        ]
    }

    /// Wraps a build in a login shell. The argv is passed as positional
    /// parameters, so paths need no quoting.
    fn build_command(&self, args: Vec<String>) -> Command {
        if self.toolchain.login_shell {
            Command::new("bash")
                .args(["-l", "-c", "\"$@\"", "bash"])
                .args(args)
        } else {
            let mut args = args.into_iter();
            let program = args.next().unwrap_or_default();
            Command::new(program).args(args)
        }
    }
}

#[async_trait::async_trait]
impl LanguageTester for CppTester {
    #[tracing::instrument(skip(self, basedir, workdir))]
    async fn check_compile(
        &self,
        path: &Path,
        basedir: &Path,
        workdir: &Path,
    ) -> Vec<(String, ExecutionResult)> {
        // Commands run inside workdir, so nothing may stay relative to ours.
        let (path, basedir, workdir) = (absolute(path), absolute(basedir), absolute(workdir));
        let mut results = Vec::with_capacity(self.toolchain.standards.len());

        for standard in &self.toolchain.standards {
            let mut args = self.compiler_args(&basedir, standard);
            args.push("-fsyntax-only".to_string());
            args.push(path_arg(&path));
            let command = self.build_command(args).current_dir(&workdir);

            tracing::debug!("Checking {} with {}", path.display(), standard);
            let result = self.runner.run(&command, self.limits.build_timeout).await;
            tracing::debug!("{}: {:?}", standard, result.state());

            results.push((standard.clone(), result));
        }

        results
    }

    #[tracing::instrument(skip(self, basedir, workdir))]
    async fn run_test(&self, path: &Path, basedir: &Path, workdir: &Path) -> RunTestResult {
        let (path, basedir, workdir) = (absolute(path), absolute(basedir), absolute(workdir));
        let binary = workdir.join(format!("{}.out", Uuid::new_v4()));

        let mut args = self.compiler_args(&basedir, &self.toolchain.test_standard);
        args.extend([path_arg(&path), "-o".to_string(), path_arg(&binary), "-lm".to_string()]);
        let command = self.build_command(args).current_dir(&workdir);

        let compile = self.runner.run(&command, self.limits.build_timeout).await;
        if !compile.is_ok() {
            tracing::info!("Compilation of {} failed: {:?}", path.display(), compile.state());
            remove_artifact(&binary).await;
            return RunTestResult { compile, run: None };
        }

        let command = Command::new(path_arg(&binary)).current_dir(&workdir);
        let run = self.runner.run(&command, self.limits.run_timeout).await;
        tracing::debug!("Run of {}: {:?}", path.display(), run.state());
        remove_artifact(&binary).await;

        RunTestResult {
            compile,
            run: Some(run),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn format_check(&self, path: &Path, apply_in_place: bool) -> bool {
        let formatter = Command::new(self.toolchain.formatter.clone()).arg("-style=file");

        if apply_in_place {
            let command = formatter.arg("-i").arg(path_arg(path));
            let result = self.runner.run(&command, self.limits.format_timeout).await;
            if !result.is_ok() {
                tracing::warn!("Formatter failed on {}: {}", path.display(), result.stderr);
            }
            return result.is_ok();
        }

        let command = formatter.arg(path_arg(path));
        let canonical = self.runner.run(&command, self.limits.format_timeout).await;
        if !canonical.is_ok() {
            tracing::warn!("Formatter failed on {}: {}", path.display(), canonical.stderr);
            return false;
        }

        let current = match fs::read(path).await {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                return false;
            }
        };

        // Captured output is decoded lossily; decode the file the same way.
        match first_difference(&canonical.stdout, &String::from_utf8_lossy(&current)) {
            None => true,
            Some(line) => {
                tracing::warn!(
                    "{} is not formatted (first difference at line {})",
                    path.display(),
                    line
                );
                false
            }
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|e| {
        tracing::warn!("Failed to make {} absolute: {}", path.display(), e);
        path.to_path_buf()
    })
}

async fn remove_artifact(binary: &Path) {
    if let Err(e) = fs::remove_file(binary).await {
        tracing::debug!("Failed to remove {}: {}", binary.display(), e);
    }
}

/// 1-based line of the first difference, or `None` if the texts are equal.
fn first_difference(expected: &str, actual: &str) -> Option<usize> {
    if expected == actual {
        return None;
    }

    let mut expected_lines = expected.split_inclusive('\n');
    let mut actual_lines = actual.split_inclusive('\n');
    let mut line = 1;
    loop {
        match (expected_lines.next(), actual_lines.next()) {
            (Some(a), Some(b)) if a == b => line += 1,
            _ => return Some(line),
        }
    }
}

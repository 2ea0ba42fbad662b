use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

/// An external command: argument vector plus optional working directory.
///
/// Built with the consuming builder methods and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    args: Vec<String>,
    workdir: Option<PathBuf>,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Command {
            args: vec![program.into()],
            workdir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.args[0]
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }

    pub fn workdir(&self) -> Option<&PathBuf> {
        self.workdir.as_ref()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args.join(" "))
    }
}

/// What one external command produced.
///
/// `status` is the exit code of a normally terminated process. It is `None`
/// when the process was killed by a signal, could not be spawned, or timed out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub status: Option<i32>,
    pub timed_out: bool,
}

impl ExecutionResult {
    pub fn spawn_failure(command: &Command, err: &std::io::Error) -> Self {
        ExecutionResult {
            stdout: String::new(),
            stderr: format!("failed to spawn `{}`: {}", command.program(), err),
            status: None,
            timed_out: false,
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.timed_out && self.status == Some(0)
    }

    pub fn state(&self) -> CheckState {
        if self.timed_out {
            CheckState::TimedOut
        } else if self.is_ok() {
            CheckState::Ok
        } else {
            CheckState::Failed
        }
    }
}

/// Lifecycle of a single check. `Failed` and `TimedOut` are both terminal
/// "not ok" states but stay distinguishable in reported data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckState {
    Pending,
    Running,
    Ok,
    Failed,
    TimedOut,
}

impl CheckState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckState::Ok | CheckState::Failed | CheckState::TimedOut)
    }
}

/// One configuration variant (or phase) and its summarized result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub option: String,
    pub ok: bool,
    pub timedout: bool,
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    pub fn new(option: impl Into<String>, result: ExecutionResult) -> Self {
        Outcome {
            option: option.into(),
            ok: result.is_ok(),
            timedout: result.timed_out,
            stdout: result.stdout,
            stderr: result.stderr,
        }
    }

    pub fn state(&self) -> CheckState {
        match (self.ok, self.timedout) {
            (_, true) => CheckState::TimedOut,
            (true, false) => CheckState::Ok,
            (false, false) => CheckState::Failed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    CheckCompile,
    RunTest,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: CheckKind,
    pub results: Vec<Outcome>,
}

impl CheckResult {
    pub fn new(path: impl Into<String>, kind: CheckKind, outcomes: Vec<(String, ExecutionResult)>) -> Self {
        CheckResult {
            path: path.into(),
            kind,
            results: outcomes
                .into_iter()
                .map(|(option, result)| Outcome::new(option, result))
                .collect(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.results.iter().all(|r| r.ok)
    }
}

pub const COMPILE_PHASE: &str = "compile";
pub const RUN_PHASE: &str = "run";

/// Result of a compile-then-execute test. `run` is absent when compilation
/// did not succeed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunTestResult {
    pub compile: ExecutionResult,
    pub run: Option<ExecutionResult>,
}

impl RunTestResult {
    pub fn into_outcomes(self) -> Vec<(String, ExecutionResult)> {
        let mut outcomes = vec![(COMPILE_PHASE.to_string(), self.compile)];
        if let Some(run) = self.run {
            outcomes.push((RUN_PHASE.to_string(), run));
        }
        outcomes
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSet {
    pub lang: String,
    #[serde(default)]
    pub src_paths: Vec<String>,
    #[serde(default)]
    pub test_paths: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub base_path: String,
    #[serde(default)]
    pub source_sets: Vec<SourceSet>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageReport {
    pub lang: String,
    pub src_results: Vec<CheckResult>,
    pub test_results: Vec<CheckResult>,
}

impl LanguageReport {
    pub fn all_results(&self) -> impl Iterator<Item = &CheckResult> {
        self.src_results.iter().chain(self.test_results.iter())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    pub languages: Vec<LanguageReport>,
}

impl Report {
    pub fn failed_count(&self) -> usize {
        self.languages
            .iter()
            .flat_map(LanguageReport::all_results)
            .filter(|r| !r.is_ok())
            .count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    Cpp,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "cpp" => Ok(Language::Cpp),
            other => Err(UnsupportedLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Cpp => write!(f, "cpp"),
        }
    }
}

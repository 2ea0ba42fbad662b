use std::{path::PathBuf, time::Duration};

use crate::constants::{
    DEFAULT_BUILD_TIMEOUT_SECS, DEFAULT_COMPILER, DEFAULT_CPP_STANDARDS, DEFAULT_FORMATTER,
    DEFAULT_FORMAT_TIMEOUT_SECS, DEFAULT_RUN_TIMEOUT_SECS, DEFAULT_TEST_STANDARD,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    pub build_timeout: Duration,
    pub run_timeout: Duration,
    pub format_timeout: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            build_timeout: Duration::from_secs(DEFAULT_BUILD_TIMEOUT_SECS),
            run_timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
            format_timeout: Duration::from_secs(DEFAULT_FORMAT_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CppToolchain {
    pub compiler: String,
    pub formatter: String,
    /// `-std=` values tried by check-compile, in report order.
    pub standards: Vec<String>,
    /// `-std=` value used to build tests.
    pub test_standard: String,
    /// Run build commands through `bash -l` so the login PATH applies.
    pub login_shell: bool,
}

impl Default for CppToolchain {
    fn default() -> Self {
        CppToolchain {
            compiler: DEFAULT_COMPILER.to_string(),
            formatter: DEFAULT_FORMATTER.to_string(),
            standards: DEFAULT_CPP_STANDARDS.iter().map(|s| s.to_string()).collect(),
            test_standard: DEFAULT_TEST_STANDARD.to_string(),
            login_shell: true,
        }
    }
}

/// Everything one invocation needs, resolved once from the command line.
#[derive(Clone, Debug)]
pub struct Settings {
    pub basedir: PathBuf,
    pub limits: Limits,
    pub cpp: CppToolchain,
}

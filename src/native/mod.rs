use std::sync::Arc;

use crate::{
    config::Settings,
    core::{registry::Testers, traits::process::ProcessRunner},
    native::{cpp::CppTester, process::NativeProcessRunner},
};

pub mod cpp;
pub mod process;

/// Testers backed by the real toolchains on this machine.
pub fn native_testers(settings: &Settings) -> Testers {
    let runner: Arc<dyn ProcessRunner> = Arc::new(NativeProcessRunner::new());
    Testers::new(Arc::new(CppTester::new(
        runner,
        settings.cpp.clone(),
        settings.limits.clone(),
    )))
}

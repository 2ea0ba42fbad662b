use std::path::{Path, PathBuf};

use crate::{
    collection::resolve_path,
    core::{
        domain::{CheckKind, CheckResult, CheckState, Collection, LanguageReport, Report, SourceSet},
        registry::Testers,
        traits::tester::LanguageTester,
    },
};

/// Drives check-compile and run-test over every source set of a collection.
///
/// Source sets and paths are processed one at a time: all checks share the
/// same scratch directory, which must not be used by two checks at once.
#[derive(Debug)]
pub struct Autotest {
    testers: Testers,
    basedir: PathBuf,
    scratch_dir: PathBuf,
}

impl Autotest {
    pub fn new(testers: Testers, basedir: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Autotest {
            testers,
            basedir: basedir.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    #[tracing::instrument(skip_all, fields(basedir = %self.basedir.display()))]
    pub async fn run(&self, collection: &Collection) -> Report {
        let mut report = Report::default();

        for source_set in &collection.source_sets {
            tracing::info!("lang: {}", source_set.lang);
            let tester = match self.testers.resolve(&source_set.lang) {
                Ok(tester) => tester,
                Err(e) => {
                    tracing::warn!("{}, skipping source set", e);
                    continue;
                }
            };

            report
                .languages
                .push(self.run_source_set(source_set, tester.as_ref()).await);
        }

        report
    }

    /// Every check of a source set in execution order: compile checks of
    /// the sources, then the tests.
    fn queue<'a>(&self, source_set: &'a SourceSet) -> Vec<QueuedCheck<'a>> {
        let sources = source_set
            .src_paths
            .iter()
            .map(|declared| (CheckKind::CheckCompile, declared));
        let tests = source_set
            .test_paths
            .iter()
            .map(|declared| (CheckKind::RunTest, declared));

        sources
            .chain(tests)
            .map(|(kind, declared)| QueuedCheck {
                kind,
                declared: declared.as_str(),
                path: resolve_path(&self.basedir, declared),
            })
            .collect()
    }

    async fn run_source_set(&self, source_set: &SourceSet, tester: &dyn LanguageTester) -> LanguageReport {
        let queue = self.queue(source_set);
        for check in &queue {
            log_state(check.kind, &check.path, CheckState::Pending);
        }

        let mut src_results = Vec::with_capacity(source_set.src_paths.len());
        let mut test_results = Vec::with_capacity(source_set.test_paths.len());
        for check in queue {
            log_state(check.kind, &check.path, CheckState::Running);

            let outcomes = match check.kind {
                CheckKind::CheckCompile => {
                    tester
                        .check_compile(&check.path, &self.basedir, &self.scratch_dir)
                        .await
                }
                CheckKind::RunTest => tester
                    .run_test(&check.path, &self.basedir, &self.scratch_dir)
                    .await
                    .into_outcomes(),
            };
            let result = CheckResult::new(check.declared, check.kind, outcomes);
            log_result(&check.path, &result);

            match check.kind {
                CheckKind::CheckCompile => src_results.push(result),
                CheckKind::RunTest => test_results.push(result),
            }
        }

        LanguageReport {
            lang: source_set.lang.clone(),
            src_results,
            test_results,
        }
    }
}

struct QueuedCheck<'a> {
    kind: CheckKind,
    declared: &'a str,
    path: PathBuf,
}

fn log_state(kind: CheckKind, path: &Path, state: CheckState) {
    tracing::info!("{:?} {}: {:?}", kind, path.display(), state);
}

fn log_result(path: &Path, result: &CheckResult) {
    for outcome in &result.results {
        match outcome.state() {
            CheckState::Ok => tracing::debug!("{} [{}]: Ok", path.display(), outcome.option),
            state => tracing::warn!("{} [{}]: {:?}", path.display(), outcome.option, state),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockall::Sequence;

    use super::*;
    use crate::core::{
        domain::{ExecutionResult, RunTestResult},
        traits::tester::MockLanguageTester,
    };

    fn exit(status: i32) -> ExecutionResult {
        ExecutionResult {
            status: Some(status),
            ..Default::default()
        }
    }

    fn source_set(lang: &str, src: &[&str], tests: &[&str]) -> SourceSet {
        SourceSet {
            lang: lang.to_string(),
            src_paths: src.iter().map(|s| s.to_string()).collect(),
            test_paths: tests.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn autotest(tester: MockLanguageTester) -> Autotest {
        Autotest::new(Testers::new(Arc::new(tester)), "/proj", "/scratch")
    }

    #[tokio::test]
    async fn test_check_compile_and_run_test_are_reported() {
        let mut tester = MockLanguageTester::new();
        tester
            .expect_check_compile()
            .withf(|path, basedir, workdir| {
                path == Path::new("/proj/a.cpp")
                    && basedir == Path::new("/proj")
                    && workdir == Path::new("/scratch")
            })
            .times(1)
            .returning(|_, _, _| {
                vec![
                    ("c++11".to_string(), exit(0)),
                    ("c++14".to_string(), exit(0)),
                    ("c++17".to_string(), exit(0)),
                    ("c++20".to_string(), exit(0)),
                ]
            });
        tester
            .expect_run_test()
            .withf(|path, _, _| path == Path::new("/proj/t.cpp"))
            .times(1)
            .returning(|_, _, _| RunTestResult {
                compile: exit(0),
                run: Some(exit(0)),
            });

        let collection = Collection {
            base_path: "/ignored".to_string(),
            source_sets: vec![source_set("cpp", &["a.cpp"], &["t.cpp"])],
        };
        let report = autotest(tester).run(&collection).await;

        assert_eq!(report.languages.len(), 1);
        let cpp = &report.languages[0];
        assert_eq!(cpp.lang, "cpp");

        assert_eq!(cpp.src_results.len(), 1);
        assert_eq!(cpp.src_results[0].path, "a.cpp");
        assert_eq!(cpp.src_results[0].kind, CheckKind::CheckCompile);
        let options: Vec<_> = cpp.src_results[0]
            .results
            .iter()
            .map(|o| o.option.as_str())
            .collect();
        assert_eq!(options, vec!["c++11", "c++14", "c++17", "c++20"]);
        assert!(cpp.src_results[0].is_ok());

        assert_eq!(cpp.test_results.len(), 1);
        assert_eq!(cpp.test_results[0].kind, CheckKind::RunTest);
        let phases: Vec<_> = cpp.test_results[0]
            .results
            .iter()
            .map(|o| o.option.as_str())
            .collect();
        assert_eq!(phases, vec!["compile", "run"]);
        assert_eq!(report.failed_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_language_is_skipped() {
        let mut tester = MockLanguageTester::new();
        tester
            .expect_check_compile()
            .times(1)
            .returning(|_, _, _| vec![("c++11".to_string(), exit(0))]);

        let collection = Collection {
            base_path: "/proj".to_string(),
            source_sets: vec![
                source_set("haskell", &["Main.hs"], &["Spec.hs"]),
                source_set("cpp", &["a.cpp"], &[]),
            ],
        };
        let report = autotest(tester).run(&collection).await;

        assert_eq!(report.languages.len(), 1);
        assert_eq!(report.languages[0].lang, "cpp");
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_the_run() {
        let mut tester = MockLanguageTester::new();
        let mut seq = Sequence::new();
        tester
            .expect_check_compile()
            .withf(|path, _, _| path == Path::new("/proj/bad.cpp"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| vec![("c++11".to_string(), exit(1))]);
        tester
            .expect_check_compile()
            .withf(|path, _, _| path == Path::new("/proj/good.cpp"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| vec![("c++11".to_string(), exit(0))]);
        tester
            .expect_run_test()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| RunTestResult {
                compile: ExecutionResult {
                    timed_out: true,
                    ..Default::default()
                },
                run: None,
            });

        let collection = Collection {
            base_path: "/proj".to_string(),
            source_sets: vec![source_set("cpp", &["bad.cpp", "good.cpp"], &["slow.cpp"])],
        };
        let report = autotest(tester).run(&collection).await;

        let cpp = &report.languages[0];
        let paths: Vec<_> = cpp.src_results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["bad.cpp", "good.cpp"]);
        assert!(!cpp.src_results[0].is_ok());
        assert!(cpp.src_results[1].is_ok());

        let compile = &cpp.test_results[0].results;
        assert_eq!(compile.len(), 1);
        assert!(compile[0].timedout);
        assert_eq!(compile[0].state(), CheckState::TimedOut);
        assert_eq!(report.failed_count(), 2);
    }

    #[tokio::test]
    async fn test_declared_paths_with_leading_slash() {
        let mut tester = MockLanguageTester::new();
        tester
            .expect_check_compile()
            .withf(|path, _, _| path == Path::new("/proj/src/cpp/a.cpp"))
            .times(1)
            .returning(|_, _, _| vec![]);

        let collection = Collection {
            base_path: "/proj".to_string(),
            source_sets: vec![source_set("cpp", &["/src/cpp/a.cpp"], &[])],
        };
        let report = autotest(tester).run(&collection).await;

        assert_eq!(report.languages[0].src_results[0].path, "/src/cpp/a.cpp");
    }

    #[test]
    fn test_checks_are_queued_sources_first() {
        let autotest = autotest(MockLanguageTester::new());
        let set = source_set("cpp", &["a.cpp", "/b.cpp"], &["t.cpp"]);

        let queued: Vec<_> = autotest
            .queue(&set)
            .into_iter()
            .map(|c| (c.kind, c.declared, c.path))
            .collect();

        assert_eq!(
            queued,
            vec![
                (CheckKind::CheckCompile, "a.cpp", PathBuf::from("/proj/a.cpp")),
                (CheckKind::CheckCompile, "/b.cpp", PathBuf::from("/proj/b.cpp")),
                (CheckKind::RunTest, "t.cpp", PathBuf::from("/proj/t.cpp")),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let collection = Collection {
            base_path: "/proj".to_string(),
            source_sets: vec![],
        };

        let report = autotest(MockLanguageTester::new()).run(&collection).await;

        assert!(report.languages.is_empty());
    }
}

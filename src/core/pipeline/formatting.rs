use std::path::{Path, PathBuf};

use crate::{
    collection::resolve_path,
    core::{domain::Collection, registry::Testers},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatSummary {
    pub checked: usize,
    pub unformatted: Vec<PathBuf>,
}

impl FormatSummary {
    pub fn success(&self) -> bool {
        self.unformatted.is_empty()
    }
}

/// Runs the canonical formatter over every source and test path of the
/// supported source sets. Every file is visited even after a mismatch.
#[tracing::instrument(skip(testers, collection))]
pub async fn check_formatting(
    testers: &Testers,
    collection: &Collection,
    basedir: &Path,
    apply_in_place: bool,
) -> FormatSummary {
    let mut summary = FormatSummary::default();

    for source_set in &collection.source_sets {
        let tester = match testers.resolve(&source_set.lang) {
            Ok(tester) => tester,
            Err(e) => {
                tracing::warn!("{}, skipping source set", e);
                continue;
            }
        };

        for declared in source_set.src_paths.iter().chain(&source_set.test_paths) {
            let path = resolve_path(basedir, declared);
            summary.checked += 1;
            if !tester.format_check(&path, apply_in_place).await {
                tracing::warn!("format check failed: {}", path.display());
                summary.unformatted.push(path);
            }
        }
    }

    summary
}

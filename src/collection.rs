use std::path::{Path, PathBuf};

use tokio::fs;

use crate::core::{
    domain::{Collection, Report},
    errors::AppError,
};

pub async fn load_collection(path: &Path) -> Result<Collection, AppError> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| AppError::json(path, e))
}

pub async fn load_report(path: &Path) -> Result<Report, AppError> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| AppError::json(path, e))
}

pub async fn write_report(path: &Path, report: &Report) -> Result<(), AppError> {
    let json = serde_json::to_string(report).map_err(|e| AppError::json(path, e))?;
    fs::write(path, json).await.map_err(|e| AppError::io(path, e))
}

/// Joins a declared path onto `basedir`. Declared paths may start with `/`
/// and are still relative to the base directory.
pub fn resolve_path(basedir: &Path, declared: &str) -> PathBuf {
    basedir.join(declared.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::SourceSet;

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/proj");
        assert_eq!(resolve_path(base, "a.cpp"), PathBuf::from("/proj/a.cpp"));
        assert_eq!(
            resolve_path(base, "/src/cpp/a.cpp"),
            PathBuf::from("/proj/src/cpp/a.cpp")
        );
        assert_eq!(
            resolve_path(Path::new("rel"), "test/t.cpp"),
            PathBuf::from("rel/test/t.cpp")
        );
    }

    #[tokio::test]
    async fn test_load_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.json");
        std::fs::write(
            &path,
            r#"{
                "base_path": "/proj",
                "source_sets": [
                    {"lang": "cpp", "src_paths": ["a.cpp"], "test_paths": ["t.cpp"]},
                    {"lang": "python", "src_paths": ["b.py"]}
                ]
            }"#,
        )
        .unwrap();

        let collection = load_collection(&path).await.unwrap();

        assert_eq!(collection.base_path, "/proj");
        assert_eq!(
            collection.source_sets,
            vec![
                SourceSet {
                    lang: "cpp".to_string(),
                    src_paths: vec!["a.cpp".to_string()],
                    test_paths: vec!["t.cpp".to_string()],
                },
                SourceSet {
                    lang: "python".to_string(),
                    src_paths: vec!["b.py".to_string()],
                    test_paths: vec![],
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_load_collection_missing_file() {
        let result = load_collection(Path::new("/nonexistent/collection.json")).await;
        assert!(matches!(result, Err(AppError::Io { .. })));
    }

    #[tokio::test]
    async fn test_load_collection_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.json");
        std::fs::write(&path, "{\"source_sets\": []}").unwrap();

        let result = load_collection(&path).await;
        assert!(matches!(result, Err(AppError::Json { .. })));
    }

    #[tokio::test]
    async fn test_report_written_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");

        write_report(&path, &Report::default()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        assert_eq!(load_report(&path).await.unwrap(), Report::default());
    }
}

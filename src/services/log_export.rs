use crate::config::PersistenceError;
use camino::Utf8Path;

/// File name suggested by the save dialog
pub const DEFAULT_LOG_FILE_NAME: &str = "serial_log.txt";

/// Write the rendered log to `path` as UTF-8, replacing any existing file
pub async fn export_log(path: &Utf8Path, contents: &str) -> Result<(), PersistenceError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| PersistenceError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!("Exported {} bytes of log to {}", contents.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export_writes_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().join(DEFAULT_LOG_FILE_NAME)).unwrap();

        export_log(&path, ">> nhiệt độ: 25\n<< AT").await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, ">> nhiệt độ: 25\n<< AT");
    }

    #[tokio::test]
    async fn test_export_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path =
            Utf8PathBuf::try_from(temp_dir.path().join("missing").join("log.txt")).unwrap();

        let err = export_log(&path, "x").await.unwrap_err();
        assert!(matches!(err, PersistenceError::Write { .. }));
    }
}

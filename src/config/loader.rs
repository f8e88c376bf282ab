//! 設定ファイルの読み込み関数

use std::path::Path;

use super::{
    ConfigError,
    L10nSettings,
};

/// 設定ファイル名
pub(super) const CONFIG_FILE_NAME: &str = ".l10n.json";

/// ワークスペース直下の `.l10n.json` を読み込む
///
/// # Returns
/// - `Ok(Some(settings))`: 設定ファイルが見つかり、読み込みに成功
/// - `Ok(None)`: 設定ファイルが見つからない
/// - `Err(ConfigError)`: ファイル読み込みまたはパースエラー
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<L10nSettings>, ConfigError> {
    let config_path = workspace_root.join(CONFIG_FILE_NAME);

    if !config_path.is_file() {
        tracing::debug!(path = %config_path.display(), "Configuration file not found");
        return Ok(None);
    }

    load_from_file(&config_path).map(Some)
}

/// 指定されたファイルから設定を読み込む
pub(super) fn load_from_file(config_path: &Path) -> Result<L10nSettings, ConfigError> {
    tracing::debug!(path = %config_path.display(), "Loading configuration");

    let content = std::fs::read_to_string(config_path)?;
    let settings: L10nSettings = serde_json::from_str(&content)?;

    Ok(settings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    /// `load_from_workspace`: 設定ファイルが存在する場合
    #[rstest]
    fn test_load_from_workspace_with_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"{"keySeparator": ".", "defaultLanguage": "fr"}"#;
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), config_content).unwrap();

        let settings = load_from_workspace(temp_dir.path()).unwrap().unwrap();

        assert_eq!(settings.key_separator, ".");
        assert_eq!(settings.default_language, "fr");
    }

    /// `load_from_workspace`: 設定ファイルが存在しない場合
    #[rstest]
    fn test_load_from_workspace_no_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_workspace(temp_dir.path());

        assert!(result.unwrap().is_none());
    }

    /// `load_from_workspace`: 同名のディレクトリは設定ファイルとして扱わない
    #[rstest]
    fn test_load_from_workspace_ignores_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(CONFIG_FILE_NAME)).unwrap();

        let result = load_from_workspace(temp_dir.path());

        assert!(result.unwrap().is_none());
    }

    /// `load_from_file`: JSON パースエラー
    #[rstest]
    fn test_load_from_file_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "invalid json").unwrap();

        let result = load_from_file(&path);

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    /// `load_from_file`: ファイルが無い場合は IO エラー
    #[rstest]
    fn test_load_from_file_missing() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_file(&temp_dir.path().join("missing.json"));

        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}

//! 設定管理を行うモジュール

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    L10nSettings,
    loader,
};

/// 設定管理を行う
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// 現在の設定
    current_settings: L10nSettings,

    /// 翻訳ファイルを探すルートディレクトリ
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    /// デフォルト設定のマネージャーを作成
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: L10nSettings::default(), workspace_root: None }
    }

    /// ワークスペースの `.l10n.json` から設定を読み込む
    ///
    /// ファイルが無ければデフォルト設定を使う。
    /// バリデーションに失敗した場合、現在の設定は変更しない。
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!(?workspace_root, "Loading settings");

        let settings = match &workspace_root {
            Some(root) => loader::load_from_workspace(root)?.unwrap_or_default(),
            None => L10nSettings::default(),
        };

        self.apply(settings)?;
        self.workspace_root = workspace_root;

        Ok(())
    }

    /// 明示的に指定された設定ファイルを読み込む
    pub fn load_settings_file(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        let settings = loader::load_from_file(config_path)?;
        self.apply(settings)?;
        self.workspace_root = config_path.parent().map(Path::to_path_buf);

        Ok(())
    }

    /// 設定を差し替える
    pub fn update_settings(&mut self, new_settings: L10nSettings) -> Result<(), ConfigError> {
        tracing::debug!("Updating settings");
        self.apply(new_settings)
    }

    fn apply(&mut self, settings: L10nSettings) -> Result<(), ConfigError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;

        tracing::debug!(settings = ?settings, "Settings applied");
        self.current_settings = settings;

        Ok(())
    }

    /// 現在の設定を取得
    #[must_use]
    pub const fn get_settings(&self) -> &L10nSettings {
        &self.current_settings
    }

    /// ワークスペースルートを取得
    #[must_use]
    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }
}

//! 設定ファイルの読み込み・バリデーション・管理
mod loader;
mod manager;
mod types;

pub use manager::ConfigManager;
pub use types::{
    ConfigError,
    L10nSettings,
    TranslationFilesConfig,
    ValidationError,
};

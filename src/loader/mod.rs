//! 翻訳ファイルの探索と読み込み
//!
//! ディレクトリを走査して翻訳 JSON を見つけ、パスからロケールを推定して
//! [`TranslationManifest`] に変換する。

mod error;

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};
use ignore::WalkBuilder;
use serde_json::Value;

pub use error::LoaderError;

use crate::config::L10nSettings;
use crate::extension::TranslationManifest;
use crate::input::translation::detect_locale_from_path;

/// `root` 以下の翻訳ファイルを読み込む
///
/// ロケールを推定できないファイルや JSON として壊れているファイルは
/// 警告を出してスキップする。結果はパス順。
///
/// ロケールは `_` を `-` に揃えた表記（`en_US` → `en-US`）で登録される。
/// レジストリはロケールを完全一致で引くため、`defaultLanguage` も同じ表記で指定する。
pub fn load_translation_dir(
    root: &Path,
    settings: &L10nSettings,
) -> Result<Vec<TranslationManifest>, LoaderError> {
    if !root.is_dir() {
        return Err(LoaderError::InvalidPath(root.display().to_string()));
    }

    let files = find_translation_files(
        root,
        &settings.translation_files.file_pattern,
        &settings.exclude_patterns,
    )?;
    tracing::debug!(root = %root.display(), count = files.len(), "Found translation files");

    Ok(files.iter().filter_map(|file| load_translation_file(root, file)).collect())
}

/// 単一の翻訳ファイルを読み込む
fn load_translation_file(root: &Path, file_path: &Path) -> Option<TranslationManifest> {
    let relative_path = file_path.strip_prefix(root).unwrap_or(file_path);

    let Some(locale) = detect_locale_from_path(relative_path) else {
        tracing::warn!(path = %file_path.display(), "Could not detect locale, skipping");
        return None;
    };

    let content = match std::fs::read_to_string(file_path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(path = %file_path.display(), %err, "Failed to read translation file");
            return None;
        }
    };

    let translations: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(path = %file_path.display(), %err, "Failed to parse translation file");
            return None;
        }
    };

    let alias = relative_path.to_string_lossy().replace('\\', "/");
    tracing::debug!(alias = %alias, locale = %locale, "Loaded translation file");

    Some(TranslationManifest::new(alias, locale, translations))
}

fn build_glob_set<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, LoaderError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = Glob::new(pattern)
            .map_err(|source| LoaderError::Pattern { pattern: pattern.to_string(), source })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| LoaderError::Pattern { pattern: String::new(), source })
}

/// 翻訳ファイルを検索
fn find_translation_files(
    root: &Path,
    file_pattern: &str,
    exclude_patterns: &[String],
) -> Result<Vec<PathBuf>, LoaderError> {
    let include_set = build_glob_set(&[file_pattern])?;
    let exclude_set = build_glob_set(exclude_patterns)?;

    let mut found_files = Vec::new();

    // ignore クレートでファイルを走査
    for result in WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .follow_links(false)
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(relative_path) = path.strip_prefix(root) else {
            continue;
        };
        if !include_set.is_match(relative_path) || exclude_set.is_match(relative_path) {
            continue;
        }

        found_files.push(path.to_path_buf());
    }

    found_files.sort();
    Ok(found_files)
}

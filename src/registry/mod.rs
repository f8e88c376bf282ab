//! 翻訳レジストリ
//!
//! ロケールごとに翻訳バンドルを登録順で保持し、フラット化してマージした
//! 結果を [`Observable`] として公開する。

mod error;

use std::collections::{
    HashMap,
    HashSet,
};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{
    AtomicU64,
    Ordering,
};

use parking_lot::{
    Mutex,
    ReentrantMutex,
};
use serde_json::Value;

pub use error::RegistryError;

use crate::config::L10nSettings;
use crate::extension::{
    ManifestSource,
    TranslationManifest,
};
use crate::input::translation::{
    DEFAULT_KEY_SEPARATOR,
    TranslationBundle,
    TranslationMap,
};
use crate::observable::{
    Observable,
    Subscription,
};

/// 登録済みバンドルの識別子（登録順に単調増加）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleId(u64);

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bundle#{}", self.0)
    }
}

/// フラット化済みのバンドル
#[derive(Debug)]
struct RegisteredBundle {
    id: BundleId,
    translations: TranslationMap,
}

/// 1 ロケール分の状態
#[derive(Debug)]
struct LocaleEntry {
    /// 登録順のバンドル
    bundles: Vec<RegisteredBundle>,
    /// マージ結果の公開先
    merged: Observable<TranslationMap>,
}

impl LocaleEntry {
    fn new() -> Self {
        Self { bundles: Vec::new(), merged: Observable::new(TranslationMap::new()) }
    }

    /// バンドル・購読者・ビューのいずれも無い
    fn is_idle(&self) -> bool {
        self.bundles.is_empty()
            && self.merged.subscriber_count() == 0
            && self.merged.handle_count() == 1
    }

    /// 登録順に畳み込み、同じキーは後勝ちにする
    fn merge(&self) -> TranslationMap {
        let mut merged = TranslationMap::new();
        for bundle in &self.bundles {
            for (key, value) in &bundle.translations {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }
}

/// レジストリの可変状態
#[derive(Debug, Default)]
struct RegistryState {
    locales: HashMap<String, LocaleEntry>,
    /// バンドル → 所属ロケール
    owners: HashMap<BundleId, String>,
}

struct RegistryInner {
    key_separator: String,
    state: Mutex<RegistryState>,
    /// 登録・削除を直列化する（同一スレッドからの再入は許可）
    writer: ReentrantMutex<()>,
    next_id: AtomicU64,
}

/// 翻訳レジストリ
///
/// アプリケーションごとに 1 つ生成し、利用側へ明示的に渡す。
/// `clone` は同じレジストリへのハンドルを返す。
#[derive(Clone)]
pub struct TranslationRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for TranslationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TranslationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationRegistry")
            .field("key_separator", &self.inner.key_separator)
            .field("locales", &self.locales())
            .finish_non_exhaustive()
    }
}

impl TranslationRegistry {
    /// `_` 区切りのレジストリを作成
    #[must_use]
    pub fn new() -> Self {
        Self::build(DEFAULT_KEY_SEPARATOR.to_string())
    }

    /// 任意の区切り文字でレジストリを作成
    ///
    /// # Errors
    /// `key_separator` が空の場合
    pub fn with_separator(key_separator: impl Into<String>) -> Result<Self, RegistryError> {
        let key_separator = key_separator.into();
        if key_separator.is_empty() {
            return Err(RegistryError::EmptySeparator);
        }
        Ok(Self::build(key_separator))
    }

    /// 設定からレジストリを作成
    ///
    /// # Errors
    /// `keySeparator` が空の場合
    pub fn from_settings(settings: &L10nSettings) -> Result<Self, RegistryError> {
        Self::with_separator(settings.key_separator.clone())
    }

    fn build(key_separator: String) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                key_separator,
                state: Mutex::new(RegistryState::default()),
                writer: ReentrantMutex::new(()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// フラット化に使う区切り文字
    #[must_use]
    pub fn key_separator(&self) -> &str {
        &self.inner.key_separator
    }

    /// ロケールにバンドルを追加する
    ///
    /// 既存バンドルは置き換えず、同じキーは後から登録したものが勝つ。
    /// マージ結果は戻る前に全購読者へ通知される。
    ///
    /// # Errors
    /// `locale` が空（または空白のみ）の場合
    pub fn register(
        &self,
        locale: impl Into<String>,
        payload: Value,
    ) -> Result<BundleId, RegistryError> {
        self.register_bundle(TranslationBundle::new(locale, payload))
    }

    /// [`TranslationBundle`] を登録する
    ///
    /// # Errors
    /// バンドルのロケールが空（または空白のみ）の場合
    pub fn register_bundle(&self, bundle: TranslationBundle) -> Result<BundleId, RegistryError> {
        if bundle.locale().trim().is_empty() {
            tracing::warn!("Rejected translation bundle without locale");
            return Err(RegistryError::EmptyLocale);
        }

        let _writing = self.inner.writer.lock();

        let id = BundleId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let translations = bundle.flatten(&self.inner.key_separator);
        let key_count = translations.len();
        let locale = bundle.locale().to_string();

        let (merged, subject) = {
            let mut state = self.inner.state.lock();
            let entry = state.locales.entry(locale.clone()).or_insert_with(LocaleEntry::new);
            entry.bundles.push(RegisteredBundle { id, translations });
            let merged = entry.merge();
            let subject = entry.merged.clone();
            state.owners.insert(id, locale.clone());
            (merged, subject)
        };

        tracing::debug!(
            %id,
            locale = %locale,
            key_count,
            merged_count = merged.len(),
            "Registered translation bundle"
        );
        subject.set(merged);

        Ok(id)
    }

    /// バンドルを取り除き、ロケールのマージ結果を再計算する
    ///
    /// 未知の `id` の場合は `false` を返す。
    pub fn unregister(&self, id: BundleId) -> bool {
        let _writing = self.inner.writer.lock();

        let removed = {
            let mut state = self.inner.state.lock();
            let Some(locale) = state.owners.remove(&id) else {
                return false;
            };
            state.locales.get_mut(&locale).map(|entry| {
                entry.bundles.retain(|bundle| bundle.id != id);
                (locale, entry.merge(), entry.merged.clone())
            })
        };

        let Some((locale, merged, subject)) = removed else {
            return false;
        };
        tracing::debug!(
            %id,
            locale = %locale,
            merged_count = merged.len(),
            "Unregistered translation bundle"
        );
        subject.set(merged);

        true
    }

    /// ロケールのマージ結果を購読可能なビューとして返す
    ///
    /// 未登録のロケールでも空のマップとして扱う。バンドルも購読者もビューも
    /// 残っていないロケールの状態はここで破棄する。
    #[must_use]
    pub fn translations(&self, locale: &str) -> Translations {
        let mut state = self.inner.state.lock();
        state.locales.retain(|_, entry| !entry.is_idle());
        let entry = state.locales.entry(locale.to_string()).or_insert_with(LocaleEntry::new);
        Translations { locale: locale.to_string(), merged: entry.merged.clone() }
    }

    /// バンドルが 1 つ以上登録されているロケール（ソート済み）
    #[must_use]
    pub fn locales(&self) -> Vec<String> {
        let state = self.inner.state.lock();
        let mut locales: Vec<String> = state
            .locales
            .iter()
            .filter(|(_, entry)| !entry.bundles.is_empty())
            .map(|(locale, _)| locale.clone())
            .collect();
        locales.sort();
        locales
    }

    /// 拡張機能から届く翻訳マニフェストを取り込む
    ///
    /// 新しく現れたエイリアスは 1 度だけ登録し、消えたエイリアスは登録を解除する。
    /// 返り値の [`Subscription`] を破棄すると監視を止める（登録済みのバンドルは残る）。
    ///
    /// 登録中の通知から同じソースへマニフェストを追加してもよい。
    /// そのため `attached` のロックは登録・解除の呼び出しをまたいで保持しない。
    pub fn attach(&self, source: &dyn ManifestSource) -> Subscription {
        let registry = self.clone();
        // エイリアス → バンドル（`None` は登録中）
        let attached: Mutex<HashMap<String, Option<BundleId>>> = Mutex::new(HashMap::new());

        source.observe_translations(Box::new(move |manifests: &[TranslationManifest]| {
            let (removed, added) = {
                let mut attached = attached.lock();
                let present: HashSet<&str> =
                    manifests.iter().map(|manifest| manifest.alias.as_str()).collect();

                let mut removed = Vec::new();
                attached.retain(|alias, id| {
                    if present.contains(alias.as_str()) {
                        return true;
                    }
                    tracing::debug!(alias = %alias, "Translation manifest removed");
                    removed.extend(*id);
                    false
                });

                let mut added = Vec::new();
                for manifest in manifests {
                    if !attached.contains_key(&manifest.alias) {
                        attached.insert(manifest.alias.clone(), None);
                        added.push(manifest);
                    }
                }
                (removed, added)
            };

            for id in removed {
                registry.unregister(id);
            }

            for manifest in added {
                match registry.register_bundle(manifest.to_bundle()) {
                    Ok(id) => {
                        let recorded = match attached.lock().get_mut(&manifest.alias) {
                            Some(slot) if slot.is_none() => {
                                *slot = Some(id);
                                true
                            }
                            _ => false,
                        };
                        // 登録中に取り除かれた
                        if !recorded {
                            registry.unregister(id);
                        }
                    }
                    Err(err) => {
                        attached.lock().remove(&manifest.alias);
                        tracing::warn!(alias = %manifest.alias, %err, "Skipping translation manifest");
                    }
                }
            }
        }))
    }
}

/// 1 ロケール分のマージ済み翻訳のライブビュー
#[derive(Debug, Clone)]
pub struct Translations {
    locale: String,
    merged: Observable<TranslationMap>,
}

impl Translations {
    /// このビューのロケール
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// 現在のスナップショット
    #[must_use]
    pub fn get(&self) -> Arc<TranslationMap> {
        self.merged.get()
    }

    /// 現在の値を即座に受け取り、以降は更新のたびに受け取る
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&TranslationMap) + Send + Sync + 'static,
    {
        self.merged.subscribe(callback)
    }

    /// 購読中のリスナー数
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.merged.subscriber_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::extension::ManifestList;

    fn english() -> Value {
        json!({
            "general": {
                "close": "Close",
                "logout": "Log out"
            }
        })
    }

    #[googletest::test]
    fn register_and_get_translation() {
        let registry = TranslationRegistry::new();
        registry.register("en", english()).unwrap();

        let translations = registry.translations("en").get();

        expect_that!(translations.get("general_close"), some(eq(&"Close".to_string())));
        expect_that!(translations.get("general_logout"), some(eq(&"Log out".to_string())));
    }

    #[googletest::test]
    fn unknown_locale_yields_empty_map() {
        let registry = TranslationRegistry::new();

        let merged = registry.translations("xx").get();
        expect_that!(merged.is_empty(), eq(true));
        expect_that!(registry.locales().is_empty(), eq(true));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn empty_locale_is_rejected(#[case] locale: &str) {
        let registry = TranslationRegistry::new();

        let result = registry.register(locale, english());

        assert_eq!(result, Err(RegistryError::EmptyLocale));
        assert!(registry.locales().is_empty());
    }

    #[googletest::test]
    fn later_bundle_wins() {
        let first = json!({ "general": { "close": "Close" } });
        let second = json!({ "general": { "close": "Close 2" } });

        let forward = TranslationRegistry::new();
        forward.register("en", first.clone()).unwrap();
        forward.register("en", second.clone()).unwrap();

        let backward = TranslationRegistry::new();
        backward.register("en", second).unwrap();
        backward.register("en", first).unwrap();

        let forward = forward.translations("en").get();
        let backward = backward.translations("en").get();
        expect_that!(forward.get("general_close"), some(eq(&"Close 2".to_string())));
        expect_that!(backward.get("general_close"), some(eq(&"Close".to_string())));
    }

    #[googletest::test]
    fn merged_map_is_union_in_first_seen_order() {
        let registry = TranslationRegistry::new();
        registry.register("en", json!({ "a": "A", "b": "B" })).unwrap();
        registry.register("en", json!({ "c": "C", "a": "A2" })).unwrap();

        let merged = registry.translations("en").get();
        let entries: Vec<(&str, &str)> =
            merged.iter().map(|(key, value)| (key.as_str(), value.as_str())).collect();

        assert_eq!(entries, vec![("a", "A2"), ("b", "B"), ("c", "C")]);
    }

    #[googletest::test]
    fn locales_are_isolated() {
        let registry = TranslationRegistry::new();
        registry.register("fr", json!({ "general": { "close": "Fermer" } })).unwrap();
        let french = registry.translations("fr");
        let before = french.get();

        registry.register("en", english()).unwrap();

        let after = french.get();
        expect_that!(Arc::ptr_eq(&before, &after), eq(true));
        expect_that!(after.get("general_logout"), none());
        assert_eq!(registry.locales(), vec!["en".to_string(), "fr".to_string()]);
    }

    #[googletest::test]
    fn subscribers_receive_snapshot_then_updates() {
        let registry = TranslationRegistry::new();
        registry.register("en", english()).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = registry.translations("en").subscribe(move |map| {
            sink.lock().push(map.get("general_close").cloned().unwrap_or_default());
        });

        registry.register("en", json!({ "general": { "close": "Close 2" } })).unwrap();

        assert_eq!(*seen.lock(), vec!["Close".to_string(), "Close 2".to_string()]);
    }

    #[googletest::test]
    fn earlier_snapshots_are_not_mutated() {
        let registry = TranslationRegistry::new();
        registry.register("en", english()).unwrap();
        let snapshot = registry.translations("en").get();

        registry.register("en", json!({ "general": { "close": "Close 2" } })).unwrap();

        expect_that!(snapshot.get("general_close"), some(eq(&"Close".to_string())));
    }

    #[googletest::test]
    fn unregister_recomputes_merge() {
        let registry = TranslationRegistry::new();
        registry.register("en", english()).unwrap();
        let override_id =
            registry.register("en", json!({ "general": { "close": "Close 2" } })).unwrap();

        expect_that!(registry.unregister(override_id), eq(true));
        expect_that!(registry.unregister(override_id), eq(false));

        let merged = registry.translations("en").get();
        expect_that!(merged.get("general_close"), some(eq(&"Close".to_string())));
    }

    #[googletest::test]
    fn custom_separator_is_used() {
        let registry = TranslationRegistry::with_separator(".").unwrap();
        registry.register("en", english()).unwrap();

        let merged = registry.translations("en").get();
        expect_that!(registry.key_separator(), eq("."));
        expect_that!(merged.get("general.close"), some(anything()));
        assert_eq!(
            TranslationRegistry::with_separator("").err(),
            Some(RegistryError::EmptySeparator)
        );
    }

    #[googletest::test]
    fn attach_registers_each_manifest_once() {
        let registry = TranslationRegistry::new();
        let manifests = ManifestList::new();
        manifests.push(TranslationManifest::new("test.en", "en", english()));

        let _attached = registry.attach(&manifests);
        manifests.push(TranslationManifest::new(
            "test.en.override",
            "en",
            json!({ "general": { "close": "Close 2" } }),
        ));

        let merged = registry.translations("en").get();
        expect_that!(merged.get("general_close"), some(eq(&"Close 2".to_string())));
        expect_that!(merged.get("general_logout"), some(eq(&"Log out".to_string())));

        manifests.remove("test.en.override");
        let merged = registry.translations("en").get();
        expect_that!(merged.get("general_close"), some(eq(&"Close".to_string())));
    }

    #[googletest::test]
    fn attach_skips_manifest_without_culture() {
        let registry = TranslationRegistry::new();
        let manifests = ManifestList::new();
        manifests.push(TranslationManifest::new("broken", "", english()));
        manifests.push(TranslationManifest::new("test.da", "da", json!({ "a": "b" })));

        let _attached = registry.attach(&manifests);

        assert_eq!(registry.locales(), vec!["da".to_string()]);
    }

    fn tracked_locales(registry: &TranslationRegistry) -> Vec<String> {
        let mut locales: Vec<String> =
            registry.inner.state.lock().locales.keys().cloned().collect();
        locales.sort();
        locales
    }

    #[googletest::test]
    fn idle_locales_are_not_retained() {
        let registry = TranslationRegistry::new();
        registry.register("en", english()).unwrap();

        for locale in ["xx", "yy", "zz"] {
            let _ = registry.translations(locale).get();
        }
        let watched = registry.translations("fr");
        let _sub = registry.translations("de").subscribe(|_| {});
        let _ = registry.translations("en");

        assert_eq!(
            tracked_locales(&registry),
            vec!["de".to_string(), "en".to_string(), "fr".to_string()]
        );

        registry.register("fr", json!({ "general": { "close": "Fermer" } })).unwrap();
        let merged = watched.get();
        expect_that!(merged.get("general_close"), some(eq(&"Fermer".to_string())));
    }

    #[googletest::test]
    fn attach_accepts_manifests_pushed_from_a_subscriber() {
        let registry = TranslationRegistry::new();
        let manifests = ManifestList::new();
        let _attached = registry.attach(&manifests);

        let lazy = manifests.clone();
        let pushed = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let _sub = registry.translations("en").subscribe(move |map| {
            if map.contains_key("general_close") && !pushed.swap(true, Ordering::SeqCst) {
                lazy.push(TranslationManifest::new(
                    "lazy.en",
                    "en",
                    json!({ "general": { "help": "Help" } }),
                ));
            }
        });

        manifests.push(TranslationManifest::new("test.en", "en", english()));

        let merged = registry.translations("en").get();
        expect_that!(merged.get("general_close"), some(eq(&"Close".to_string())));
        expect_that!(merged.get("general_help"), some(eq(&"Help".to_string())));
        expect_that!(manifests.len(), eq(2));

        manifests.remove("lazy.en");
        let merged = registry.translations("en").get();
        expect_that!(merged.get("general_help"), none());
    }

    #[googletest::test]
    fn concurrent_registrations_publish_complete_snapshots_in_order() {
        let registry = TranslationRegistry::new();
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&sizes);
        let _sub = registry.translations("en").subscribe(move |map| sink.lock().push(map.len()));

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let registry = registry.clone();
                scope.spawn(move || {
                    for step in 0..10 {
                        let key = format!("key{worker}_{step}");
                        let payload: serde_json::Map<String, Value> =
                            std::iter::once((key, json!("value"))).collect();
                        registry.register("en", Value::Object(payload)).unwrap();
                    }
                });
            }
        });

        let sizes = sizes.lock();
        // Every bundle adds one key, so each snapshot is one larger than the last.
        let expected: Vec<usize> = (0..=40).collect();
        assert_eq!(*sizes, expected);
        expect_that!(registry.translations("en").get().len(), eq(40));
    }

    #[googletest::test]
    fn handles_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<TranslationRegistry>();
        assert_send_sync::<Translations>();
        assert_send_sync::<Subscription>();
        assert_send_sync::<crate::context::LocalizationContext>();
        assert_send_sync::<crate::context::Localized<String>>();
    }
}

//! Translation manifests contributed by extensions.
//!
//! The extension registry itself lives outside this crate. What the
//! localization engine needs from it is captured by [`ManifestSource`]: a way
//! to observe every manifest of the `translations` kind.

use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;

use crate::input::translation::TranslationBundle;
use crate::observable::{
    Observable,
    Subscription,
};

/// Extension kind carrying translation bundles.
pub const TRANSLATIONS_KIND: &str = "translations";

fn translations_kind() -> String {
    TRANSLATIONS_KIND.to_string()
}

/// An extension manifest as declared by a package.
///
/// ```json
/// {
///   "type": "translations",
///   "alias": "test.en",
///   "name": "Test English",
///   "meta": { "culture": "en", "translations": { "general": { "close": "Close" } } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationManifest {
    /// Extension kind; only [`TRANSLATIONS_KIND`] manifests carry bundles
    #[serde(rename = "type", default = "translations_kind")]
    pub kind: String,
    /// Unique identifier of the manifest
    pub alias: String,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Culture and translation payload
    pub meta: TranslationMeta,
}

/// Payload of a `translations` manifest.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationMeta {
    /// Locale tag the translations belong to
    pub culture: String,
    /// Nested translation object
    #[serde(default)]
    pub translations: Value,
}

impl TranslationManifest {
    /// Creates a `translations` manifest named after its alias.
    #[must_use]
    pub fn new(alias: impl Into<String>, culture: impl Into<String>, translations: Value) -> Self {
        let alias = alias.into();
        Self {
            kind: translations_kind(),
            name: alias.clone(),
            alias,
            meta: TranslationMeta { culture: culture.into(), translations },
        }
    }

    /// `true` for manifests of the `translations` kind.
    #[must_use]
    pub fn is_translations(&self) -> bool {
        self.kind == TRANSLATIONS_KIND
    }

    /// The bundle this manifest contributes.
    #[must_use]
    pub fn to_bundle(&self) -> TranslationBundle {
        TranslationBundle::new(self.meta.culture.clone(), self.meta.translations.clone())
    }
}

/// Listener receiving the full list of translation manifests.
pub type ManifestListener = Box<dyn Fn(&[TranslationManifest]) + Send + Sync>;

/// Something that can report translation manifests as they appear.
pub trait ManifestSource {
    /// Calls `listener` with every current `translations` manifest, then again
    /// whenever the set changes, until the returned subscription is dropped.
    fn observe_translations(&self, listener: ManifestListener) -> Subscription;
}

/// In-memory manifest list, e.g. for bundles loaded from disk or lazily
/// contributed by packages at runtime.
#[derive(Clone)]
pub struct ManifestList {
    manifests: Observable<Vec<TranslationManifest>>,
}

impl Default for ManifestList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManifestList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestList").field("len", &self.len()).finish()
    }
}

impl ManifestList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self { manifests: Observable::new(Vec::new()) }
    }

    /// Adds a manifest, replacing any previous one with the same alias.
    pub fn push(&self, manifest: TranslationManifest) {
        self.extend([manifest]);
    }

    /// Adds several manifests at once, publishing a single change.
    pub fn extend(&self, manifests: impl IntoIterator<Item = TranslationManifest>) {
        let mut next = (*self.manifests.get()).clone();
        for manifest in manifests {
            next.retain(|existing| existing.alias != manifest.alias);
            next.push(manifest);
        }
        self.manifests.set(next);
    }

    /// Removes the manifest with `alias`. Returns `false` if there was none.
    pub fn remove(&self, alias: &str) -> bool {
        let mut next = (*self.manifests.get()).clone();
        let before = next.len();
        next.retain(|manifest| manifest.alias != alias);
        if next.len() == before {
            return false;
        }
        self.manifests.set(next);
        true
    }

    /// Number of manifests of any kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.manifests.get().len()
    }

    /// `true` when the list holds no manifests.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ManifestSource for ManifestList {
    fn observe_translations(&self, listener: ManifestListener) -> Subscription {
        self.manifests.subscribe(move |manifests: &Vec<TranslationManifest>| {
            let translations: Vec<TranslationManifest> =
                manifests.iter().filter(|manifest| manifest.is_translations()).cloned().collect();
            listener(&translations);
        })
    }
}

//! Locale selection and live translation lookups.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::L10nSettings;
use crate::input::translation::TranslationMap;
use crate::observable::{
    Observable,
    Subscription,
};
use crate::registry::TranslationRegistry;

/// Resolves `key` against `translations`: the translation, else `fallback`,
/// else an empty string.
#[must_use]
pub fn resolve(translations: &TranslationMap, key: &str, fallback: Option<&str>) -> String {
    translations
        .get(key)
        .map(String::as_str)
        .or(fallback)
        .unwrap_or_default()
        .to_string()
}

/// Holds the active locale and hands out lookups that follow it.
#[derive(Clone)]
pub struct LocalizationContext {
    registry: TranslationRegistry,
    language: Observable<String>,
}

impl fmt::Debug for LocalizationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalizationContext")
            .field("language", &*self.language.get())
            .field("registry", &self.registry)
            .finish()
    }
}

impl LocalizationContext {
    /// Creates a context with no active locale; lookups resolve to their
    /// fallback until [`set_language`](Self::set_language) is called.
    #[must_use]
    pub fn new(registry: TranslationRegistry) -> Self {
        Self::with_language(registry, "")
    }

    /// Creates a context on `registry` starting at `language`.
    #[must_use]
    pub fn with_language(registry: TranslationRegistry, language: impl Into<String>) -> Self {
        Self { registry, language: Observable::new(language.into()) }
    }

    /// Creates a context on `registry` starting at the configured default language.
    #[must_use]
    pub fn from_settings(registry: TranslationRegistry, settings: &L10nSettings) -> Self {
        Self::with_language(registry, settings.default_language.clone())
    }

    /// The registry lookups resolve against.
    #[must_use]
    pub const fn registry(&self) -> &TranslationRegistry {
        &self.registry
    }

    /// The active locale.
    #[must_use]
    pub fn language(&self) -> String {
        (*self.language.get()).clone()
    }

    /// Switches the active locale. Every live lookup re-resolves against the
    /// new locale before this returns.
    pub fn set_language(&self, language: impl Into<String>) {
        let language = language.into();
        if self.language.set_if_changed(language.clone()) {
            tracing::debug!(language = %language, "Switched localization language");
        }
    }

    /// Live translation of `key`, falling back to `fallback` or `""`.
    #[must_use]
    pub fn localize(&self, key: &str, fallback: Option<&str>) -> Localized<String> {
        let key = key.to_string();
        let fallback = fallback.map(ToString::to_string);
        self.project(move |translations| resolve(translations, &key, fallback.as_deref()))
    }

    /// Live translations of `keys`, in the same order. Missing keys yield `""`.
    #[must_use]
    pub fn localize_many<S: AsRef<str>>(&self, keys: &[S]) -> Localized<Vec<String>> {
        let keys: Vec<String> = keys.iter().map(|key| key.as_ref().to_string()).collect();
        self.project(move |translations| {
            keys.iter().map(|key| resolve(translations, key, None)).collect()
        })
    }

    /// Wires a projection of the active locale's merged translations.
    ///
    /// On every locale switch the previous registry subscription is dropped
    /// and a new one is opened for the new locale.
    fn project<T, F>(&self, projection: F) -> Localized<T>
    where
        T: PartialEq + Send + Sync + 'static,
        F: Fn(&TranslationMap) -> T + Send + Sync + 'static,
    {
        let projection = Arc::new(projection);
        let value = Observable::new(projection(&TranslationMap::new()));
        let wiring = Arc::new(Mutex::new(Wiring::default()));

        let language_subscription = {
            let registry = self.registry.clone();
            let value = value.clone();
            let wiring = Arc::clone(&wiring);
            self.language.subscribe(move |language: &String| {
                let generation = {
                    let mut wiring = wiring.lock();
                    wiring.generation += 1;
                    drop(wiring.translations.take());
                    wiring.generation
                };

                let subscription = if language.is_empty() {
                    value.set_if_changed(projection(&TranslationMap::new()));
                    None
                } else {
                    let value = value.clone();
                    let projection = Arc::clone(&projection);
                    let current = Arc::clone(&wiring);
                    Some(registry.translations(language).subscribe(move |translations| {
                        // Stale once another locale has been wired.
                        if current.lock().generation != generation {
                            return;
                        }
                        value.set_if_changed(projection(translations));
                    }))
                };

                // A newer locale may have been wired while we subscribed.
                let mut wiring = wiring.lock();
                if wiring.generation == generation {
                    wiring.translations = subscription;
                }
            })
        };

        Localized { _language: language_subscription, _wiring: wiring, value }
    }
}

/// Registry subscription of one live lookup.
#[derive(Debug, Default)]
struct Wiring {
    /// Bumped on every locale switch.
    generation: u64,
    translations: Option<Subscription>,
}

/// A translation value that stays current.
///
/// Re-resolves whenever the active locale or its merged translations change.
/// Dropping it disconnects the lookup.
pub struct Localized<T> {
    _language: Subscription,
    _wiring: Arc<Mutex<Wiring>>,
    value: Observable<T>,
}

impl<T: fmt::Debug + Send + Sync + 'static> fmt::Debug for Localized<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localized").field("value", &*self.value.get()).finish_non_exhaustive()
    }
}

impl<T: Send + Sync + 'static> Localized<T> {
    /// The latest resolved value.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        (*self.value.get()).clone()
    }

    /// The latest resolved value without cloning it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<T> {
        self.value.get()
    }

    /// Receives the current value at once and every change afterwards.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.value.subscribe(callback)
    }
}

//! live-l10n
//!
//! 拡張機能から実行時に追加される翻訳バンドルをロケールごとにマージし、
//! 言語切り替えや翻訳の追加に追従するライブな翻訳参照を提供する。
//!
//! ```
//! use live_l10n::{LocalizationContext, TranslationRegistry};
//! use serde_json::json;
//!
//! let registry = TranslationRegistry::new();
//! registry.register("en", json!({ "general": { "close": "Close" } })).unwrap();
//!
//! let context = LocalizationContext::with_language(registry.clone(), "en");
//! let close = context.localize("general_close", None);
//! assert_eq!(close.get(), "Close");
//!
//! registry.register("en", json!({ "general": { "close": "Close 2" } })).unwrap();
//! assert_eq!(close.get(), "Close 2");
//! ```

pub mod config;
pub mod context;
pub mod extension;
pub mod input;
pub mod loader;
pub mod observable;
pub mod registry;

pub use context::{
    Localized,
    LocalizationContext,
};
pub use extension::{
    ManifestList,
    ManifestSource,
    TranslationManifest,
};
pub use input::translation::{
    TranslationBundle,
    TranslationMap,
};
pub use observable::{
    Observable,
    Subscription,
};
pub use registry::{
    BundleId,
    RegistryError,
    TranslationRegistry,
    Translations,
};

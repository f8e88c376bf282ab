//! Translation bundle input definitions

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use serde_json::Value;

/// Separator used to join nested payload keys when none is configured.
pub const DEFAULT_KEY_SEPARATOR: &str = "_";

/// Flattened, insertion-ordered translation key map (e.g., "general_close" -> "Close").
pub type TranslationMap = IndexMap<String, String>;

/// RFC 5646 language codes
/// Based on <http://tools.ietf.org/html/rfc5646>
static LANGUAGE_CODES: LazyLock<HashSet<String>> = LazyLock::new(|| {
    [
        "af",
        "af-ZA",
        "ar",
        "ar-AE",
        "ar-BH",
        "ar-DZ",
        "ar-EG",
        "ar-IQ",
        "ar-JO",
        "ar-KW",
        "ar-LB",
        "ar-LY",
        "ar-MA",
        "ar-OM",
        "ar-QA",
        "ar-SA",
        "ar-SY",
        "ar-TN",
        "ar-YE",
        "az",
        "az-AZ",
        "az-Cyrl-AZ",
        "be",
        "be-BY",
        "bg",
        "bg-BG",
        "bs-BA",
        "ca",
        "ca-ES",
        "cs",
        "cs-CZ",
        "cy",
        "cy-GB",
        "da",
        "da-DK",
        "de",
        "de-AT",
        "de-CH",
        "de-DE",
        "de-LI",
        "de-LU",
        "dv",
        "dv-MV",
        "el",
        "el-GR",
        "en",
        "en-AU",
        "en-BZ",
        "en-CA",
        "en-CB",
        "en-GB",
        "en-IE",
        "en-JM",
        "en-NZ",
        "en-PH",
        "en-TT",
        "en-US",
        "en-ZA",
        "en-ZW",
        "eo",
        "es",
        "es-AR",
        "es-BO",
        "es-CL",
        "es-CO",
        "es-CR",
        "es-DO",
        "es-EC",
        "es-ES",
        "es-GT",
        "es-HN",
        "es-MX",
        "es-NI",
        "es-PA",
        "es-PE",
        "es-PR",
        "es-PY",
        "es-SV",
        "es-UY",
        "es-VE",
        "et",
        "et-EE",
        "eu",
        "eu-ES",
        "fa",
        "fa-IR",
        "fi",
        "fi-FI",
        "fo",
        "fo-FO",
        "fr",
        "fr-BE",
        "fr-CA",
        "fr-CH",
        "fr-FR",
        "fr-LU",
        "fr-MC",
        "gl",
        "gl-ES",
        "gu",
        "gu-IN",
        "he",
        "he-IL",
        "hi",
        "hi-IN",
        "hr",
        "hr-BA",
        "hr-HR",
        "hu",
        "hu-HU",
        "hy",
        "hy-AM",
        "id",
        "id-ID",
        "is",
        "is-IS",
        "it",
        "it-CH",
        "it-IT",
        "ja",
        "ja-JP",
        "ka",
        "ka-GE",
        "kk",
        "kk-KZ",
        "kn",
        "kn-IN",
        "ko",
        "ko-KR",
        "kok",
        "kok-IN",
        "ky",
        "ky-KG",
        "lt",
        "lt-LT",
        "lv",
        "lv-LV",
        "mi",
        "mi-NZ",
        "mk",
        "mk-MK",
        "mn",
        "mn-MN",
        "mr",
        "mr-IN",
        "ms",
        "ms-BN",
        "ms-MY",
        "mt",
        "mt-MT",
        "nb",
        "nb-NO",
        "nl",
        "nl-BE",
        "nl-NL",
        "nn-NO",
        "ns",
        "ns-ZA",
        "pa",
        "pa-IN",
        "pl",
        "pl-PL",
        "ps",
        "ps-AR",
        "pt",
        "pt-BR",
        "pt-PT",
        "qu",
        "qu-BO",
        "qu-EC",
        "qu-PE",
        "ro",
        "ro-RO",
        "ru",
        "ru-RU",
        "sa",
        "sa-IN",
        "se",
        "se-FI",
        "se-NO",
        "se-SE",
        "sk",
        "sk-SK",
        "sl",
        "sl-SI",
        "sq",
        "sq-AL",
        "sr-BA",
        "sr-Cyrl-BA",
        "sr-SP",
        "sr-Cyrl-SP",
        "sv",
        "sv-FI",
        "sv-SE",
        "sw",
        "sw-KE",
        "syr",
        "syr-SY",
        "ta",
        "ta-IN",
        "te",
        "te-IN",
        "th",
        "th-TH",
        "tl",
        "tl-PH",
        "tn",
        "tn-ZA",
        "tr",
        "tr-TR",
        "tt",
        "tt-RU",
        "ts",
        "uk",
        "uk-UA",
        "ur",
        "ur-PK",
        "uz",
        "uz-UZ",
        "uz-Cyrl-UZ",
        "vi",
        "vi-VN",
        "xh",
        "xh-ZA",
        "zh",
        "zh-CN",
        "zh-HK",
        "zh-MO",
        "zh-SG",
        "zh-TW",
        "zu",
        "zu-ZA",
    ]
    .iter()
    .flat_map(|code| {
        let code = (*code).to_string();
        let normalized = normalize_language_code(&code);
        vec![code, normalized]
    })
    .collect()
});

/// Normalize language code (lowercase and replace - with _)
fn normalize_language_code(code: &str) -> String {
    code.to_lowercase().replace('-', "_")
}

/// Returns `true` if `tag` is a known language code in either spelling
/// (`en-US`, `en_us`).
#[must_use]
pub fn is_language_code(tag: &str) -> bool {
    LANGUAGE_CODES.contains(tag) || LANGUAGE_CODES.contains(&normalize_language_code(tag))
}

/// Detect locale from a translation file path.
///
/// Splits the path by '/' and '.', then searches backwards for a part
/// that matches a known language code. `_` in the detected tag is written
/// as `-`; letter case is kept as found.
///
/// # Examples
/// - `locales/en.json` → `en`
/// - `lang/fr-FR/common.json` → `fr-FR`
/// - `translations/en_US/common.json` → `en-US`
#[must_use]
pub fn detect_locale_from_path(file_path: &Path) -> Option<String> {
    let path_str = file_path.to_string_lossy();

    path_str
        .split(['/', '\\', '.'])
        .rev()
        .find(|part| !part.is_empty() && is_language_code(part))
        .map(|part| part.replace('_', "-"))
}

/// One registered unit of nested translation data for a single locale.
///
/// Bundles are immutable once built; registering a second bundle for the
/// same locale adds to the first instead of replacing it.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationBundle {
    locale: String,
    payload: Value,
}

impl TranslationBundle {
    /// Wraps `payload` as a bundle for `locale`.
    #[must_use]
    pub fn new(locale: impl Into<String>, payload: Value) -> Self {
        Self { locale: locale.into(), payload }
    }

    /// The locale tag the bundle belongs to.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// The nested payload as registered.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Flattens the payload with `separator`.
    #[must_use]
    pub fn flatten(&self, separator: &str) -> TranslationMap {
        flatten_json(&self.payload, separator, None)
    }
}

/// Flatten nested JSON object into a separator-joined key map.
///
/// Keys keep the order in which they appear in the payload. String leaves are
/// taken verbatim; any other non-object leaf (number, bool, null, array) is
/// stored as its JSON text so that one odd value cannot hide the rest of a
/// bundle. A root that is not an object contributes nothing.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use live_l10n::input::translation::flatten_json;
///
/// let json = json!({
///     "general": {
///         "close": "Close",
///         "logout": "Log out"
///     }
/// });
///
/// let flattened = flatten_json(&json, "_", None);
/// assert_eq!(flattened.get("general_close"), Some(&"Close".to_string()));
/// assert_eq!(flattened.get("general_logout"), Some(&"Log out".to_string()));
/// ```
#[must_use]
pub fn flatten_json(json: &Value, separator: &str, prefix: Option<&str>) -> TranslationMap {
    let mut result = TranslationMap::new();
    if json.is_object() || prefix.is_some() {
        flatten_json_value(json, separator, prefix, &mut result);
    }
    result
}

fn flatten_json_value(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut TranslationMap,
) {
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key =
                    prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), s.clone());
            }
        }
        _ => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), json.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[googletest::test]
    fn test_flatten_json_nested() {
        let json = json!({
            "general": {
                "close": "Close",
                "logout": "Log out"
            }
        });

        let result = flatten_json(&json, "_", None);

        expect_that!(result.get("general_close"), some(eq(&"Close".to_string())));
        expect_that!(result.get("general_logout"), some(eq(&"Log out".to_string())));
        expect_that!(result.len(), eq(2));
    }

    #[googletest::test]
    fn test_flatten_json_deep_nested() {
        let json = json!({
            "a": {
                "b": {
                    "c": "Deep value"
                }
            }
        });

        let result = flatten_json(&json, "_", None);

        expect_that!(result.get("a_b_c"), some(eq(&"Deep value".to_string())));
        expect_that!(result.len(), eq(1));
    }

    #[googletest::test]
    fn test_flatten_json_custom_separator() {
        let json = json!({
            "common": {
                "hello": "Hello"
            }
        });

        let result = flatten_json(&json, ".", None);

        expect_that!(result.get("common.hello"), some(eq(&"Hello".to_string())));
    }

    #[googletest::test]
    fn test_flatten_json_preserves_source_order() {
        let json = json!({
            "zeta": "Z",
            "alpha": { "b": "B", "a": "A" },
            "mid": "M"
        });

        let result = flatten_json(&json, "_", None);
        let keys: Vec<&str> = result.keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["zeta", "alpha_b", "alpha_a", "mid"]);
    }

    #[googletest::test]
    fn test_flatten_json_coerces_non_string_leaves() {
        let json = json!({
            "number": 42,
            "boolean": true,
            "null": null,
            "list": ["a", "b"]
        });

        let result = flatten_json(&json, "_", None);

        expect_that!(result.get("number"), some(eq(&"42".to_string())));
        expect_that!(result.get("boolean"), some(eq(&"true".to_string())));
        expect_that!(result.get("null"), some(eq(&"null".to_string())));
        expect_that!(result.get("list"), some(eq(&r#"["a","b"]"#.to_string())));
    }

    #[googletest::test]
    fn test_flatten_json_empty_and_scalar_roots() {
        expect_that!(flatten_json(&json!({}), "_", None).is_empty(), eq(true));
        expect_that!(flatten_json(&json!("loose"), "_", None).is_empty(), eq(true));
        expect_that!(flatten_json(&json!({ "general": {} }), "_", None).is_empty(), eq(true));
    }

    #[googletest::test]
    fn test_bundle_flatten_uses_separator() {
        let bundle = TranslationBundle::new("en", json!({ "general": { "close": "Close" } }));

        expect_that!(bundle.locale(), eq("en"));
        expect_that!(bundle.flatten("_").get("general_close"), some(eq(&"Close".to_string())));
        expect_that!(bundle.flatten("-").get("general-close"), some(eq(&"Close".to_string())));
    }

    #[rstest]
    #[case("/path/to/locales/en.json", Some("en"))]
    #[case("/path/to/locales/en/common.json", Some("en"))]
    #[case("lang/fr-FR/common.json", Some("fr-FR"))]
    #[case("translations/en_US/messages.json", Some("en-US"))]
    #[case("lang/pt_br.json", Some("pt-br"))]
    #[case("i18n/common.da-dk.json", Some("da-dk"))]
    #[case("/path/to/locales/common.json", None)]
    #[case("/path/to/data.json", None)]
    fn test_detect_locale_from_path(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(detect_locale_from_path(Path::new(path)).as_deref(), expected);
    }

    #[rstest]
    #[case("en", true)]
    #[case("en-US", true)]
    #[case("en_us", true)]
    #[case("EN-us", true)]
    #[case("xx", false)]
    #[case("", false)]
    fn test_is_language_code(#[case] tag: &str, #[case] expected: bool) {
        assert_eq!(is_language_code(tag), expected);
    }
}

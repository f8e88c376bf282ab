//! Looks up translation keys in a directory of translation files.
//!
//! ```text
//! l10n-lookup <dir> [--lang <locale>] <key>...
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use live_l10n::config::ConfigManager;
use live_l10n::loader::load_translation_dir;
use live_l10n::{
    LocalizationContext,
    ManifestList,
    TranslationRegistry,
};
use tracing_subscriber::EnvFilter;

/// Parsed command line.
struct Args {
    root: PathBuf,
    language: Option<String>,
    keys: Vec<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Args> {
    let root = PathBuf::from(args.next()?);
    let mut language = None;
    let mut keys = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--lang" {
            language = Some(args.next()?);
        } else {
            keys.push(arg);
        }
    }

    if keys.is_empty() {
        return None;
    }
    Some(Args { root, language, keys })
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Some(args) = parse_args(std::env::args().skip(1)) else {
        eprintln!("usage: l10n-lookup <dir> [--lang <locale>] <key>...");
        return ExitCode::from(2);
    };

    let mut config_manager = ConfigManager::new();
    if let Err(err) = config_manager.load_settings(Some(args.root.clone())) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }
    let settings = config_manager.get_settings();

    let registry = match TranslationRegistry::from_settings(settings) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let manifests = ManifestList::new();
    let _attached = registry.attach(&manifests);
    match load_translation_dir(&args.root, settings) {
        Ok(loaded) => manifests.extend(loaded),
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    }
    tracing::info!(locales = ?registry.locales(), "Translations loaded");

    let context = LocalizationContext::from_settings(registry, settings);
    if let Some(language) = args.language {
        context.set_language(language);
    }

    let values = context.localize_many(&args.keys);
    for (key, value) in args.keys.iter().zip(values.get()) {
        println!("{key}\t{value}");
    }

    ExitCode::SUCCESS
}

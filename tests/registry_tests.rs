// Unit tests for the language → model registry

use speech_session::{ModelHandle, ModelRegistry};

fn loaded_registry() -> ModelRegistry {
    let registry = ModelRegistry::new("en-US");
    registry.register(ModelHandle::new("en-US"));
    registry.register(ModelHandle::with_path("de-DE", "models/de-de"));
    registry.mark_ready();
    registry
}

#[test]
fn test_registry_not_ready_until_marked() {
    let registry = ModelRegistry::new("en-US");
    registry.register(ModelHandle::new("en-US"));

    assert!(!registry.is_ready());

    registry.mark_ready();
    assert!(registry.is_ready());
}

#[test]
fn test_registry_with_no_models_is_not_ready() {
    let registry = ModelRegistry::new("en-US");
    registry.mark_ready();

    assert!(!registry.is_ready());
}

#[test]
fn test_lookup_returns_registered_model() {
    let registry = loaded_registry();

    let model = registry.lookup("de-DE").expect("model registered");
    assert_eq!(model.language, "de-DE");
    assert_eq!(model.path.as_deref(), Some(std::path::Path::new("models/de-de")));

    assert!(registry.lookup("fr-FR").is_none());
}

#[test]
fn test_available_languages_sorted() {
    let registry = loaded_registry();
    assert_eq!(registry.available_languages(), vec!["de-DE", "en-US"]);
}

#[test]
fn test_resolve_exact_match() {
    let registry = loaded_registry();
    assert_eq!(registry.resolve_language(Some("de-DE")), "de-DE");
}

#[test]
fn test_resolve_is_case_insensitive() {
    let registry = loaded_registry();
    assert_eq!(registry.resolve_language(Some("DE-de")), "de-DE");
}

#[test]
fn test_resolve_matches_locale_family() {
    let registry = loaded_registry();

    // en-GB has no model, but the en family does.
    assert_eq!(registry.resolve_language(Some("en-GB")), "en-US");
    // Underscore separators are accepted too.
    assert_eq!(registry.resolve_language(Some("de_AT")), "de-DE");
}

#[test]
fn test_resolve_falls_back_to_default() {
    let registry = loaded_registry();

    assert_eq!(registry.resolve_language(Some("fr-FR")), "en-US");
    assert_eq!(registry.resolve_language(None), "en-US");
    assert_eq!(registry.resolve_language(Some("")), "en-US");
    assert_eq!(registry.resolve_language(Some("   ")), "en-US");
}

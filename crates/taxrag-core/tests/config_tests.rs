use std::fs;

use figment::{providers::Serialized, Figment};
use tempfile::TempDir;

use taxrag_core::config::{resolve_with_base, Config, Settings, StorageFormat};

#[test]
fn defaults_apply_without_files() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_from(tmp.path()).expect("load defaults");
    let settings = config.settings().expect("settings");

    assert_eq!(settings.retrieval.top_k, 5);
    assert!((settings.retrieval.similarity_threshold - 0.3).abs() < 1e-6);
    assert_eq!(settings.cache.capacity, 100);
    assert_eq!(settings.cache.evict_batch, 20);
    assert_eq!(settings.storage.default_document, "ITA_primary");
}

#[test]
fn toml_file_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[storage]\nformat = \"native\"\nvector_dir = \"stores\"\n\n[answer]\ncorpus_title = \"Finance Act\"\n",
    )
    .unwrap();

    let config = Config::load_from(tmp.path()).expect("load");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.storage.format, StorageFormat::Native);
    assert_eq!(settings.storage.vector_dir, "stores");
    assert_eq!(settings.answer.corpus_title, "Finance Act");
    // untouched sections keep their defaults
    assert_eq!(settings.retrieval.overfetch, 3);

    let title: String = config.get("answer.corpus_title").expect("get");
    assert_eq!(title, "Finance Act");
}

#[test]
fn invalid_threshold_is_rejected() {
    let mut bad = Settings::default();
    bad.retrieval.similarity_threshold = 1.5;
    assert!(bad.validate().is_err());

    let mut bad = Settings::default();
    bad.cache.evict_batch = 0;
    assert!(bad.validate().is_err());

    let config = Config::from_figment(Figment::from(Serialized::defaults(Settings::default())));
    assert!(config.settings().expect("settings").validate().is_ok());
}

#[test]
fn relative_paths_resolve_against_base() {
    let tmp = TempDir::new().unwrap();
    let p = resolve_with_base(tmp.path(), "vector_database");
    assert_eq!(p, tmp.path().join("vector_database"));
}

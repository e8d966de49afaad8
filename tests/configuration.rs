//! End-to-end: discovery, layering and template extraction together.

use quince::{Configuration, Map, SearchPaths, Template, Value, CONFIG_FILENAME};

#[test]
fn test_files_args_and_templates_compose() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILENAME),
        "workers: 4\nmode: careful\nlibrary: books.db\n",
    )
    .unwrap();

    let mut config = Configuration::with_paths("t", SearchPaths::with_dirs([dir.path()])).unwrap();
    let mut args = Map::new();
    args.insert("workers".into(), Value::Integer(8));
    args.insert("mode".into(), Value::Null);
    config.set_args(args);

    let valid = config
        .view()
        .extract(Template::mapping([
            ("workers", Template::integer()),
            ("mode", Template::choice(["fast", "careful"])),
            ("library", Template::filename()),
        ]))
        .unwrap();

    assert_eq!(valid["workers"], 8);
    assert_eq!(valid["mode"], "careful");
    // A relative filename from a user file resolves in the discovered
    // configuration directory.
    assert_eq!(valid["library"].as_path().unwrap(), dir.path().join("books.db"));
}

#[test]
fn test_default_file_filename_resolves_beside_itself() {
    let user = tempfile::tempdir().unwrap();
    let pkg = tempfile::tempdir().unwrap();
    std::fs::write(user.path().join(CONFIG_FILENAME), "workers: 2\n").unwrap();
    let defaults = pkg.path().join("config_default.yaml");
    std::fs::write(&defaults, "dictionary: words.txt\n").unwrap();

    let mut config = Configuration::with_paths("t", SearchPaths::with_dirs([user.path()])).unwrap();
    config.add_default_file(&defaults).unwrap();

    let resolved = config.at("dictionary").extract(Template::filename()).unwrap();
    assert_eq!(resolved.as_path().unwrap(), pkg.path().join("words.txt"));
}

#[test]
fn test_overlay_outranks_args_and_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILENAME), "workers: 4\n").unwrap();

    let mut config = Configuration::with_paths("t", SearchPaths::with_dirs([dir.path()])).unwrap();
    let mut args = Map::new();
    args.insert("workers".into(), Value::Integer(8));
    config.set_args(args);
    config.at("workers").set(16).unwrap();

    assert_eq!(config.at("workers").get_i64().unwrap(), 16);
}

#[test]
fn test_no_files_at_all_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    let config = Configuration::with_paths("t", SearchPaths::with_dirs([dir.path()])).unwrap();
    assert_eq!(
        config.at("workers").extract(Template::integer().with_default(4)).unwrap(),
        4
    );
}

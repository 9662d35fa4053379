//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn lexidrill(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("lexidrill").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("LEXIDRILL_OPENAI_KEY")
        .env_remove("LEXIDRILL_ANTHROPIC_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn add_word(dir: &Path, word: &str, translation: &str, language: &str) {
    lexidrill(dir)
        .args(["add", word, translation, "--language", language])
        .assert()
        .success();
}

/// Config whose generator points at a port nothing listens on.
const UNREACHABLE_CONFIG: &str = r#"
generator_timeout_secs = 5

[providers.openai]
type = "openai"
api_key = "test-key"
base_url = "http://127.0.0.1:9"
"#;

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    lexidrill(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created lexidrill.toml"));

    assert!(dir.path().join("lexidrill.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("lexidrill.toml"), "# mine\n").unwrap();

    lexidrill(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    let content = std::fs::read_to_string(dir.path().join("lexidrill.toml")).unwrap();
    assert_eq!(content, "# mine\n");
}

#[test]
fn add_then_list() {
    let dir = TempDir::new().unwrap();
    add_word(dir.path(), "dog", "pies", "pl");
    add_word(dir.path(), "dog", "perro", "es");

    assert!(dir.path().join("lexidrill-library.json").exists());

    lexidrill(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("pies"))
        .stdout(predicate::str::contains("perro"))
        .stdout(predicate::str::contains("2 word(s)"));

    lexidrill(dir.path())
        .args(["list", "--language", "ES"])
        .assert()
        .success()
        .stdout(predicate::str::contains("perro"))
        .stdout(predicate::str::contains("pies").not());
}

#[test]
fn add_rejects_blank_word() {
    let dir = TempDir::new().unwrap();

    lexidrill(dir.path())
        .args(["add", " ", "pies", "--language", "pl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn draw_from_empty_library_fails() {
    let dir = TempDir::new().unwrap();

    lexidrill(dir.path())
        .arg("draw")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no entries available"));
}

#[test]
fn draw_picks_from_language() {
    let dir = TempDir::new().unwrap();
    add_word(dir.path(), "dog", "pies", "pl");
    add_word(dir.path(), "cat", "gato", "es");

    lexidrill(dir.path())
        .args(["draw", "--language", "es"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#2 cat"));
}

#[test]
fn check_updates_level() {
    let dir = TempDir::new().unwrap();
    add_word(dir.path(), "dog", "pies", "pl");

    lexidrill(dir.path())
        .args(["check", "1", "PIES"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Correct!"))
        .stdout(predicate::str::contains("Proficiency level: 2"));

    lexidrill(dir.path())
        .args(["check", "1", "kot"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Incorrect. The correct answer is: pies",
        ))
        .stdout(predicate::str::contains("Proficiency level: 1"));
}

#[test]
fn check_unknown_id_fails() {
    let dir = TempDir::new().unwrap();

    lexidrill(dir.path())
        .args(["check", "42", "pies"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("entry not found: 42"));
}

#[test]
fn edit_and_delete() {
    let dir = TempDir::new().unwrap();
    add_word(dir.path(), "dog", "pies", "pl");

    lexidrill(dir.path())
        .args(["edit", "1", "puppy", "szczeniak", "--language", "pl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated #1"));

    lexidrill(dir.path())
        .args(["delete", "1", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 of 2"));

    lexidrill(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No words yet"));
}

#[test]
fn export_then_import_into_new_library() {
    let source = TempDir::new().unwrap();
    add_word(source.path(), "book", "książka", "pl");
    lexidrill(source.path())
        .args(["add", "hi, \"you\"", "cześć", "--language", "pl"])
        .args(["--example", "Hi, how are you?"])
        .assert()
        .success();

    let csv_path = source.path().join("words.csv");
    lexidrill(source.path())
        .args(["export", "--output"])
        .arg(&csv_path)
        .assert()
        .success();

    let bytes = std::fs::read(&csv_path).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xFE]);

    let target = TempDir::new().unwrap();
    lexidrill(target.path())
        .args(["import", "--input"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 word(s)"));

    lexidrill(target.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("książka"))
        .stdout(predicate::str::contains("hi, \"you\""));
}

#[test]
fn import_rejects_bad_header() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("bad.csv");
    std::fs::write(&csv_path, "wrong,header\ndog,pies,pl,1\n").unwrap();

    lexidrill(dir.path())
        .args(["import", "--input"])
        .arg(&csv_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid CSV"));
}

#[test]
fn grammar_draws_topic() {
    let dir = TempDir::new().unwrap();
    add_word(dir.path(), "dog", "pies", "pl");

    lexidrill(dir.path())
        .arg("grammar")
        .assert()
        .success()
        .stdout(predicate::str::contains("#1 dog -> pies"))
        .stdout(predicate::str::contains("Grammar topic:"));
}

#[test]
fn validate_degrades_when_generator_unreachable() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("lexidrill.toml"), UNREACHABLE_CONFIG).unwrap();
    add_word(dir.path(), "dog", "pies", "pl");

    lexidrill(dir.path())
        .args(["validate", "1", "--sentence", "I has a dog.", "--topic", "Present Simple"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Incorrect"))
        .stdout(predicate::str::contains(
            "Error validating sentence. Please try again.",
        ))
        .stdout(predicate::str::contains("temporarily unavailable"));
}

#[test]
fn validate_without_provider_fails() {
    let dir = TempDir::new().unwrap();
    add_word(dir.path(), "dog", "pies", "pl");

    lexidrill(dir.path())
        .args(["validate", "1", "--sentence", "I have a dog.", "--topic", "Present Simple"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'openai' is not configured"));
}

#[test]
fn generate_reports_unavailable_generator() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("lexidrill.toml"), UNREACHABLE_CONFIG).unwrap();

    lexidrill(dir.path())
        .args(["generate", "--source", "English", "--target", "Polish"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable"));
}

#[test]
fn verify_falls_back_when_unreachable() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("lexidrill.toml"), UNREACHABLE_CONFIG).unwrap();

    lexidrill(dir.path())
        .args(["verify", "--source", "English", "--target", "Polish"])
        .args(["--text", "I have a dog.", "--translation", "Mam psa."])
        .assert()
        .success()
        .stdout(predicate::str::contains("Verification failed"));
}

#[test]
fn explicit_missing_config_fails() {
    let dir = TempDir::new().unwrap();

    lexidrill(dir.path())
        .args(["list", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

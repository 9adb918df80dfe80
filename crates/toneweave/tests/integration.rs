use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn tone_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("tone");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let samples = [
        r#"{"text": "ㅇㅋ 바로 갈게", "politeness": "CASUAL", "vibe": "PLAYFUL"}"#,
        r#"{"text": "오늘은 좀 힘들 듯", "politeness": "CASUAL", "vibe": "PLAYFUL"}"#,
        r#"{"text": "넵 확인했습니다", "politeness": "POLITE", "vibe": "CALM"}"#,
    ];
    fs::write(root.join("samples.jsonl"), samples.join("\n")).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/tone.sqlite"

[retrieval]
final_k = 15
over_fetch_factor = 10
mmr_lambda = 0.9
"#,
        root.display()
    );

    let config_path = config_dir.join("tone.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_tone(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = tone_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run tone binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_tone(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_tone(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_tone(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_import_creates_user_and_samples() {
    let (tmp, config_path) = setup_test_env();
    let samples = tmp.path().join("samples.jsonl");

    run_tone(&config_path, &["init"]);
    let (stdout, stderr, success) = run_tone(
        &config_path,
        &[
            "import",
            samples.to_str().unwrap(),
            "--user",
            "alice",
            "--user-name",
            "Alice",
        ],
    );
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("inserted: 3"));

    let (stdout, _, _) = run_tone(&config_path, &["stats"]);
    assert!(stdout.contains("Users:          1"));
    assert!(stdout.contains("Tone samples:   3"));
    assert!(stdout.contains("Embedded:       0 / 3"));
}

#[test]
fn test_import_skips_duplicates() {
    let (tmp, config_path) = setup_test_env();
    let samples = tmp.path().join("samples.jsonl");

    run_tone(&config_path, &["init"]);
    let (stdout1, _, _) = run_tone(
        &config_path,
        &["import", samples.to_str().unwrap(), "--user", "alice"],
    );
    assert!(stdout1.contains("inserted: 3"));

    let (stdout2, _, success) = run_tone(
        &config_path,
        &["import", samples.to_str().unwrap(), "--user", "alice"],
    );
    assert!(success);
    assert!(stdout2.contains("inserted: 0"));
    assert!(stdout2.contains("skipped (duplicates): 3"));
}

#[test]
fn test_import_same_text_different_users_kept() {
    let (tmp, config_path) = setup_test_env();
    let samples = tmp.path().join("samples.jsonl");

    run_tone(&config_path, &["init"]);
    run_tone(
        &config_path,
        &["import", samples.to_str().unwrap(), "--user", "alice"],
    );
    let (stdout, _, _) = run_tone(
        &config_path,
        &["import", samples.to_str().unwrap(), "--user", "minsu"],
    );
    assert!(stdout.contains("inserted: 3"));
}

#[test]
fn test_embed_requires_provider() {
    let (_tmp, config_path) = setup_test_env();

    run_tone(&config_path, &["init"]);
    let (_, stderr, success) = run_tone(&config_path, &["embed", "pending"]);
    assert!(!success);
    assert!(stderr.contains("disabled"));
}

#[test]
fn test_style_set_show_clear() {
    let (tmp, config_path) = setup_test_env();
    let samples = tmp.path().join("samples.jsonl");

    run_tone(&config_path, &["init"]);
    run_tone(
        &config_path,
        &["import", samples.to_str().unwrap(), "--user", "alice"],
    );

    let (_, _, success) = run_tone(
        &config_path,
        &["style", "set", "alice", "무조건 반말, 이모티콘 금지"],
    );
    assert!(success);

    let (stdout, _, _) = run_tone(&config_path, &["style", "show", "alice"]);
    assert!(stdout.contains("무조건 반말"));

    let (_, _, success) = run_tone(&config_path, &["style", "clear", "alice"]);
    assert!(success);

    let (stdout, _, _) = run_tone(&config_path, &["style", "show", "alice"]);
    assert!(stdout.contains("no custom guidelines"));
}

#[test]
fn test_style_requires_existing_user() {
    let (_tmp, config_path) = setup_test_env();

    run_tone(&config_path, &["init"]);
    let (_, stderr, success) = run_tone(&config_path, &["style", "set", "nobody", "짧게 답해"]);
    assert!(!success);
    assert!(stderr.contains("user not found"));
}

#[test]
fn test_relate_validates_tags() {
    let (tmp, config_path) = setup_test_env();
    let samples = tmp.path().join("samples.jsonl");

    run_tone(&config_path, &["init"]);
    run_tone(
        &config_path,
        &["import", samples.to_str().unwrap(), "--user", "alice"],
    );
    run_tone(&config_path, &["partner", "add", "Bob", "--id", "bob"]);

    let (_, stderr, success) = run_tone(
        &config_path,
        &["relate", "alice", "bob", "--category", "BESTIE"],
    );
    assert!(!success);
    assert!(stderr.contains("Unknown relationship category"));

    let (stdout, _, success) = run_tone(
        &config_path,
        &[
            "relate",
            "alice",
            "bob",
            "--category",
            "FRIEND_CLOSE",
            "--politeness",
            "CASUAL",
            "--vibe",
            "PLAYFUL",
        ],
    );
    assert!(success);
    assert!(stdout.contains("FRIEND_CLOSE"));
}

#[test]
fn test_reply_unknown_user_fails_fast() {
    let (_tmp, config_path) = setup_test_env();

    run_tone(&config_path, &["init"]);
    // Providers are disabled, but the identity check happens first: no
    // embedding or generation call is attempted.
    let (_, stderr, success) = run_tone(
        &config_path,
        &["reply", "dual", "주말에 봐?", "--user", "ghost", "--partner", "bob"],
    );
    assert!(!success);
    assert!(stderr.contains("user not found"));
}

#[test]
fn test_reply_needs_embedding_provider_after_identity_check() {
    let (tmp, config_path) = setup_test_env();
    let samples = tmp.path().join("samples.jsonl");

    run_tone(&config_path, &["init"]);
    run_tone(
        &config_path,
        &["import", samples.to_str().unwrap(), "--user", "alice"],
    );
    run_tone(&config_path, &["partner", "add", "Bob", "--id", "bob"]);

    let (_, stderr, success) = run_tone(
        &config_path,
        &["reply", "dual", "주말에 봐?", "--user", "alice", "--partner", "bob"],
    );
    assert!(!success);
    assert!(stderr.contains("disabled"));
}

#[test]
fn test_rejects_invalid_config() {
    let (tmp, config_path) = setup_test_env();

    fs::write(
        &config_path,
        format!(
            "[db]\npath = \"{}/data/tone.sqlite\"\n[retrieval]\nmmr_lambda = 2.0\n",
            tmp.path().display()
        ),
    )
    .unwrap();

    let (_, stderr, success) = run_tone(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("mmr_lambda"));
}

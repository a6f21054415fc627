//! End-to-end tests for the `mdlab` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// A temp directory with a config file pointing every path inside it.
struct Env {
    dir: TempDir,
    config: PathBuf,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(
            &config,
            format!(
                "base_path = {:?}\ntemp_path = {:?}\n",
                dir.path().join("notes"),
                dir.path().join("tmp"),
            ),
        )
        .unwrap();
        Self { dir, config }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn mdlab(&self) -> Command {
        let mut cmd = Command::cargo_bin("mdlab").unwrap();
        cmd.arg("--config").arg(&self.config);
        cmd.env_remove("MDLAB_BASE_PATH")
            .env_remove("MDLAB_BASE_FILE")
            .env_remove("MDLAB_TEMP_PATH");
        cmd
    }
}

fn has_bash() -> bool {
    which_bash().is_some()
}

fn which_bash() -> Option<PathBuf> {
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join("bash"))
            .find(|candidate| candidate.is_file())
    })
}

// =============================================================================
// Document Commands
// =============================================================================

#[test]
fn test_list_shows_cells() {
    let env = Env::new();
    let doc = env.write("doc.md", "# Title\n\n```python :once\nprint(1)\n```\n");

    env.mdlab()
        .arg("list")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("prose"))
        .stdout(predicate::str::contains("python :once"));
}

#[test]
fn test_fmt_check_and_rewrite() {
    let env = Env::new();
    let doc = env.write("doc.md", "\n\n# Title\n\n```sh\nls\n```\n");

    env.mdlab()
        .args(["fmt", "--check"])
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in canonical form"));

    env.mdlab().arg("fmt").arg(&doc).assert().success();
    assert_eq!(fs::read_to_string(&doc).unwrap(), "# Title\n\n```sh\nls\n```\n");

    env.mdlab()
        .args(["fmt", "--check"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("is canonical"));
}

#[test]
fn test_run_writes_output_back() {
    if !has_bash() {
        return;
    }
    let env = Env::new();
    let doc = env.write("doc.md", "```sh\necho from-bash\n```\n");

    env.mdlab()
        .arg("run")
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("from-bash"));

    assert_eq!(
        fs::read_to_string(&doc).unwrap(),
        "```sh\necho from-bash\n```\n\n```text\nfrom-bash\n```\n"
    );
}

#[test]
fn test_run_dry_run_leaves_document_alone() {
    if !has_bash() {
        return;
    }
    let env = Env::new();
    let original = "Intro\n\n```sh\necho one\n```\n\n```sh\necho two\n```\n";
    let doc = env.write("doc.md", original);

    env.mdlab()
        .args(["run", "--dry-run", "--cell", "3"])
        .arg(&doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cell not found at position 3"));

    env.mdlab()
        .args(["run", "--dry-run", "--cell", "2"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(predicate::str::contains("two"))
        .stdout(predicate::str::contains("Dry run"));

    assert_eq!(fs::read_to_string(&doc).unwrap(), original);
}

#[test]
fn test_run_reports_failed_cells() {
    if !has_bash() {
        return;
    }
    let env = Env::new();
    let doc = env.write("doc.md", "```sh\nexit 4\n```\n");

    env.mdlab()
        .arg("run")
        .arg(&doc)
        .assert()
        .failure()
        .stdout(predicate::str::contains("exit code 4"))
        .stderr(predicate::str::contains("1 of 1 cells failed"));
}

#[test]
fn test_tag_sets_and_removes_directive() {
    let env = Env::new();
    let doc = env.write("doc.md", "Intro\n\n```python\nprint(1)\n```\n\n```text\n1\n```\n");

    env.mdlab()
        .args(["tag"])
        .arg(&doc)
        .args(["1", "create=helpers.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("create=helpers.py"));
    assert_eq!(
        fs::read_to_string(&doc).unwrap(),
        "Intro\n\n```python :create=helpers.py\nprint(1)\n```\n\n```text\n1\n```\n"
    );

    env.mdlab().arg("tag").arg(&doc).arg("1").assert().success();
    assert_eq!(
        fs::read_to_string(&doc).unwrap(),
        "Intro\n\n```python\nprint(1)\n```\n\n```text\n1\n```\n"
    );
}

#[test]
fn test_tag_rejects_prose_and_unknown_directives() {
    let env = Env::new();
    let original = "Intro\n\n```sh\nls\n```\n";
    let doc = env.write("doc.md", original);

    env.mdlab()
        .arg("tag")
        .arg(&doc)
        .args(["0", "skip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a code cell"));

    env.mdlab()
        .arg("tag")
        .arg(&doc)
        .args(["1", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown directive: sometimes"));

    assert_eq!(fs::read_to_string(&doc).unwrap(), original);
}

// =============================================================================
// Workspace Commands
// =============================================================================

#[test]
fn test_main_prints_entry_file() {
    let env = Env::new();

    env.mdlab()
        .args(["main", "python"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            env.path().join("tmp").join("python").join("mdlab.py").display().to_string(),
        ));
}

#[test]
fn test_main_jai_entry_file() {
    let env = Env::new();

    env.mdlab()
        .args(["main", "jai"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            env.path().join("tmp").join("jai").join("main.jai").display().to_string(),
        ));
}

#[test]
fn test_main_unsupported_language_has_hint() {
    let env = Env::new();

    env.mdlab()
        .args(["main", "haskell"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported language: haskell"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn test_clean_removes_workspace() {
    let env = Env::new();
    fs::create_dir_all(env.path().join("tmp/go")).unwrap();

    env.mdlab()
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));
    assert!(!env.path().join("tmp").exists());

    env.mdlab()
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to clean"));
}

#[test]
fn test_init_then_search() {
    let env = Env::new();

    env.mdlab()
        .arg("search")
        .arg("anything")
        .assert()
        .failure()
        .stderr(predicate::str::contains("mdlab init"));

    env.mdlab().arg("init").assert().success();
    assert!(env.path().join("notes/index.md").exists());

    env.mdlab()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    env.mdlab()
        .args(["search", "RUST IS WORKING"])
        .assert()
        .success()
        .stdout(predicate::str::contains("index.md"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let env = Env::new();

    Command::cargo_bin("mdlab")
        .unwrap()
        .arg("--config")
        .arg(env.path().join("absent.toml"))
        .arg("clean")
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.toml"));
}

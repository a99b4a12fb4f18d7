//! Integration tests for the tagtrail binary.
//!
//! These tests run the CLI against real git repositories and check its
//! output and exit status.

use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A repository with commits c0 - c1 - c2, rel-0.1 on c0 and rel-0.2 on c2,
/// plus an isolated home directory so no user configuration leaks in.
struct Fixture {
    repo: TempDir,
    home: TempDir,
    commits: Vec<String>,
}

impl Fixture {
    fn new() -> Self {
        let repo = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp dir");

        run_git(repo.path(), &["init", "-q", "-b", "main"]);
        run_git(repo.path(), &["config", "user.email", "test@example.com"]);
        run_git(repo.path(), &["config", "user.name", "Test User"]);
        run_git(repo.path(), &["config", "commit.gpgsign", "false"]);

        let mut commits = Vec::new();
        for i in 0..3 {
            let name = format!("c{}", i);
            std::fs::write(repo.path().join(&name), &name).unwrap();
            run_git(repo.path(), &["add", "."]);
            run_git(repo.path(), &["commit", "-q", "-m", &name]);
            commits.push(head(repo.path()));
        }
        run_git(repo.path(), &["tag", "rel-0.1", &commits[0]]);
        run_git(repo.path(), &["tag", "rel-0.2", &commits[2]]);
        run_git(repo.path(), &["tag", "foo-2", &commits[1]]);

        Self {
            repo,
            home,
            commits,
        }
    }

    /// A tagtrail command pointed at the fixture repository.
    fn tagtrail(&self) -> Command {
        let mut cmd = Command::cargo_bin("tagtrail").unwrap();
        cmd.arg("--repo")
            .arg(self.repo.path())
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path())
            .env_remove("TAGTRAIL_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }

    fn write_repo_config(&self, contents: &str) {
        let dir = self.repo.path().join(".git/tagtrail");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), contents).unwrap();
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn head(dir: &Path) -> String {
    let output = StdCommand::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output()
        .expect("git rev-parse failed");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn help_and_version() {
    let f = Fixture::new();
    f.tagtrail()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("follows"));
    f.tagtrail()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tagtrail"));
}

#[test]
fn follows_prints_tag_and_distance() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["follows", &f.commits[1]])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("rel-0.1 +1"));
}

#[test]
fn follows_accepts_revision_names() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["follows", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("rel-0.1 +2"));
}

#[test]
fn follows_json() {
    let f = Fixture::new();
    let output = f
        .tagtrail()
        .args(["--json", "follows", &f.commits[2]])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["base_tag"], "rel-0.1");
    assert_eq!(value["tag_sha"], f.commits[0].as_str());
    assert_eq!(value["count"], 2);
}

#[test]
fn precedes_absent_exits_zero_with_note() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["precedes", &f.commits[2]])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no tag matching 'rel-*' precedes"));
}

#[test]
fn quiet_silences_absence_note() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["-q", "precedes", &f.commits[2]])
        .env("RUST_LOG", "off")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn unknown_revision_is_absent() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["follows", "no-such-branch"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("'no-such-branch' does not name a commit"));
}

#[test]
fn precedes_json_absent_is_null() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["--json", "precedes", &f.commits[2]])
        .assert()
        .success()
        .stdout("null\n");
}

#[test]
fn tags_respects_pattern() {
    let f = Fixture::new();
    f.tagtrail()
        .arg("tags")
        .assert()
        .success()
        .stdout(predicate::str::contains("rel-0.1"))
        .stdout(predicate::str::contains("rel-0.2"))
        .stdout(predicate::str::contains("foo-2").not());

    f.tagtrail()
        .args(["--tag-pattern", "foo-*", "tags"])
        .assert()
        .success()
        .stdout(predicate::str::contains("foo-2"))
        .stdout(predicate::str::contains("rel-0.1").not());
}

#[test]
fn repo_config_sets_pattern() {
    let f = Fixture::new();
    f.write_repo_config("tag_pattern = \"foo-*\"\n");
    f.tagtrail()
        .args(["follows", &f.commits[2]])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("foo-2 +1"));
}

#[test]
fn invalid_config_fails() {
    let f = Fixture::new();
    f.write_repo_config("no_such_key = 1\n");
    f.tagtrail()
        .arg("tags")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn topo_lists_oldest_first() {
    let f = Fixture::new();
    let expected = format!("{}\n", f.commits.join("\n"));
    f.tagtrail()
        .arg("topo")
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn is_ancestor_answers() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["is-ancestor", &f.commits[0], &f.commits[2]])
        .assert()
        .success()
        .stdout("true\n");
    f.tagtrail()
        .args(["is-ancestor", &f.commits[2], &f.commits[0]])
        .assert()
        .success()
        .stdout("false\n");
}

#[test]
fn describe_and_parse_describe() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["describe", &f.commits[1]])
        .assert()
        .success()
        .stdout("rel-0.1 (+1)\n");

    f.tagtrail()
        .args(["parse-describe", "rel-2-5-7-1-gabc1234"])
        .assert()
        .success()
        .stdout("rel-2-5-7 (+1)\n");

    f.tagtrail()
        .args(["parse-describe", "rel-1 2"])
        .assert()
        .failure();
}

#[test]
fn graph_shows_neighbours() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["graph", &f.commits[1]])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("parents:  {}", f.commits[0])))
        .stdout(predicate::str::contains(format!("children: {}", f.commits[2])));
}

#[test]
fn suggest_sources() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["suggest", &f.commits[1]])
        .assert()
        .success()
        .stdout("rel-0.2 (from precedes)\n");
    f.tagtrail()
        .args(["suggest", &f.commits[0]])
        .assert()
        .success()
        .stdout("rel-0.1 (from tag)\n");
    f.tagtrail()
        .args(["suggest", &f.commits[1], "--current", "rel-9"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn show_bundles_context() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["show", &f.commits[1]])
        .assert()
        .success()
        .stdout(predicate::str::contains("follows    rel-0.1 +1"))
        .stdout(predicate::str::contains("precedes   rel-0.2"))
        .stdout(predicate::str::contains("describe   rel-0.1 (+1)"))
        .stdout(predicate::str::contains("suggested  rel-0.2 (from precedes)"));
}

#[test]
fn libgit2_backend_agrees() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["--backend", "libgit2", "follows", &f.commits[2]])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("rel-0.1 +2"));
}

#[test]
fn stats_go_to_stderr() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["--stats", "--stats-sort", "count", "follows", &f.commits[1]])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("rel-0.1"))
        .stderr(predicate::str::contains("git for-each-ref"))
        .stderr(predicate::str::contains("git rev-list --topo-order"));
}

#[test]
fn not_a_repository_fails() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("tagtrail")
        .unwrap()
        .args(["--repo"])
        .arg(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env_remove("TAGTRAIL_CONFIG")
        .arg("topo")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not a git repository"));
}

#[test]
fn completion_script() {
    let f = Fixture::new();
    f.tagtrail()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tagtrail"));
}

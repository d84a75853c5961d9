use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write");
}

fn ligi(cwd: &Path, home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ligi");
    cmd.current_dir(cwd).env("LIGI_HOME", home);
    cmd
}

#[test]
fn indexing_one_repo_keeps_the_others_in_global() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let repo_a = tmp.path().join("a");
    let repo_b = tmp.path().join("b");
    write(&repo_a.join("art/one.md"), "[[t/shared]]");
    write(&repo_b.join("art/two.md"), "[[t/shared]]");

    ligi(&repo_b, &home).arg("index").assert().success();
    ligi(&repo_a, &home).arg("index").assert().success();
    write(&repo_a.join("art/one.md"), "nothing here");
    ligi(&repo_a, &home).arg("index").assert().success();

    let page = fs::read_to_string(home.join("art/index/tags/shared.md")).expect("global page");
    let canon_a = fs::canonicalize(&repo_a).expect("canon a");
    let canon_b = fs::canonicalize(&repo_b).expect("canon b");
    assert!(page.contains(&canon_b.join("art/two.md").display().to_string()));
    assert!(!page.contains(&canon_a.join("art/one.md").display().to_string()));
}

#[test]
fn global_merge_can_be_disabled() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let repo = tmp.path().join("repo");
    write(&repo.join("art/one.md"), "[[t/alpha]]");

    ligi(&repo, &home)
        .env("LIGI_GLOBAL_ENABLED", "false")
        .arg("index")
        .assert()
        .success();
    assert!(!home.join("art/index/ligi_tags.md").exists());
}

#[test]
fn rebuild_global_reports_counts_and_skips_missing_repos() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let repo_a = tmp.path().join("a");
    write(&repo_a.join("art/one.md"), "[[t/alpha]] [[t/beta]]");
    write(&repo_a.join("art/two.md"), "[[t/beta]]");

    ligi(tmp.path(), &home)
        .arg("rebuild-global")
        .arg("--repo")
        .arg(&repo_a)
        .arg("--repo")
        .arg(tmp.path().join("missing"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "repos_indexed=1 repos_skipped=1 tags=2 files=2",
        ))
        .stderr(predicate::str::contains("LIGI_WARN code=REPO_SKIPPED"));

    assert!(repo_a.join("art/index/ligi_tags.md").exists());
    let master = fs::read_to_string(home.join("art/index/ligi_tags.md")).expect("master");
    assert!(master.contains("- [alpha](tags/alpha.md)"));

    let audit = fs::read_to_string(home.join("logs/audit.log")).expect("audit log");
    assert!(audit.contains("\"phase\":\"rebuild-global\""));
}

#[test]
fn rebuild_global_can_skip_local_indexes() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("home");
    let repo = tmp.path().join("repo");
    write(&repo.join("art/one.md"), "[[t/alpha]]");

    ligi(tmp.path(), &home)
        .arg("rebuild-global")
        .arg("--repo")
        .arg(&repo)
        .arg("--no-local")
        .assert()
        .success();

    assert!(!repo.join("art/index").exists());
    assert!(home.join("art/index/tags/alpha.md").exists());
}

use assert_cmd::Command;
use predicates::str::{contains, is_empty};
use tempfile::TempDir;

fn dbgp_bp(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dbgp-bp").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

// `dbgp-bp` with no args should exit with a non-zero code.
#[test]
fn cli_no_args() {
    let temp_dir = TempDir::new().unwrap();
    dbgp_bp(&temp_dir).assert().failure();
}

#[test]
fn cli_version() {
    let temp_dir = TempDir::new().unwrap();
    dbgp_bp(&temp_dir)
        .arg("-V")
        .assert()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_add_then_list() {
    let temp_dir = TempDir::new().unwrap();
    dbgp_bp(&temp_dir)
        .args(["add", "index.php", "12"])
        .assert()
        .success()
        .stdout("line:index.php:12\n");
    dbgp_bp(&temp_dir)
        .args(["call", "checkout"])
        .assert()
        .success()
        .stdout("call:checkout\n");
    dbgp_bp(&temp_dir)
        .args(["add", "cart.php", "3", "--disabled"])
        .assert()
        .success();

    dbgp_bp(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout("call:checkout\nline:cart.php:3 (disabled)\nline:index.php:12\n");
}

#[test]
fn cli_add_line_zero() {
    let temp_dir = TempDir::new().unwrap();
    dbgp_bp(&temp_dir)
        .args(["add", "index.php", "0"])
        .assert()
        .failure()
        .stderr(contains("Lines start at 1"));
}

#[test]
fn cli_rm() {
    let temp_dir = TempDir::new().unwrap();
    dbgp_bp(&temp_dir)
        .args(["exception", "LogicException"])
        .assert()
        .success();
    dbgp_bp(&temp_dir)
        .args(["rm", "exception:LogicException"])
        .assert()
        .success()
        .stdout(is_empty());
    dbgp_bp(&temp_dir)
        .args(["rm", "exception:LogicException"])
        .assert()
        .failure()
        .stdout(contains("Breakpoint not found"));
    dbgp_bp(&temp_dir).arg("list").assert().success().stdout(is_empty());
}

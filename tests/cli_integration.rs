//! CLI Integration Tests
//!
//! Tests the command-line interface end-to-end.

use std::os::unix::fs::PermissionsExt;

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Get the binary to test, isolated from the user's global config.
fn itamae(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("itamae").unwrap();
    cmd.current_dir(home.path())
        .env("XDG_CONFIG_HOME", home.child("xdg").path())
        .env_remove("RUST_LOG");
    cmd
}

/// Write `.itamae.toml` into the working directory.
fn write_config(home: &TempDir, body: &str) {
    home.child(".itamae.toml").write_str(body).unwrap();
}

/// A package manager stand-in that records its arguments.
fn fake_package_manager(home: &TempDir) -> std::path::PathBuf {
    let pm = home.child("fake-pm");
    let record = home.child("pm-calls.txt");
    pm.write_str(&format!("#!/bin/sh\necho \"$@\" >> '{}'\nexit 0\n", record.path().display()))
        .unwrap();
    std::fs::set_permissions(pm.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
    pm.path().to_path_buf()
}

// ============================================================================
// Help & Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    itamae(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("shell-script plugins"));
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    itamae(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_subcommand_required() {
    let home = TempDir::new().unwrap();
    itamae(&home).assert().failure().stderr(predicate::str::contains("Usage:"));
}

// ============================================================================
// List Command Tests
// ============================================================================

#[test]
fn test_list_bundled_core() {
    let home = TempDir::new().unwrap();
    itamae(&home)
        .args(["list", "--category", "core"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(git)"))
        .stdout(predicate::str::contains("Total:"));
}

#[test]
fn test_list_json() {
    let home = TempDir::new().unwrap();
    let output = itamae(&home).args(["list", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert!(rows.iter().any(|r| r["id"] == "git" && r["install_method"] == "package-manager"));
    assert!(rows.iter().any(|r| r["category"] == "unverified"));
}

#[test]
fn test_list_unknown_category_fails() {
    let home = TempDir::new().unwrap();
    itamae(&home)
        .args(["list", "--category", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_list_custom_scripts_dir() {
    let home = TempDir::new().unwrap();
    home.child("scripts/tools/hello.sh")
        .write_str("#!/bin/bash\n# NAME: Hello\n# DESCRIPTION: Says hello\n# INSTALL_METHOD: binary\n")
        .unwrap();
    write_config(
        &home,
        &format!("[plugins]\nscripts_dir = \"{}\"\n", home.child("scripts").path().display()),
    );

    itamae(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello (hello) - Says hello"))
        .stdout(predicate::str::contains("(git)").not());
}

#[test]
fn test_list_rejects_invalid_plugin() {
    let home = TempDir::new().unwrap();
    home.child("scripts/tools/broken.sh")
        .write_str("#!/bin/bash\n# NAME: Broken\n# INSTALL_METHOD: package-manager\n")
        .unwrap();
    write_config(
        &home,
        &format!("[plugins]\nscripts_dir = \"{}\"\n", home.child("scripts").path().display()),
    );

    itamae(&home)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PACKAGE_NAME"));
}

// ============================================================================
// Config & Logs Tests
// ============================================================================

#[test]
fn test_config_path_prefers_local_file() {
    let home = TempDir::new().unwrap();
    write_config(&home, "[ui]\ndashboard = false\n");
    itamae(&home)
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".itamae.toml"));
}

#[test]
fn test_config_prints_defaults() {
    let home = TempDir::new().unwrap();
    itamae(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[general]"))
        .stdout(predicate::str::contains("tokyo-night"));
}

#[test]
fn test_invalid_config_fails() {
    let home = TempDir::new().unwrap();
    write_config(&home, "[general\n");
    itamae(&home)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn test_logs_empty_dir() {
    let home = TempDir::new().unwrap();
    write_config(&home, &format!("[logging]\ndir = \"{}\"\n", home.child("logs").path().display()));
    itamae(&home).arg("logs").assert().success().stdout(predicate::str::contains("No logs"));
}

#[test]
fn test_logs_latest_prints_content() {
    let home = TempDir::new().unwrap();
    home.child("logs/itamae-install-2026-01-01_10-00-00.log")
        .write_str("=== Itamae Installation Log ===\nhello\n")
        .unwrap();
    write_config(&home, &format!("[logging]\ndir = \"{}\"\n", home.child("logs").path().display()));

    itamae(&home)
        .args(["logs", "--latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    itamae(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("itamae"));
}

// ============================================================================
// Install & Uninstall Tests
// ============================================================================

/// Scripts directory with one batched and one individual plugin.
fn install_fixture(home: &TempDir) {
    let marker = home.child("installed");
    home.child("scripts/tools/alpha.sh")
        .write_str(
            "#!/bin/bash\n# NAME: Alpha\n# INSTALL_METHOD: package-manager\n# PACKAGE_NAME: alpha-pkg\n\
             case \"$1\" in check) exit 1 ;; esac\n",
        )
        .unwrap();
    home.child("scripts/tools/beta.sh")
        .write_str(&format!(
            "#!/bin/bash\n# NAME: Beta\n# INSTALL_METHOD: binary\n\
             # REQUIRES: BETA_TOKEN|Token for beta|\n\
             case \"$1\" in\n\
               install) echo \"installing $BETA_TOKEN\"; touch '{marker}' ;;\n\
               check) test -e '{marker}' ;;\n\
               remove) rm -f '{marker}' ;;\n\
             esac\n",
            marker = marker.path().display()
        ))
        .unwrap();

    let pm = fake_package_manager(home);
    write_config(
        home,
        &format!(
            "[general]\nuse_sudo = false\npackage_manager = \"{}\"\nauto_install_categories = [\"tools\"]\n\n\
             [plugins]\nscripts_dir = \"{}\"\n\n[logging]\ndir = \"{}\"\n",
            pm.display(),
            home.child("scripts").path().display(),
            home.child("logs").path().display()
        ),
    );
}

#[test]
fn test_install_without_confirmation_needs_yes() {
    let home = TempDir::new().unwrap();
    install_fixture(&home);
    itamae(&home)
        .args(["install", "--category", "tools", "--no-tui"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    home.child("pm-calls.txt").assert(predicate::path::missing());
}

#[test]
fn test_install_missing_input_fails() {
    let home = TempDir::new().unwrap();
    install_fixture(&home);
    itamae(&home)
        .args(["install", "--category", "tools", "--yes", "--no-tui"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BETA_TOKEN"));
}

#[test]
fn test_install_runs_plan() {
    let home = TempDir::new().unwrap();
    install_fixture(&home);

    itamae(&home)
        .args(["install", "--category", "tools", "--yes", "--no-tui", "--set", "BETA_TOKEN=s3cret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installation plan"))
        .stdout(predicate::str::contains("installing s3cret"))
        .stdout(predicate::str::contains("Successful (2)"));

    home.child("installed").assert(predicate::path::exists());
    // No repository hooks, so the index is not refreshed.
    home.child("pm-calls.txt").assert(predicate::str::contains("install -y alpha-pkg"));
    home.child("pm-calls.txt").assert(predicate::str::contains("update").not());

    let logs: Vec<_> = std::fs::read_dir(home.child("logs").path()).unwrap().collect();
    assert!(!logs.is_empty());
}

#[test]
fn test_install_failure_exits_nonzero() {
    let home = TempDir::new().unwrap();
    install_fixture(&home);
    home.child("scripts/tools/gamma.sh")
        .write_str("#!/bin/bash\n# NAME: Gamma\n# INSTALL_METHOD: manual\necho boom >&2\nexit 3\n")
        .unwrap();

    itamae(&home)
        .args(["install", "--category", "tools", "--yes", "--no-tui", "--set", "BETA_TOKEN=x"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Gamma: boom"));
}

#[test]
fn test_uninstall_skips_not_installed() {
    let home = TempDir::new().unwrap();
    install_fixture(&home);
    home.child("installed").touch().unwrap();

    itamae(&home)
        .args(["uninstall", "--category", "tools"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alpha not installed"))
        .stdout(predicate::str::contains("Beta removed"));

    home.child("installed").assert(predicate::path::missing());
}

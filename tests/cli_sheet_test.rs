//! Integration tests for config sheet operations via CLI.
//!
//! Covers `rig sheet create/list/show/set/unset/export/delete`, value
//! validation against schemas, masking, dotenv/JSON import and export.

use predicates::prelude::*;

mod common;
use common::TestEnv;

fn with_web_schema() -> TestEnv {
    let env = TestEnv::init();
    env.rig()
        .args([
            "schema",
            "create",
            "web",
            "-v",
            "PORT:number::yes:8080",
            "-v",
            "DEBUG:boolean",
        ])
        .assert()
        .success();
    env
}

// === Create Tests ===

#[test]
fn test_sheet_create_with_values() {
    let env = with_web_schema();

    env.rig()
        .args([
            "sheet", "create", "prod", "-s", "web", "-v", "PORT=9090", "-v", "DEBUG=true",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\":\"prod\""))
        .stdout(predicate::str::contains("\"PORT\":\"9090\""));
}

#[test]
fn test_sheet_create_rejects_invalid_value() {
    let env = with_web_schema();

    env.rig()
        .args(["sheet", "create", "prod", "-s", "web", "-v", "PORT=banana"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PORT"));
}

#[test]
fn test_sheet_create_requires_name() {
    let env = TestEnv::init();

    env.rig()
        .args(["sheet", "create"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sheet name"));
}

#[test]
fn test_sheet_create_import_env_file() {
    let env = TestEnv::init();
    let import = env.path().join("base.env");
    std::fs::write(&import, "# defaults\nHOST=localhost\nPORT=8080\n").unwrap();

    env.rig()
        .args(["sheet", "create", "prod", "--import-env"])
        .arg(&import)
        .args(["-v", "PORT=9090"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"HOST\":\"localhost\""))
        .stdout(predicate::str::contains("\"PORT\":\"9090\""));
}

#[test]
fn test_sheet_create_import_json_file() {
    let env = TestEnv::init();
    let import = env.path().join("base.json");
    std::fs::write(&import, r#"{"PORT": 8080, "DEBUG": true}"#).unwrap();

    env.rig()
        .args(["sheet", "create", "prod", "--import-json"])
        .arg(&import)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"PORT\":\"8080\""))
        .stdout(predicate::str::contains("\"DEBUG\":\"true\""));
}

// === Show and Masking Tests ===

#[test]
fn test_sheet_show_masks_secrets() {
    let env = TestEnv::init();
    env.rig()
        .args(["sheet", "create", "prod", "-v", "DB_PASSWORD=supersecretvalue"])
        .assert()
        .success();

    env.rig()
        .args(["sheet", "show", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("supersecretvalue").not());

    env.rig()
        .args(["sheet", "show", "prod", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("supersecretvalue"));
}

#[test]
fn test_sheet_show_resolved_merges_extends() {
    let env = TestEnv::init();
    env.rig()
        .args(["sheet", "create", "defaults", "-v", "HOST=localhost"])
        .assert()
        .success();
    env.rig()
        .args(["sheet", "create", "prod", "--extends", "defaults", "-v", "PORT=9090"])
        .assert()
        .success();

    env.rig()
        .args(["sheet", "show", "prod", "--resolved"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"resolved\":"))
        .stdout(predicate::str::contains("\"HOST\":\"localhost\""));
}

// === Set and Unset Tests ===

#[test]
fn test_sheet_set_and_unset() {
    let env = with_web_schema();
    env.rig()
        .args(["sheet", "create", "prod", "-s", "web"])
        .assert()
        .success();

    env.rig()
        .args(["sheet", "set", "prod", "PORT=9090", "EXTRA=x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"PORT\":\"9090\""));

    env.rig()
        .args(["sheet", "set", "prod", "PORT=banana"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PORT"));

    env.rig()
        .args(["sheet", "unset", "prod", "EXTRA", "GHOST"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\":[\"EXTRA\"]"))
        .stdout(predicate::str::contains("\"not_present\":[\"GHOST\"]"));
}

#[test]
fn test_sheet_set_requires_pairs() {
    let env = TestEnv::init();
    env.rig().args(["sheet", "create", "prod"]).assert().success();

    env.rig().args(["sheet", "set", "prod"]).assert().failure();
}

// === Export Tests ===

#[test]
fn test_sheet_export_dotenv_stdout() {
    let env = with_web_schema();
    env.rig()
        .args([
            "sheet", "create", "prod", "-s", "web", "-v", "PORT=9090", "-v", "SECRET=top secret",
        ])
        .assert()
        .success();

    env.rig()
        .args(["-H", "sheet", "export", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Generated by rig"))
        .stdout(predicate::str::contains("PORT=9090"))
        .stdout(predicate::str::contains("SECRET=\"top secret\""));
}

#[test]
fn test_sheet_export_json_to_file() {
    let env = TestEnv::init();
    env.rig()
        .args(["sheet", "create", "prod", "-v", "PORT=8080"])
        .assert()
        .success();

    let target = env.path().join("prod.json");
    env.rig()
        .args(["sheet", "export", "prod", "-f", "json", "-o"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"output\":"));

    let written = std::fs::read_to_string(&target).unwrap();
    assert!(written.contains("\"PORT\": \"8080\""));
}

#[test]
fn test_sheet_export_fails_on_missing_required() {
    let env = TestEnv::init();
    env.rig()
        .args(["schema", "create", "strict", "-v", "TOKEN:string::yes"])
        .assert()
        .success();
    env.rig()
        .args(["sheet", "create", "prod", "-s", "strict"])
        .assert()
        .success();

    env.rig()
        .args(["sheet", "export", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TOKEN"));
}

#[test]
fn test_sheet_export_unknown_format() {
    let env = TestEnv::init();
    env.rig().args(["sheet", "create", "prod"]).assert().success();

    env.rig()
        .args(["sheet", "export", "prod", "-f", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown export format"));
}

// === Delete Tests ===

#[test]
fn test_sheet_delete() {
    let env = TestEnv::init();
    env.rig().args(["sheet", "create", "prod"]).assert().success();

    env.rig()
        .args(["sheet", "delete", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"deleted\":true"));

    env.rig().args(["sheet", "show", "prod"]).assert().failure();
}

#[test]
fn test_sheet_list_filters_by_project() {
    let env = TestEnv::init();
    env.rig()
        .args(["project", "create", "shop"])
        .assert()
        .success();
    env.rig()
        .args(["sheet", "create", "-p", "shop", "-e", "prod"])
        .assert()
        .success();
    env.rig()
        .args(["sheet", "create", "standalone"])
        .assert()
        .success();

    env.rig()
        .args(["sheet", "list", "-p", "shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\":1"))
        .stdout(predicate::str::contains("shop-prod"));

    env.rig()
        .args(["sheet", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\":2"));
}

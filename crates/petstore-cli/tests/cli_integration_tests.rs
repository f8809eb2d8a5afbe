//! CLI integration tests for petstore
//!
//! Tests the petstore CLI commands end-to-end using assert_cmd. Every test
//! gets its own config directory and database file.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const ADMIN: &str = "admin";
const ADMIN_PASSWORD: &str = "changeme";

/// A scratch store directory
struct Store {
    dir: TempDir,
}

impl Store {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Store with an administrator already created
    fn initialized() -> Self {
        let store = Self::new();
        store
            .cmd()
            .args(["init", "--admin", ADMIN, "--admin-password", ADMIN_PASSWORD])
            .assert()
            .success();
        store
    }

    /// Anonymous command against this store
    #[allow(deprecated)]
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("petstore").unwrap();
        cmd.env("PETSTORE_CONFIG_DIR", self.dir.path().join("config"))
            .env_remove("PETSTORE_USER")
            .env_remove("PETSTORE_PASSWORD")
            .env_remove("RUST_LOG")
            .arg("--database")
            .arg(self.dir.path().join("petstore.db"));
        cmd
    }

    fn as_user(&self, login: &str, password: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.args(["--user", login, "--password", password]);
        cmd
    }

    fn as_admin(&self) -> Command {
        self.as_user(ADMIN, ADMIN_PASSWORD)
    }

    /// Run a command with `--format json` and parse its output
    fn json(mut cmd: Command, args: &[&str]) -> Value {
        let output = cmd.args(["--format", "json"]).args(args).output().unwrap();
        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    /// Register an owner with a login, returning its ID
    fn owner(&self, name: &str, login: &str) -> i64 {
        let owner = Self::json(
            self.as_admin(),
            &[
                "owners",
                "register",
                name,
                "--login",
                login,
                "--owner-password",
                "secret1",
            ],
        );
        owner["id"].as_i64().unwrap()
    }

    /// Register a dog, returning its ID
    fn pet(&self, name: &str) -> i64 {
        let pet = Self::json(
            self.as_admin(),
            &["pets", "add", name, "--species", "dog", "--birth", "2020-04-12"],
        );
        pet["id"].as_i64().unwrap()
    }
}

#[test]
fn test_help_command() {
    Store::new()
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("adopt"))
        .stdout(predicate::str::contains("owners"));
}

#[test]
fn test_version_output() {
    Store::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("petstore"));
}

#[test]
fn test_init_creates_administrator() {
    let store = Store::new();
    store
        .cmd()
        .args(["init", "--admin", ADMIN, "--admin-password", ADMIN_PASSWORD])
        .assert()
        .success()
        .stdout(predicate::str::contains("Store initialized"));

    assert!(store.dir.path().join("petstore.db").exists());

    store
        .as_admin()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("admin (admin)"));
}

#[test]
fn test_init_twice_is_validation_error() {
    let store = Store::initialized();
    store
        .cmd()
        .args(["init", "--admin", ADMIN, "--admin-password", ADMIN_PASSWORD])
        .assert()
        .code(2);
}

#[test]
fn test_wrong_password_exits_with_authorization_code() {
    let store = Store::initialized();
    store
        .as_user(ADMIN, "not-the-password")
        .arg("whoami")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("invalid login or password"));
}

#[test]
fn test_anonymous_denied() {
    let store = Store::initialized();
    store.cmd().args(["pets", "list"]).assert().code(5);
}

#[test]
fn test_credentials_from_environment() {
    let store = Store::initialized();
    store
        .cmd()
        .env("PETSTORE_USER", ADMIN)
        .env("PETSTORE_PASSWORD", ADMIN_PASSWORD)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("admin"));
}

#[test]
fn test_adoption_workflow() {
    let store = Store::initialized();
    let jane = store.owner("Jane Doe", "jane");
    let rex = store.pet("Rex");
    let rex_id = rex.to_string();

    // Jane reserves Rex for herself
    store
        .as_user("jane", "secret1")
        .args(["adopt", "start", &rex_id])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("reserved for owner {}", jane)));

    // Only the administrator can finish it
    store
        .as_user("jane", "secret1")
        .args(["adopt", "finish", &rex_id])
        .assert()
        .code(5);

    let record = Store::json(store.as_admin(), &["adopt", "finish", &rex_id]);
    assert_eq!(record["pet_id"].as_i64(), Some(rex));
    assert_eq!(record["owner_id"].as_i64(), Some(jane));

    let pet = Store::json(store.as_user("jane", "secret1"), &["pets", "show", &rex_id]);
    assert_eq!(pet["status"], "adopted");
    assert_eq!(pet["owner_id"].as_i64(), Some(jane));

    // A second finish is rejected
    store
        .as_admin()
        .args(["adopt", "finish", &rex_id])
        .assert()
        .code(4);

    let records = Store::json(
        store.as_user("jane", "secret1"),
        &["adopt", "records", "--owner", &jane.to_string()],
    );
    assert_eq!(records.as_array().unwrap().len(), 1);

    let history = Store::json(store.as_admin(), &["pets", "history", &rex_id]);
    let types: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert_eq!(types.len(), 3);
}

#[test]
fn test_cancel_adoption() {
    let store = Store::initialized();
    let jane = store.owner("Jane Doe", "jane");
    let rex = store.pet("Rex").to_string();

    store
        .as_admin()
        .args(["adopt", "start", &rex, "--owner", &jane.to_string()])
        .assert()
        .success();

    store
        .as_user("jane", "secret1")
        .args(["adopt", "cancel", &rex])
        .assert()
        .success()
        .stdout(predicate::str::contains("available again"));

    let available = Store::json(store.as_admin(), &["pets", "available"]);
    assert_eq!(available.as_array().unwrap().len(), 1);
}

#[test]
fn test_admin_must_name_the_adopting_owner() {
    let store = Store::initialized();
    let rex = store.pet("Rex").to_string();

    store
        .as_admin()
        .args(["adopt", "start", &rex])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_pet_is_not_found() {
    let store = Store::initialized();
    store
        .as_admin()
        .args(["pets", "show", "404"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("404"));
}

#[test]
fn test_future_birth_date_is_validation_error() {
    let store = Store::initialized();
    store
        .as_admin()
        .args(["pets", "add", "Rex", "--species", "dog", "--birth", "2999-01-01"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_species_rejected_by_parser() {
    let store = Store::initialized();
    store
        .as_admin()
        .args(["pets", "add", "Puff", "--species", "dragon", "--birth", "2020-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown species"));
}

#[test]
fn test_remove_owner_with_pets_is_invalid_state() {
    let store = Store::initialized();
    let jane = store.owner("Jane Doe", "jane").to_string();
    let rex = store.pet("Rex").to_string();

    store
        .as_admin()
        .args(["adopt", "start", &rex, "--owner", &jane])
        .assert()
        .success();

    store
        .as_admin()
        .args(["owners", "remove", &jane])
        .assert()
        .code(4);

    store
        .as_admin()
        .args(["adopt", "cancel", &rex])
        .assert()
        .success();

    store
        .as_admin()
        .args(["owners", "remove", &jane])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed"));
}

#[test]
fn test_owners_list_and_filter_by_pet() {
    let store = Store::initialized();
    let jane = store.owner("Jane Doe", "jane");
    store.owner("John Roe", "john");
    let rex = store.pet("Rex").to_string();

    let owners = Store::json(store.as_admin(), &["owners", "list"]);
    assert_eq!(owners.as_array().unwrap().len(), 2);

    store
        .as_admin()
        .args(["adopt", "start", &rex, "--owner", &jane.to_string()])
        .assert()
        .success();
    store
        .as_admin()
        .args(["adopt", "finish", &rex])
        .assert()
        .success();

    let owners = Store::json(store.as_admin(), &["owners", "list", "--pet", "Rex"]);
    let owners = owners.as_array().unwrap();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0]["name"], "Jane Doe");
}

#[test]
fn test_summary_counts() {
    let store = Store::initialized();
    let jane = store.owner("Jane Doe", "jane").to_string();
    let rex = store.pet("Rex").to_string();
    store.pet("Fido");

    store
        .as_admin()
        .args(["adopt", "start", &rex, "--owner", &jane])
        .assert()
        .success();

    let summary = Store::json(store.as_admin(), &["summary"]);
    assert_eq!(summary["owners"], 1);
    assert_eq!(summary["available"], 1);
    assert_eq!(summary["pending"], 1);
    assert_eq!(summary["adopted"], 0);

    store
        .as_user("jane", "secret1")
        .arg("summary")
        .assert()
        .code(5);
}

#[test]
fn test_config_set_get_and_validation() {
    let store = Store::new();

    store
        .cmd()
        .args(["config", "set", "service.conflict_retries", "3"])
        .assert()
        .success();

    store
        .cmd()
        .args(["config", "get", "service.conflict_retries"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));

    store
        .cmd()
        .args(["config", "set", "service.conflict_retries", "50"])
        .assert()
        .code(1);

    store
        .cmd()
        .args(["config", "get", "no.such.key"])
        .assert()
        .code(1);
}

#[test]
fn test_explicit_config_file() {
    let store = Store::new();
    let path = store.dir.path().join("custom.toml");

    store
        .cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "set", "logging.filter", "petstore=debug"])
        .assert()
        .success();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("petstore=debug"));
}

//! Tests for the `helpdesk-config` crate.
//!
//! These exercise the configuration loader across default handling, file
//! discovery, and environment overrides. Environment mutation forces the
//! tests to run serially.

use std::fs;
use std::path::PathBuf;

use serial_test::serial;
use tempfile::TempDir;

use helpdesk_config::load;

const ENV_VARS_TO_RESET: &[&str] = &[
    "HELPDESK_CONFIG",
    "HELPDESK__AUTH__SESSION_TTL_SECONDS",
    "HELPDESK__DATABASE__MAX_CONNECTIONS",
    "HELPDESK__DATABASE__URL",
    "HELPDESK__HTTP__ADDRESS",
    "HELPDESK__HTTP__PORT",
];

struct TestContext {
    vars: Vec<(String, Option<String>)>,
    original_dir: Option<PathBuf>,
}

impl TestContext {
    fn new() -> Self {
        let mut ctx = Self {
            vars: Vec::new(),
            original_dir: None,
        };
        for key in ENV_VARS_TO_RESET {
            ctx.remove_var(key);
        }
        ctx
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        self.vars.push((key.to_string(), previous));
    }

    fn remove_var(&mut self, key: &str) {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        self.vars.push((key.to_string(), previous));
    }

    fn change_dir(&mut self, dir: &std::path::Path) {
        if self.original_dir.is_none() {
            self.original_dir = std::env::current_dir().ok();
        }
        std::env::set_current_dir(dir).expect("failed to change directory");
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(dir) = self.original_dir.take() {
            let _ = std::env::set_current_dir(dir);
        }
        for (key, previous) in self.vars.drain(..).rev() {
            match previous {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

#[test]
#[serial]
fn loads_defaults_without_file_or_env() {
    let temp = TempDir::new().unwrap();
    let mut ctx = TestContext::new();
    ctx.change_dir(temp.path());

    let config = load().expect("defaults should load");
    assert_eq!(config.http.address, "127.0.0.1");
    assert_eq!(config.http.port, 7070);
    assert_eq!(config.database.url, "sqlite://helpdesk.db");
    assert_eq!(config.database.max_connections, 10);
    assert_eq!(config.auth.session_ttl_seconds, 86_400);
}

#[test]
#[serial]
fn environment_overrides_take_precedence() {
    let temp = TempDir::new().unwrap();
    let mut ctx = TestContext::new();
    ctx.change_dir(temp.path());
    ctx.set_var("HELPDESK__HTTP__PORT", "9090");
    ctx.set_var("HELPDESK__DATABASE__URL", "sqlite://override.db");

    let config = load().expect("overrides should load");
    assert_eq!(config.http.port, 9090);
    assert_eq!(config.database.url, "sqlite://override.db");
}

#[test]
#[serial]
fn config_file_discovered_in_working_directory() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("helpdesk.toml"),
        r#"
[http]
address = "0.0.0.0"
port = 8181

[database]
url = "sqlite://from-file.db"
max_connections = 3
"#,
    )
    .unwrap();

    let mut ctx = TestContext::new();
    ctx.change_dir(temp.path());

    let config = load().expect("file config should load");
    assert_eq!(config.http.address, "0.0.0.0");
    assert_eq!(config.http.port, 8181);
    assert_eq!(config.database.max_connections, 3);
}

#[test]
#[serial]
fn explicit_config_path_wins_over_discovery() {
    let temp = TempDir::new().unwrap();
    let explicit = temp.path().join("elsewhere.toml");
    fs::write(&explicit, "[http]\naddress = \"10.0.0.1\"\nport = 7171\n").unwrap();
    fs::write(
        temp.path().join("helpdesk.toml"),
        "[http]\naddress = \"ignored\"\nport = 1\n",
    )
    .unwrap();

    let mut ctx = TestContext::new();
    ctx.change_dir(temp.path());
    ctx.set_var("HELPDESK_CONFIG", explicit.display().to_string());

    let config = load().expect("explicit config should load");
    assert_eq!(config.http.address, "10.0.0.1");
    assert_eq!(config.http.port, 7171);
}

//! Common test utilities for rig integration tests.
//!
//! Provides `TestEnv` for isolated test homes that don't touch the
//! user's `~/.rigging` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with an isolated rig home.
///
/// The `rig()` method returns a `Command` that sets `RIG_HOME`
/// per-invocation and scrubs remote configuration from the inherited
/// environment, making tests parallel-safe and deterministic.
pub struct TestEnv {
    pub home: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an empty home.
    pub fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and run `rig init`.
    pub fn init() -> Self {
        let env = Self::new();
        env.rig().arg("init").assert().success();
        env
    }

    /// Get a Command for the rig binary with the isolated home.
    pub fn rig(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_rig"));
        cmd.env("RIG_HOME", self.home.path());
        cmd.env_remove("RIG_REMOTE_URL");
        cmd.env_remove("RIG_API_KEY");
        cmd
    }

    /// Get the path to the home directory.
    pub fn path(&self) -> &std::path::Path {
        self.home.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

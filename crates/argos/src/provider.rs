//! Collaborator interfaces consumed by the parse pipeline.
//!
//! The core performs no ambient I/O: environment lookups and argument-file
//! reads go through these traits. OS-backed implementations are the
//! defaults; in-memory implementations let hosts and tests parse
//! hermetically.
//!
//! # Example
//!
//! ```rust,ignore
//! use argos::provider::{MapEnv, Providers};
//!
//! let env = MapEnv::new().with("PORT", "9090");
//! let providers = Providers::default().with_env(&env);
//! let outcome = schema.parse_with(["--verbose"], &providers);
//! ```

use std::collections::HashMap;
use std::io;

/// Read-only environment query.
pub trait EnvRead {
    /// Returns the variable's value, or `None` when unset or not valid
    /// UTF-8.
    fn var(&self, name: &str) -> Option<String>;
}

/// Read-only file access for argument-file expansion.
pub trait FileRead {
    /// Reads the whole file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the file is missing or
    /// unreadable.
    fn read(&self, path: &str) -> io::Result<String>;
}

// ============================================================================
// OS-backed implementations
// ============================================================================

/// Process-environment reader.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEnv;

impl EnvRead for OsEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Filesystem reader.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsFiles;

impl FileRead for FsFiles {
    fn read(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// In-memory environment for hermetic parses.
#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Adds a variable in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl EnvRead for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// In-memory file store for hermetic argument-file tests.
#[derive(Clone, Debug, Default)]
pub struct MapFiles {
    files: HashMap<String, String>,
}

impl MapFiles {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, builder style.
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl FileRead for MapFiles {
    fn read(&self, path: &str) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such file: {path}")))
    }
}

// ============================================================================
// Provider bundle
// ============================================================================

/// The collaborator bundle a parse invocation reads through.
pub struct Providers<'a> {
    /// Environment reader used by the fallback binder.
    pub env: &'a dyn EnvRead,

    /// File reader used by argument-file expansion.
    pub files: &'a dyn FileRead,
}

impl<'a> Providers<'a> {
    /// Replaces the environment reader.
    #[must_use]
    pub fn with_env(mut self, env: &'a dyn EnvRead) -> Self {
        self.env = env;
        self
    }

    /// Replaces the file reader.
    #[must_use]
    pub fn with_files(mut self, files: &'a dyn FileRead) -> Self {
        self.files = files;
        self
    }
}

impl Default for Providers<'_> {
    fn default() -> Self {
        Self {
            env: &OsEnv,
            files: &FsFiles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_map_env_lookup() {
        let env = MapEnv::new().with("PORT", "9090");
        assert_eq!(env.var("PORT").as_deref(), Some("9090"));
        assert_eq!(env.var("MISSING"), None);
    }

    #[test]
    fn test_map_files_missing_is_not_found() {
        let files = MapFiles::new().with("args.txt", "--verbose");
        assert_eq!(files.read("args.txt").unwrap(), "--verbose");

        let err = files.read("other.txt").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    #[serial]
    fn test_os_env_reads_process_environment() {
        // SAFETY: serialised with every other test touching the process
        // environment.
        unsafe {
            std::env::set_var("ARGOS_PROVIDER_TEST", "ok");
        }
        assert_eq!(OsEnv.var("ARGOS_PROVIDER_TEST").as_deref(), Some("ok"));
        unsafe {
            std::env::remove_var("ARGOS_PROVIDER_TEST");
        }
        assert_eq!(OsEnv.var("ARGOS_PROVIDER_TEST"), None);
    }

    #[test]
    fn test_providers_swapping() {
        let env = MapEnv::new().with("A", "1");
        let files = MapFiles::new();
        let providers = Providers::default().with_env(&env).with_files(&files);

        assert_eq!(providers.env.var("A").as_deref(), Some("1"));
        assert!(providers.files.read("nope").is_err());
    }
}

use crate::core::ConfigError;
use rusqlite::OpenFlags;
use std::path::PathBuf;

const URL_SCHEME: &str = "sqlite://";
const MEMORY_URL: &str = "sqlite::memory:";

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

/// Threading mode the engine is opened with.
///
/// The facade serialises every call through its own mutex either way;
/// `Serialized` additionally makes SQLite lock internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadingMode {
    #[default]
    MultiThread,
    Serialized,
}

/// Engine connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Database file or in-memory database
    pub location: DbLocation,

    /// Engine threading mode
    pub threading: ThreadingMode,

    /// Enforce `FOREIGN KEY` clauses (`PRAGMA foreign_keys`)
    pub foreign_keys: bool,
}

impl ConnectionConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: DbLocation::File(path.into()),
            threading: ThreadingMode::default(),
            foreign_keys: true,
        }
    }

    pub fn memory() -> Self {
        Self {
            location: DbLocation::Memory,
            threading: ThreadingMode::default(),
            foreign_keys: true,
        }
    }

    /// Set the engine threading mode
    pub fn threading(mut self, mode: ThreadingMode) -> Self {
        self.threading = mode;
        self
    }

    /// Enable or disable foreign key enforcement
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Parse from connection string
    ///
    /// Format: `sqlite://path/to/file.db` or `sqlite::memory:`
    ///
    /// # Examples
    ///
    /// ```
    /// # use sqlite_as_json::ConnectionConfig;
    /// let config = ConnectionConfig::from_url("sqlite://data/app.db").unwrap();
    /// assert_eq!(config.to_url(), "sqlite://data/app.db");
    /// ```
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        if url == MEMORY_URL {
            return Ok(Self::memory());
        }

        let path = url.strip_prefix(URL_SCHEME).ok_or_else(|| {
            ConfigError::InvalidConnection(format!(
                "URL must start with '{}' or be '{}'",
                URL_SCHEME, MEMORY_URL
            ))
        })?;

        let config = Self::file(path);
        config.validate()?;
        Ok(config)
    }

    /// Convert to connection string
    pub fn to_url(&self) -> String {
        match &self.location {
            DbLocation::File(path) => format!("{}{}", URL_SCHEME, path.display()),
            DbLocation::Memory => MEMORY_URL.to_string(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let DbLocation::File(path) = &self.location {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConnection(
                    "database path cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn open_flags(&self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI;

        match self.threading {
            ThreadingMode::MultiThread => base | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            ThreadingMode::Serialized => base | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::memory()
    }
}

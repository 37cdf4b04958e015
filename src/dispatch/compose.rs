//! Compose project derivation and command construction.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

use crate::backend::quote;
use crate::error::DispatchError;

/// The four Compose lifecycle verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComposeVerb {
    /// `docker compose up -d`
    Up,
    /// `docker compose down`
    Down,
    /// `docker compose ps`
    Ps,
    /// `docker compose restart`
    Restart,
}

impl ComposeVerb {
    /// Every verb, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Ps, Self::Restart];

    /// Arguments following `docker compose -f <file>`.
    #[must_use]
    pub const fn arguments(self) -> &'static str {
        match self {
            Self::Up => "up -d",
            Self::Down => "down",
            Self::Ps => "ps",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for ComposeVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Ps => "ps",
            Self::Restart => "restart",
        };
        write!(f, "compose {name}")
    }
}

/// Where a Compose project lives on its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeProject {
    directory: Utf8PathBuf,
    file_name: String,
}

impl ComposeProject {
    /// Split an absolute Compose file path into working directory and file
    /// name.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Configuration` for field `compose_file` if the
    /// path is relative, has no parent directory, or has no file name.
    pub fn from_compose_file(compose_file: &str) -> Result<Self, DispatchError> {
        let path = Utf8Path::new(compose_file);
        if !compose_file.starts_with('/') {
            return Err(invalid_compose_file("must be an absolute path"));
        }
        let file_name = path
            .file_name()
            .ok_or_else(|| invalid_compose_file("must name a file"))?;
        let directory = path
            .parent()
            .ok_or_else(|| invalid_compose_file("must have a parent directory"))?;

        Ok(Self {
            directory: directory.to_owned(),
            file_name: String::from(file_name),
        })
    }

    /// The working directory commands run in.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    /// The Compose file name relative to [`Self::directory`].
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The shell command for `verb`.
    #[must_use]
    pub fn command(&self, verb: ComposeVerb) -> String {
        format!(
            "cd {} && docker compose -f {} {}",
            quote(self.directory.as_str()),
            quote(&self.file_name),
            verb.arguments()
        )
    }
}

fn invalid_compose_file(reason: &str) -> DispatchError {
    DispatchError::Configuration {
        field: "compose_file",
        reason: String::from(reason),
    }
}

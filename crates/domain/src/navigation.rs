//! Console views and cross-view navigation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Top-level views of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// User and process management.
    Management,
    /// Import portal.
    Import,
    /// Export portal.
    Export,
    /// Process configuration.
    Configuration,
    /// Architecture documentation.
    Architecture,
}

impl View {
    /// All views in menu order.
    pub const ALL: [Self; 5] = [
        Self::Management,
        Self::Import,
        Self::Export,
        Self::Configuration,
        Self::Architecture,
    ];

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Management => "User/Process Management",
            Self::Import => "Import",
            Self::Export => "Export",
            Self::Configuration => "Configuration",
            Self::Architecture => "Architecture",
        }
    }

    const fn key(self) -> &'static str {
        match self {
            Self::Management => "management",
            Self::Import => "import",
            Self::Export => "export",
            Self::Configuration => "configuration",
            Self::Architecture => "architecture",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for View {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|view| view.key() == key)
            .ok_or_else(|| DomainError::UnknownView(s.to_string()))
    }
}

/// A request to show a view, optionally focused on one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    /// View to show.
    pub view: View,
    /// Record to focus (e.g. a process id).
    pub target_record: Option<String>,
}

impl Navigation {
    /// Navigates to a view without a target.
    #[must_use]
    pub const fn to(view: View) -> Self {
        Self {
            view,
            target_record: None,
        }
    }

    /// Navigates to a view focused on a record.
    #[must_use]
    pub fn focused(view: View, record: impl Into<String>) -> Self {
        Self {
            view,
            target_record: Some(record.into()),
        }
    }
}

impl FromStr for Navigation {
    type Err = DomainError;

    /// Parses `view` or `view:record`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((view, record)) if !record.trim().is_empty() => {
                Ok(Self::focused(view.parse()?, record.trim()))
            }
            Some((view, _)) => Ok(Self::to(view.parse()?)),
            None => Ok(Self::to(s.parse()?)),
        }
    }
}

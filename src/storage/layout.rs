//! Data directory layout

use std::path::{Path, PathBuf};

/// Where each record kind lives below the data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn inventory_dir(&self) -> PathBuf {
        self.root.join("inventory")
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.inventory_dir().join("profiles")
    }

    pub fn projectiles_dir(&self) -> PathBuf {
        self.inventory_dir().join("projectiles")
    }

    pub fn sights_dir(&self) -> PathBuf {
        self.inventory_dir().join("sights")
    }

    /// Create every directory; existing ones are left alone
    pub fn create_all(&self) -> std::io::Result<()> {
        for dir in [
            self.sessions_dir(),
            self.profiles_dir(),
            self.projectiles_dir(),
            self.sights_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// True once `create_all` has run for this root
    pub fn is_initialized(&self) -> bool {
        self.sessions_dir().is_dir() && self.inventory_dir().is_dir()
    }
}

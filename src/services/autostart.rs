//! Launch-at-login toggle via an XDG autostart entry

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::error::AutostartError;

const ENTRY_FILE: &str = "countup.desktop";

/// Manages `<config_dir>/autostart/countup.desktop`
#[derive(Debug, Clone)]
pub struct Autostart {
    entry_path: PathBuf,
    exec: PathBuf,
}

impl Autostart {
    /// Manage the entry under `config_dir`, launching `exec` at login
    pub fn new(config_dir: impl AsRef<Path>, exec: impl Into<PathBuf>) -> Self {
        Self {
            entry_path: config_dir.as_ref().join("autostart").join(ENTRY_FILE),
            exec: exec.into(),
        }
    }

    /// Use the user's configuration directory and the running executable
    pub fn for_current_user() -> Result<Self, AutostartError> {
        let config_dir = dirs::config_dir().ok_or(AutostartError::NoConfigDir)?;
        let exec = std::env::current_exe()?;
        Ok(Self::new(config_dir, exec))
    }

    pub fn entry_path(&self) -> &Path {
        &self.entry_path
    }

    pub fn is_enabled(&self) -> bool {
        self.entry_path.is_file()
    }

    /// Apply the requested setting and return the resulting state
    pub fn set_enabled(&self, enabled: bool) -> Result<bool, AutostartError> {
        if enabled {
            self.enable()?;
        } else {
            self.disable()?;
        }
        Ok(self.is_enabled())
    }

    pub fn enable(&self) -> Result<(), AutostartError> {
        if let Some(parent) = self.entry_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.entry_path, self.desktop_entry())?;
        info!("Launch at login enabled: {}", self.entry_path.display());
        Ok(())
    }

    /// Remove the entry. Not having one is fine.
    pub fn disable(&self) -> Result<(), AutostartError> {
        match fs::remove_file(&self.entry_path) {
            Ok(()) => {
                info!("Launch at login disabled");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Launch at login already disabled");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn desktop_entry(&self) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name=CountUp\n\
             Comment=Background stopwatch\n\
             Exec=\"{}\"\n\
             Terminal=false\n\
             X-GNOME-Autostart-enabled=true\n",
            self.exec.display()
        )
    }
}

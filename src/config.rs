// Copyright (C) 2024 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::path::{Path, PathBuf};

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::Error;

/// Where the port to card number table lives unless overridden.
pub const DEFAULT_PORTS_FILE: &str = "/etc/audiomux_ports";

/// Where the combined multi-card ALSA configuration is written unless overridden.
pub const DEFAULT_ASOUND_CONF: &str = "/etc/asound.conf";

/// Environment variables with this prefix override the default paths,
/// e.g. ALSA_NAME_PORTS_FILE.
const ENV_PREFIX: &str = "ALSA_NAME";

/// The runtime settings for a single invocation.
#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    /// The port to card number table.
    ports_file: PathBuf,

    /// The generated ALSA configuration file.
    asound_conf: PathBuf,
}

impl Settings {
    /// Loads the settings from the defaults and any environment overrides.
    pub fn load() -> Result<Settings, Error> {
        Ok(Config::builder()
            .set_default("ports_file", DEFAULT_PORTS_FILE)?
            .set_default("asound_conf", DEFAULT_ASOUND_CONF)?
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// Applies command line overrides on top of the loaded settings.
    pub fn with_overrides(
        mut self,
        ports_file: Option<PathBuf>,
        asound_conf: Option<PathBuf>,
    ) -> Settings {
        if let Some(ports_file) = ports_file {
            self.ports_file = ports_file;
        }
        if let Some(asound_conf) = asound_conf {
            self.asound_conf = asound_conf;
        }
        self
    }

    /// Returns the path of the ports file.
    pub fn ports_file(&self) -> &Path {
        &self.ports_file
    }

    /// Returns the path of the generated ALSA configuration.
    pub fn asound_conf(&self) -> &Path {
        &self.asound_conf
    }
}

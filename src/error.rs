// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
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
use std::io;
use std::path::PathBuf;

/// Typed errors so that main can pick the right exit code without string matching.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to read ports file {}: {source}", .path.display())]
    ReadPorts {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported device name \"{0}\"")]
    UnsupportedDevice(String),

    #[error("pcm device \"{0}\" does not end in a playback (p) or capture (c) marker")]
    InvalidDirection(String),

    #[error("no card number mapped for port \"{0}\"")]
    NoMapping(String),

    #[error("settings load/parse error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("unable to write output: {0}")]
    Output(#[from] io::Error),

    #[error("could not write {}: {source}", .path.display())]
    WriteConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
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
#[cfg(test)]
use std::{fs, path::PathBuf};

#[cfg(test)]
use tempfile::TempDir;

/// Writes a ports file with the given contents into a fresh temp dir. The temp dir
/// is returned so that it lives as long as the test needs the file.
#[cfg(test)]
pub fn write_ports_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("unable to create temp dir");
    let path = dir.path().join("audiomux_ports");
    fs::write(&path, contents).expect("unable to write ports file");
    (dir, path)
}

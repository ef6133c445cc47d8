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

//! Generates an ALSA configuration that combines every mapped card into a single
//! multi-channel device. Each card is assumed to have one stereo playback device,
//! and contributes one channel pair. JACK and friends can then use the "ttable"
//! device to address all cards at once.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::{info, warn};

use crate::error::Error;
use crate::ports::Mappings;

/// Channels each slave card contributes.
const CHANNELS_PER_CARD: usize = 2;

/// The combined configuration for a set of mappings.
pub struct MultiConfig<'a> {
    mappings: &'a Mappings,
}

impl<'a> MultiConfig<'a> {
    pub fn new(mappings: &'a Mappings) -> MultiConfig<'a> {
        MultiConfig { mappings }
    }

    /// Renders the configuration and writes it to the given path, replacing whatever is there.
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        if self.mappings.is_empty() {
            warn!("No port mappings found, the multi device will have no slaves");
        }

        let contents = self.to_string();
        let to_error = |source| Error::WriteConfig {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::create(path).map_err(to_error)?;
        file.write_all(contents.as_bytes()).map_err(to_error)?;

        info!(
            path = %path.display(),
            cards = self.mappings.len(),
            "Wrote multi card ALSA configuration"
        );
        Ok(())
    }

    fn write_multi(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pcm.multi {{")?;
        writeln!(f, "\ttype multi;")?;

        for (i, mapping) in self.mappings.iter().enumerate() {
            let slave = slave_id(i);
            writeln!(f, "\tslaves.{}.pcm \"hw:{},0\";", slave, mapping.card())?;
            writeln!(f, "\tslaves.{}.channels {};", slave, CHANNELS_PER_CARD)?;
        }

        for i in 0..self.mappings.len() {
            let slave = slave_id(i);
            for channel in 0..CHANNELS_PER_CARD {
                let binding = i * CHANNELS_PER_CARD + channel;
                writeln!(f, "\tbindings.{}.slave {};", binding, slave)?;
                writeln!(f, "\tbindings.{}.channel {};", binding, channel)?;
            }
        }

        writeln!(f, "}}")
    }

    fn write_ttable(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pcm.ttable {{")?;
        writeln!(f, "\ttype route;")?;
        writeln!(f, "\tslave.pcm \"multi\";")?;

        for channel in 0..self.mappings.len() * CHANNELS_PER_CARD {
            writeln!(f, "\tttable.{}.{} 1;", channel, channel)?;
        }

        writeln!(f, "}}")
    }
}

/// Control devices for the virtual devices just point at the first hardware card.
fn write_ctl(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    writeln!(f, "ctl.{} {{", name)?;
    writeln!(f, "\ttype hw;")?;
    writeln!(f, "\tcard 0;")?;
    writeln!(f, "}}")
}

impl fmt::Display for MultiConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_multi(f)?;
        writeln!(f)?;
        write_ctl(f, "multi")?;
        writeln!(f)?;
        self.write_ttable(f)?;
        writeln!(f)?;
        write_ctl(f, "ttable")
    }
}

/// Slave identifiers run a..z, then aa, ab, ... so any number of cards gets a unique id.
fn slave_id(mut index: usize) -> String {
    let mut id = String::new();
    loop {
        id.insert(0, char::from(b'a' + (index % 26) as u8));
        if index < 26 {
            return id;
        }
        index = index / 26 - 1;
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;

    use super::{slave_id, MultiConfig};
    use crate::ports::Mappings;

    fn mappings(content: &str) -> Mappings {
        Mappings::from_reader(Cursor::new(content), Path::new("test"))
    }

    #[test]
    fn test_two_cards() {
        let mappings = mappings("\"1-1\" 2\n\"1-2\" 5\n");

        assert_eq!(
            "pcm.multi {\n\
             \ttype multi;\n\
             \tslaves.a.pcm \"hw:2,0\";\n\
             \tslaves.a.channels 2;\n\
             \tslaves.b.pcm \"hw:5,0\";\n\
             \tslaves.b.channels 2;\n\
             \tbindings.0.slave a;\n\
             \tbindings.0.channel 0;\n\
             \tbindings.1.slave a;\n\
             \tbindings.1.channel 1;\n\
             \tbindings.2.slave b;\n\
             \tbindings.2.channel 0;\n\
             \tbindings.3.slave b;\n\
             \tbindings.3.channel 1;\n\
             }\n\
             \n\
             ctl.multi {\n\
             \ttype hw;\n\
             \tcard 0;\n\
             }\n\
             \n\
             pcm.ttable {\n\
             \ttype route;\n\
             \tslave.pcm \"multi\";\n\
             \tttable.0.0 1;\n\
             \tttable.1.1 1;\n\
             \tttable.2.2 1;\n\
             \tttable.3.3 1;\n\
             }\n\
             \n\
             ctl.ttable {\n\
             \ttype hw;\n\
             \tcard 0;\n\
             }\n",
            MultiConfig::new(&mappings).to_string()
        );
    }

    #[test]
    fn test_no_cards() {
        let config = MultiConfig::new(&Mappings::default()).to_string();

        assert!(config.starts_with("pcm.multi {\n\ttype multi;\n}\n"));
        assert!(!config.contains("slaves."));
        assert!(!config.contains("bindings."));
        assert!(!config.contains("ttable.0"));
        assert!(config.ends_with("ctl.ttable {\n\ttype hw;\n\tcard 0;\n}\n"));
    }

    #[test]
    fn test_duplicate_cards_are_kept() {
        let mappings = mappings("\"1-1\" 2\n\"1-1\" 2\n");
        let config = MultiConfig::new(&mappings).to_string();

        assert!(config.contains("\tslaves.a.pcm \"hw:2,0\";\n"));
        assert!(config.contains("\tslaves.b.pcm \"hw:2,0\";\n"));
    }

    #[test]
    fn test_slave_ids() {
        assert_eq!("a", slave_id(0));
        assert_eq!("z", slave_id(25));
        assert_eq!("aa", slave_id(26));
        assert_eq!("az", slave_id(51));
        assert_eq!("ba", slave_id(52));
    }

    #[test]
    fn test_more_than_26_cards() {
        // Card numbers only go to 31, but the same card may be listed more than once.
        let content: String = (0..28)
            .map(|i| format!("\"port-{}\" {}\n", i, i % 31 + 1))
            .collect();
        let mappings = mappings(&content);
        let config = MultiConfig::new(&mappings).to_string();

        assert!(config.contains("\tslaves.z.pcm \"hw:26,0\";\n"));
        assert!(config.contains("\tslaves.aa.pcm \"hw:27,0\";\n"));
        assert!(config.contains("\tslaves.ab.pcm \"hw:28,0\";\n"));
        assert!(config.contains("\tbindings.55.slave ab;\n"));
        assert!(config.contains("\tttable.55.55 1;\n"));
    }

    #[test]
    fn test_write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asound.conf");
        fs::write(&path, "stale contents that are much longer than nothing at all").unwrap();

        let mappings = mappings("\"1-1\" 2\n\"1-2\" 5\n");
        let config = MultiConfig::new(&mappings);

        config.write(&path).unwrap();
        let first = fs::read(&path).unwrap();
        config.write(&path).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(config.to_string().into_bytes(), first);
    }

    #[test]
    fn test_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("asound.conf");

        assert!(MultiConfig::new(&Mappings::default()).write(&path).is_err());
    }
}

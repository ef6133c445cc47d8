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
use std::str::FromStr;

use crate::error::Error;
use crate::ports::CardNumber;

/// Subdevice indices above this are treated as 0.
const MAX_SUBDEVICE: u8 = 32;

/// The stream direction of a pcm device node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Playback,
    Capture,
}

impl Direction {
    fn marker(self) -> char {
        match self {
            Direction::Playback => 'p',
            Direction::Capture => 'c',
        }
    }
}

/// A kernel sound device node name as udev reports it (%k), e.g. controlC0 or pcmC0D1p.
/// The card number is not kept since it is the part being replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceName {
    Control,
    Pcm { device: u8, direction: Direction },
    // hwC and midiC nodes are best effort; they have not been tried against real hardware.
    Hw { device: u8 },
    Midi { device: u8 },
}

impl DeviceName {
    /// Renders the device node name for the given card number.
    pub fn with_card(&self, card: CardNumber) -> String {
        match self {
            DeviceName::Control => format!("controlC{}", card),
            DeviceName::Pcm { device, direction } => {
                format!("pcmC{}D{}{}", card, device, direction.marker())
            }
            DeviceName::Hw { device } => format!("hwC{}D{}", card, device),
            DeviceName::Midi { device } => format!("midiC{}D{}", card, device),
        }
    }
}

impl FromStr for DeviceName {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.starts_with("controlC") {
            Ok(DeviceName::Control)
        } else if name.starts_with("pcmC") {
            let direction = match name.chars().last() {
                Some('p') => Direction::Playback,
                Some('c') => Direction::Capture,
                _ => return Err(Error::InvalidDirection(name.to_string())),
            };
            Ok(DeviceName::Pcm {
                device: subdevice(name),
                direction,
            })
        } else if name.starts_with("hwC") {
            Ok(DeviceName::Hw {
                device: subdevice(name),
            })
        } else if name.starts_with("midiC") {
            Ok(DeviceName::Midi {
                device: subdevice(name),
            })
        } else {
            Err(Error::UnsupportedDevice(name.to_string()))
        }
    }
}

/// Reads the decimal number following the last 'D' in the name. Anything missing,
/// unparseable or out of range is 0.
fn subdevice(name: &str) -> u8 {
    let Some((_, after)) = name.rsplit_once('D') else {
        return 0;
    };
    let digits = after
        .find(|c: char| !c.is_ascii_digit())
        .map_or(after, |end| &after[..end]);

    digits
        .parse::<u8>()
        .ok()
        .filter(|device| *device <= MAX_SUBDEVICE)
        .unwrap_or(0)
}

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
use tracing::debug;

use crate::device::DeviceName;
use crate::error::Error;
use crate::ports::Mappings;

/// Where the rules are usually installed. The file has to sort before the
/// distribution's ALSA rules so that the names are in place first.
pub const RULES_FILE: &str = "/etc/udev/rules.d/39-usb-alsa.rules";

/// The program placeholder in RULES_TEMPLATE.
const PROGRAM_PLACEHOLDER: &str = "{program}";

// udev passes the kernel name (%k) and the USB port (%b) and uses the first
// word we print (%c{1}) as the new node name.
const RULES_TEMPLATE: &str = r#"KERNEL=="controlC[0-9]*", DRIVERS=="usb", PROGRAM="{program} %k %b", NAME="snd/%c{1}"
KERNEL=="hwC[D0-9]*", DRIVERS=="usb", PROGRAM="{program} %k %b", NAME="snd/%c{1}"
KERNEL=="midiC[D0-9]*", DRIVERS=="usb", PROGRAM="{program} %k %b", NAME="snd/%c{1}"
KERNEL=="pcmC[D0-9cp]*", DRIVERS=="usb", PROGRAM="{program} %k %b", NAME="snd/%c{1}"
"#;

/// Returns the udev rules that invoke the given program for USB sound devices.
pub fn rules(program: &str) -> String {
    format!(
        "# {}\n{}",
        RULES_FILE,
        RULES_TEMPLATE.replace(PROGRAM_PLACEHOLDER, program)
    )
}

/// Works out the stable node name for a device plugged into the given USB port.
pub fn rename(device_name: &str, port: &str, mappings: &Mappings) -> Result<String, Error> {
    let card = mappings
        .find_card(port)
        .ok_or_else(|| Error::NoMapping(port.to_string()))?;
    let device = device_name.parse::<DeviceName>()?;

    let renamed = device.with_card(card);
    debug!(
        device = device_name,
        port,
        renamed = renamed.as_str(),
        "Renamed device"
    );
    Ok(renamed)
}

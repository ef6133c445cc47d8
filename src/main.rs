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
mod asound;
mod config;
mod device;
mod error;
mod ports;
#[cfg(test)]
mod testutil;
mod udev;

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{crate_version, Parser};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::asound::MultiConfig;
use crate::config::Settings;
use crate::error::Error;
use crate::ports::Mappings;

const SUCCESS: u8 = 0;

/// Generate, list and settings failures outside of lookup mode.
const FAILURE: u8 = 1;

/// udev treats any nonzero status as "keep the kernel name"; this is the
/// traditional -1.
const LOOKUP_FAILURE: u8 = 255;

/// Used in the printed udev rules when the running executable can't be determined.
const DEFAULT_PROGRAM: &str = "/usr/bin/alsa_name";

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Gives USB sound cards stable ALSA card numbers based on their USB port.",
    long_about = "Gives USB sound cards stable ALSA card numbers based on their USB port.\n\n\
                  With a device name and a port (udev's %k and %b), prints the renamed device \
                  node. With no arguments, writes an ALSA configuration that combines every \
                  mapped card into a single \"ttable\" device."
)]
struct Cli {
    /// The kernel device name, e.g. controlC0 or pcmC0D0p.
    device_name: Option<String>,

    /// The USB port the device is plugged into, e.g. 3-2 or 1-1.2.
    port_name: Option<String>,

    /// The port to card number table.
    #[arg(long, value_name = "PATH")]
    ports_file: Option<PathBuf>,

    /// Where to write the generated ALSA configuration.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["device_name", "list", "udev_rules"])]
    output: Option<PathBuf>,

    /// Print the generated ALSA configuration instead of writing it.
    #[arg(long, conflicts_with_all = ["output", "device_name"])]
    stdout: bool,

    /// Lists the mappings found in the ports file.
    #[arg(long, conflicts_with_all = ["device_name", "stdout", "udev_rules"])]
    list: bool,

    /// Prints udev rules that invoke this program to stdout.
    #[arg(long, conflicts_with_all = ["device_name", "stdout"])]
    udev_rules: bool,
}

/// What a single invocation does.
#[derive(Clone, Copy)]
enum Mode<'a> {
    Generate { to_stdout: bool },
    Lookup { device_name: &'a str, port: &'a str },
    List,
    UdevRules,
}

impl Cli {
    /// Picks the mode. A device name without a port is not a valid invocation.
    fn mode(&self) -> Option<Mode<'_>> {
        if self.list {
            return Some(Mode::List);
        }
        if self.udev_rules {
            return Some(Mode::UdevRules);
        }

        match (&self.device_name, &self.port_name) {
            (None, None) => Some(Mode::Generate {
                to_stdout: self.stdout,
            }),
            (Some(device_name), Some(port)) => Some(Mode::Lookup { device_name, port }),
            _ => None,
        }
    }
}

fn main() -> ExitCode {
    // stdout carries the result back to udev, so all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    ExitCode::from(execute(std::env::args_os(), &mut io::stdout().lock()))
}

/// Runs one invocation and returns the process exit status.
fn execute<I, T, W>(args: I, out: &mut W) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            e.print().ok();
            return if e.use_stderr() {
                LOOKUP_FAILURE
            } else {
                SUCCESS
            };
        }
    };

    let Some(mode) = cli.mode() else {
        return LOOKUP_FAILURE;
    };

    let result = Settings::load().and_then(|settings| {
        let settings = settings.with_overrides(cli.ports_file.clone(), cli.output.clone());
        run(mode, &settings, out)
    });
    exit_status(mode, &result)
}

/// Logs the outcome and maps it to an exit status. Lookups always fail with
/// LOOKUP_FAILURE, whatever went wrong.
fn exit_status(mode: Mode<'_>, result: &Result<(), Error>) -> u8 {
    let failure = match mode {
        Mode::Lookup { .. } => LOOKUP_FAILURE,
        _ => FAILURE,
    };

    match result {
        Ok(()) => SUCCESS,
        Err(e @ (Error::NoMapping(_) | Error::UnsupportedDevice(_) | Error::InvalidDirection(_))) => {
            // Unmapped devices are the common case.
            info!(err = %e, "Leaving device name unchanged");
            failure
        }
        Err(e) => {
            error!(err = %e, "Failed");
            failure
        }
    }
}

fn run<W: Write>(mode: Mode<'_>, settings: &Settings, out: &mut W) -> Result<(), Error> {
    match mode {
        Mode::Generate { to_stdout } => {
            let mappings = ports::load_or_empty(settings.ports_file());
            let config = MultiConfig::new(&mappings);

            if to_stdout {
                write!(out, "{}", config)?;
            } else {
                config.write(settings.asound_conf())?;
            }
        }
        Mode::Lookup { device_name, port } => {
            let mappings = ports::load_or_empty(settings.ports_file());
            let renamed = udev::rename(device_name, port, &mappings)?;
            writeln!(out, "{}", renamed)?;
        }
        Mode::List => {
            let mappings = Mappings::load(settings.ports_file())?;

            if mappings.is_empty() {
                writeln!(
                    out,
                    "No mappings found in {}.",
                    settings.ports_file().display()
                )?;
                return Ok(());
            }

            writeln!(out, "Mappings (count: {}):", mappings.len())?;
            for mapping in &mappings {
                writeln!(out, "- {}", mapping)?;
            }
        }
        Mode::UdevRules => {
            let program = std::env::current_exe()
                .ok()
                .and_then(|path| path.to_str().map(str::to_string))
                .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());
            write!(out, "{}", udev::rules(&program))?;
        }
    }

    Ok(())
}

use std::{fmt::Display, num::ParseIntError, path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum};
use lithiumate::CanSpeed;

use crate::hex::parse_id;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Hostname or ip address of a CAN bridge (or "server" to run a simulated BMS).
    pub host: String,

    /// TCP port number
    #[arg(default_value = "35000")]
    pub port: u16,

    /// CAN bus speed
    #[arg(short, long, value_enum, default_value = "500")]
    pub speed: Speed,

    /// Identifier the BMS listens on, in hex
    #[arg(short, long, default_value = "745", value_parser = parse_id)]
    pub request_id: u16,

    /// Log filter, e.g. "debug" or "lithiumate=trace"
    #[arg(long, default_value = "warn")]
    pub log: String,
}

#[derive(Debug, PartialEq, Clone, Copy, ValueEnum)]
pub enum Speed {
    #[value(name = "500")]
    Kbps500,
    #[value(name = "250")]
    Kbps250,
    #[value(name = "125")]
    Kbps125,
}

impl From<Speed> for CanSpeed {
    fn from(value: Speed) -> Self {
        match value {
            Speed::Kbps500 => CanSpeed::Kbps500,
            Speed::Kbps250 => CanSpeed::Kbps250,
            Speed::Kbps125 => CanSpeed::Kbps125,
        }
    }
}

#[derive(Parser, Debug)]
#[command()]
pub struct Interactive {
    #[command(subcommand)]
    pub command: InteractiveCommands,
}

#[derive(Subcommand, Debug)]
pub enum InteractiveCommands {
    /// Read all quantities
    Status,

    /// Read a single quantity
    Read(ReadArgs),

    /// Read present faults, the stored fault and warnings
    Faults,

    /// Erase the stored fault
    ClearFaults,

    /// Send a raw request and print the reply
    Raw(RawArgs),

    /// Repeat status until Ctrl-C
    Watch(WatchArgs),

    /// Export the previously printed table
    Export(ExportArgs),

    /// Set configuration
    Set(SetArgs),

    /// Exit the program
    Exit,
}

impl Display for InteractiveCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractiveCommands::Status => write!(f, "Status"),
            InteractiveCommands::Read(_) => write!(f, "Read"),
            InteractiveCommands::Faults => write!(f, "Faults"),
            InteractiveCommands::ClearFaults => write!(f, "ClearFaults"),
            InteractiveCommands::Raw(_) => write!(f, "Raw"),
            InteractiveCommands::Watch(_) => write!(f, "Watch"),
            InteractiveCommands::Export(_) => write!(f, "Export"),
            InteractiveCommands::Set(_) => write!(f, "Set"),
            InteractiveCommands::Exit => write!(f, "Exit"),
        }
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Quantity to read
    #[arg(value_enum)]
    pub quantity: Quantity,
}

#[derive(Debug, PartialEq, Clone, Copy, ValueEnum)]
pub enum Quantity {
    Soc,
    Dod,
    Soh,
    Capacity,
    PackVoltage,
    MinCell,
    AvgCell,
    MaxCell,
    PackCurrent,
    AvgSourceCurrent,
    AvgLoadCurrent,
    SourceCurrent,
    LoadCurrent,
    ChargeLimit,
    DischargeLimit,
    Io,
}

#[derive(Args, Debug)]
pub struct RawArgs {
    /// Request mode, in hex
    #[arg(value_parser = crate::hex::parse_byte)]
    pub mode: u8,

    /// High byte of the parameter id, in hex
    #[arg(value_parser = crate::hex::parse_byte)]
    pub pid_hi: u8,

    /// Low byte of the parameter id, in hex
    #[arg(default_value = "0", value_parser = crate::hex::parse_byte)]
    pub pid_lo: u8,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Time between reads in ms
    #[arg(default_value = "1000", value_parser = parse_duration)]
    pub interval: Duration,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// The file to write to
    pub filename: PathBuf,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(subcommand)]
    pub command: SetCommands,
}

#[derive(Subcommand, Debug)]
pub enum SetCommands {
    /// Set the request identifier, in hex
    RequestId {
        #[arg(value_parser = parse_id)]
        request_id: u16,
    },
}

fn parse_duration(input: &str) -> Result<Duration, ParseIntError> {
    let ms = input.parse()?;
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli() {
        let cli = Cli::try_parse_from(["lithiumate-test", "192.168.1.50"]).unwrap();
        assert_eq!(cli.port, 35000);
        assert_eq!(cli.speed, Speed::Kbps500);
        assert_eq!(cli.request_id, 0x0745);

        let cli = Cli::try_parse_from(["lithiumate-test", "server", "4000", "--speed", "125", "--request-id", "0x620"]).unwrap();
        assert_eq!(cli.port, 4000);
        assert_eq!(CanSpeed::from(cli.speed), CanSpeed::Kbps125);
        assert_eq!(cli.request_id, 0x0620);

        assert!(Cli::try_parse_from(["lithiumate-test", "host", "--speed", "1000"]).is_err());
    }

    #[test]
    fn test_parse_interactive() {
        let cmd = Interactive::try_parse_from(["lithiumate-test>", "raw", "10", "50"]).unwrap();
        match cmd.command {
            InteractiveCommands::Raw(args) => assert_eq!((args.mode, args.pid_hi, args.pid_lo), (0x10, 0x50, 0x00)),
            other => panic!("unexpected {other}"),
        }

        let cmd = Interactive::try_parse_from(["lithiumate-test>", "read", "pack-voltage"]).unwrap();
        assert!(matches!(cmd.command, InteractiveCommands::Read(ReadArgs { quantity: Quantity::PackVoltage })));

        assert!(Interactive::try_parse_from(["lithiumate-test>", "read", "voltage"]).is_err());
    }
}

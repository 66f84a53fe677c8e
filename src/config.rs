//! Command line configuration for the `ls8` binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use crate::emu::{debugger::parse_addr, emulator::EmuConfig};

/// Runs an LS-8 program.
#[derive(Debug, Parser)]
#[command(name = "ls8", version)]
pub struct Args {
    /// Program file: one byte per line as a binary literal, `#` starts a comment
    pub program: PathBuf,

    /// Start paused in the interactive debugger
    #[arg(long)]
    pub debug: bool,

    /// Log a trace line before every instruction
    #[arg(long)]
    pub trace: bool,

    /// Fail after executing this many instructions
    #[arg(long, value_name = "N")]
    pub max_cycles: Option<u64>,

    /// Pause in the debugger when the program counter reaches ADDR (may be repeated)
    #[arg(short, long = "break", value_name = "ADDR", value_parser = parse_breakpoint)]
    pub breakpoints: Vec<u8>,

    /// Number of executed instructions kept for the debugger's backtrace
    #[arg(long, value_name = "N", default_value_t = EmuConfig::default().history_len)]
    pub history: usize,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn parse_breakpoint(addr: &str) -> Result<u8, String> {
    parse_addr(addr).map_err(|e| e.to_string())
}

impl Args {
    pub fn emu_config(&self) -> EmuConfig {
        EmuConfig {
            max_cycles: self.max_cycles,
            history_len: self.history,
            start_paused: self.debug,
            breakpoints: self.breakpoints.clone(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.trace {
            return LevelFilter::Trace;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["ls8", "demos/print8.ls8"]).unwrap();
        assert_eq!(args.program, PathBuf::from("demos/print8.ls8"));
        assert_eq!(args.emu_config(), EmuConfig::default());
        assert_eq!(args.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "ls8",
            "prog.ls8",
            "--debug",
            "--max-cycles",
            "1000",
            "-b",
            "0x10",
            "--break",
            "24",
            "--history",
            "4",
            "-vv",
        ])
        .unwrap();
        let config = args.emu_config();
        assert!(config.start_paused);
        assert_eq!(config.max_cycles, Some(1000));
        assert_eq!(config.breakpoints, [0x10, 24]);
        assert_eq!(config.history_len, 4);
        assert_eq!(args.log_level(), LevelFilter::Debug);

        let args = Args::try_parse_from(["ls8", "prog.ls8", "--trace"]).unwrap();
        assert_eq!(args.log_level(), LevelFilter::Trace);
    }

    #[test]
    fn test_missing_program() {
        assert!(Args::try_parse_from(["ls8"]).is_err());
        assert!(Args::try_parse_from(["ls8", "prog.ls8", "-b", "0x1FF"]).is_err());
    }
}

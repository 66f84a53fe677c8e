use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use ls8::{config::Args, emu::emulator::Emulator, loader};

fn run(args: &Args) -> Result<()> {
    let program = loader::load_file(&args.program)?;
    let mut emu = Emulator::with_stdout(&program, args.emu_config())?;
    emu.run_until_halt()
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = simplelog::TermLogger::init(
        args.log_level(),
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    ) {
        eprintln!("failed to initialize logger: {e}");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

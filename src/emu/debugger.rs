use std::{cell::RefCell, io::Write};

use anyhow::{Context, Result};
use easy_repl::{command, repl::LoopStatus, CommandStatus, Repl};

use crate::plat::Register;

use super::emulator::{EmuState, Emulator};

pub struct Debugger<'b, W> {
    pub emu: RefCell<&'b mut Emulator<W>>,
}

/// Parses a memory address given either in decimal, or in hex with an optional `0x` prefix.
pub fn parse_addr(addr: &str) -> Result<u8> {
    if let Some(hex) = addr.strip_prefix("0x") {
        return u8::from_str_radix(hex, 16).with_context(|| format!("invalid address {addr}"));
    }
    addr.parse::<u8>()
        .or_else(|_| u8::from_str_radix(addr, 16))
        .with_context(|| format!("invalid address {addr}"))
}

impl<'b, W: Write> Debugger<'b, W> {
    pub fn new(emu: &'b mut Emulator<W>) -> Self {
        Self {
            emu: RefCell::new(emu),
        }
    }

    pub fn repl(&self) -> Result<()> {
        let mut repl = Repl::builder()
            .description("LS-8 Debug REPL")
            .add(
                "c",
                command! {
                    "Continue execution",
                    () => || {
                        self.emu.borrow_mut().state = EmuState::Running;
                        Ok(CommandStatus::Quit)
                    }
                },
            )
            .add(
                "s",
                command! {
                    "Step one instruction",
                    () => || {
                        let mut emu = self.emu.borrow_mut();
                        emu.step()?;
                        eprintln!("{}", emu.trace());
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "bt",
                command! {
                    "Print last X instructions executed",
                    (x:usize) => |x| {
                        let emu = self.emu.borrow();
                        for (pc, instr) in emu.instr_history.iter().rev().take(x).rev() {
                            eprintln!("[{:02X}] {}", pc, instr);
                        }
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "pr",
                command! {
                    "Print the value of all registers",
                    () => || {
                        let emu = self.emu.borrow();
                        for reg in Register::ALL {
                            eprintln!("{}={:02X}", reg, emu.registers.get(reg));
                        }
                        eprintln!("PC={:02X}", emu.registers.pc);
                        eprintln!("FL={:03b}", emu.registers.fl.bits());
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "trace",
                command! {
                    "Print a trace line for the current state",
                    () => || {
                        eprintln!("{}", self.emu.borrow().trace());
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "peek",
                command! {
                    "Peek a value from memory",
                    (addr:String) => |addr: String| {
                        let emu = self.emu.borrow();
                        let addr = parse_addr(&addr)?;
                        eprintln!("{:02X}={:02X}", addr, emu.ram.read(addr));
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "b",
                command! {
                    "Pause when the program counter reaches an address",
                    (addr:String) => |addr: String| {
                        let addr = parse_addr(&addr)?;
                        self.emu.borrow_mut().breakpoints.insert(addr);
                        eprintln!("breakpoint set at {:02X}", addr);
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "halt",
                command! {
                    "Halt execution",
                    () => || {
                        self.emu.borrow_mut().state = EmuState::Halted;
                        Ok(CommandStatus::Quit)
                    }
                },
            )
            .build()?;
        eprintln!("LS-8 Debug REPL");
        'repl: loop {
            eprintln!();
            {
                let emu = self.emu.borrow();
                let pc = emu.registers.pc;
                match emu.fetch(pc) {
                    Ok(instr) => eprintln!("Next instruction:\n[pc={:02X}] --> {}", pc, instr),
                    Err(e) => eprintln!("Next instruction:\n[pc={:02X}] --> ({})", pc, e),
                }
            }

            let status = repl.next()?;
            if let LoopStatus::Break = status {
                break 'repl;
            }
            {
                let emu = self.emu.borrow();
                if let EmuState::Halted = emu.state {
                    break 'repl;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr("244").unwrap(), 244);
        assert_eq!(parse_addr("0xF4").unwrap(), 0xF4);
        assert_eq!(parse_addr("ff").unwrap(), 0xFF);
        assert!(parse_addr("0x100").is_err());
        assert!(parse_addr("zz").is_err());
    }
}

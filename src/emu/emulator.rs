use std::{
    collections::VecDeque,
    io::{self, Stdout, Write},
};

use anyhow::Result;
use rustc_hash::FxHashSet;

use crate::plat::{Instruction, Opcode, PlatformError};

use super::{
    debugger::Debugger,
    dispatch::{Dispatcher, Flow},
    ram::{offset_addr, Ram},
    registers::Registers,
    trace::Trace,
    EResult, EmuError,
};

/// The emulator's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmuState {
    /// The emulator is allowed to run.
    Running,
    /// Stops execution and hands control to the debugger, without putting the emulator in a hard [`Halted`][EmuState::Halted] state.
    Pause,
    /// Halt execution.
    Halted,
}

/// Knobs for a single emulator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmuConfig {
    /// Fail with [`EmuError::CycleLimitExceeded`] once this many instructions have executed.
    pub max_cycles: Option<u64>,
    /// How many executed instructions to remember for the debugger's backtrace.
    pub history_len: usize,
    /// Start in [`EmuState::Pause`], dropping straight into the debugger.
    pub start_paused: bool,
    /// Addresses that pause execution when the program counter reaches them.
    pub breakpoints: Vec<u8>,
}

impl Default for EmuConfig {
    fn default() -> Self {
        Self {
            max_cycles: None,
            history_len: 32,
            start_paused: false,
            breakpoints: Vec::new(),
        }
    }
}

/// The main emulation context for LS-8.
///
/// `PRN` output goes to `W`, which is stdout for the command line and a buffer in tests.
pub struct Emulator<W = Stdout> {
    pub registers: Registers,
    pub ram: Ram,
    pub state: EmuState,
    pub instr_history: VecDeque<(u8, Instruction)>,
    pub breakpoints: FxHashSet<u8>,
    pub cycles: u64,
    config: EmuConfig,
    dispatch: Dispatcher<W>,
    pub(super) out: W,
}

impl Emulator<Stdout> {
    /// Loads a binary program into a new [Emulator] instance that prints to stdout.
    pub fn with_stdout(program: &[u8], config: EmuConfig) -> EResult<Self> {
        Self::new(program, config, io::stdout())
    }
}

impl<W: Write> Emulator<W> {
    /// Loads a binary program into a new [Emulator] instance.
    ///
    /// # Errors
    ///
    /// This function will return an error if the program does not fit in memory.
    pub fn new(program: &[u8], config: EmuConfig, out: W) -> EResult<Self> {
        let mut ram = Ram::new();
        ram.load(program)?;
        let state = if config.start_paused {
            EmuState::Pause
        } else {
            EmuState::Running
        };
        log::debug!("loaded {} byte program", program.len());
        Ok(Self {
            registers: Registers::new(),
            ram,
            state,
            instr_history: VecDeque::with_capacity(config.history_len),
            breakpoints: config.breakpoints.iter().copied().collect(),
            cycles: 0,
            config,
            dispatch: Dispatcher::new(),
            out,
        })
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs the emulator until it halts, entering the debugger whenever it pauses.
    pub fn run_until_halt(&mut self) -> Result<()> {
        loop {
            match self.state {
                EmuState::Running => self.step()?,
                EmuState::Halted => break,
                EmuState::Pause => self.debug()?,
            }
        }
        self.out.flush()?;
        Ok(())
    }

    /// Runs the emulator until it halts, ignoring pauses.
    pub fn run(&mut self) -> EResult<()> {
        while self.state != EmuState::Halted {
            self.step()?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Executes a single instruction.
    pub fn step(&mut self) -> EResult<()> {
        if self.state == EmuState::Halted {
            return Ok(());
        }
        if let Some(limit) = self.config.max_cycles {
            if self.cycles >= limit {
                return Err(EmuError::CycleLimitExceeded(limit));
            }
        }
        log::trace!("{}", self.trace());

        let pc = self.registers.pc;
        let instr = self.fetch(pc)?;
        log::debug!(">>> [{:02X}] {}", pc, instr);
        let handler = self.dispatch.lookup(instr.op)?;
        let flow = handler(self, instr)?;
        self.cycles += 1;
        self.record(pc, instr);

        match flow {
            Flow::Advance => self.registers.pc = offset_addr(pc, instr.len())?,
            Flow::Jump(addr) => self.registers.pc = addr,
            Flow::Halt => {
                self.state = EmuState::Halted;
                log::info!("halted after {} instructions", self.cycles);
                return Ok(());
            }
        }
        if self.breakpoints.contains(&self.registers.pc) {
            log::info!("breakpoint at {:02X}", self.registers.pc);
            self.state = EmuState::Pause;
        }
        Ok(())
    }

    /// Decodes the instruction at `pc` without executing it.
    ///
    /// Only the operand bytes the opcode actually uses are read.
    pub fn fetch(&self, pc: u8) -> EResult<Instruction> {
        let opcode = self.ram.read(pc);
        let op = Opcode::try_from(opcode).map_err(|_| EmuError::UnknownOpcode { opcode, pc })?;
        let mut operands = [0u8; 2];
        for i in 0..op.operand_count() {
            operands[i as usize] = self.ram.read_offset(pc, i + 1)?;
        }
        Instruction::decode(op, &operands[..op.operand_count() as usize]).map_err(|e| match e {
            PlatformError::InvalidRegister(index) => EmuError::InvalidRegister { index, pc },
            _ => EmuError::UnsupportedOperation(op),
        })
    }

    /// Takes a read-only snapshot of the CPU state for diagnostics.
    pub fn trace(&self) -> Trace {
        Trace::capture(&self.registers, &self.ram)
    }

    /// Decrements the stack pointer and returns its new value.
    pub(super) fn dec_sp(&mut self) -> EResult<u8> {
        let sp = self.registers.sp();
        let sp = sp.checked_sub(1).ok_or(EmuError::StackOverflow(sp))?;
        self.registers.set_sp(sp);
        Ok(sp)
    }

    /// Increments the stack pointer.
    pub(super) fn inc_sp(&mut self) -> EResult<()> {
        let sp = self.registers.sp();
        let sp = sp.checked_add(1).ok_or(EmuError::StackUnderflow(sp))?;
        self.registers.set_sp(sp);
        Ok(())
    }

    fn record(&mut self, pc: u8, instr: Instruction) {
        if self.config.history_len == 0 {
            return;
        }
        if self.instr_history.len() == self.config.history_len {
            self.instr_history.pop_front();
        }
        self.instr_history.push_back((pc, instr));
    }

    pub fn debug(&mut self) -> Result<()> {
        Debugger::new(self).repl()?;
        if self.state == EmuState::Pause {
            self.state = EmuState::Running;
        }
        Ok(())
    }
}

//! Opcode dispatch: a table from [Opcode] to the handler that executes it.

use std::io::Write;

use rustc_hash::FxHashMap;

use crate::plat::{InstrFormat, Instruction, Opcode, Register};

use super::{
    alu::{Alu, AluMode},
    emulator::Emulator,
    ram::offset_addr,
    registers::Fl,
    EResult, EmuError,
};

/// What the execution loop does with the program counter once a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Move past the current instruction.
    Advance,
    /// Continue at the given address.
    Jump(u8),
    /// Stop the clock.
    Halt,
}

/// Executes one decoded instruction against the emulator.
pub type Handler<W> = fn(&mut Emulator<W>, Instruction) -> EResult<Flow>;

pub struct Dispatcher<W> {
    table: FxHashMap<Opcode, Handler<W>>,
}

impl<W: Write> Dispatcher<W> {
    /// Creates a new [`Dispatcher`] with a handler for every opcode in the instruction set.
    pub fn new() -> Self {
        let mut table: FxHashMap<Opcode, Handler<W>> = FxHashMap::default();
        table.insert(Opcode::Hlt, |_, _| Ok(Flow::Halt));
        table.insert(Opcode::Ldi, Emulator::ldi);
        table.insert(Opcode::Prn, Emulator::prn);
        table.insert(Opcode::Add, Emulator::alu);
        table.insert(Opcode::Mul, Emulator::alu);
        table.insert(Opcode::Cmp, Emulator::alu);
        table.insert(Opcode::Jmp, Emulator::jmp);
        table.insert(Opcode::Jeq, Emulator::jeq);
        table.insert(Opcode::Jne, Emulator::jne);
        table.insert(Opcode::Push, Emulator::push);
        table.insert(Opcode::Pop, Emulator::pop);
        table.insert(Opcode::Call, Emulator::call);
        table.insert(Opcode::Ret, Emulator::ret);
        Self { table }
    }

    /// Looks up the handler for `op`.
    pub fn lookup(&self, op: Opcode) -> EResult<Handler<W>> {
        self.table
            .get(&op)
            .copied()
            .ok_or(EmuError::UnsupportedOperation(op))
    }
}

impl<W: Write> Default for Dispatcher<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Emulator<W> {
    fn ldi(&mut self, instr: Instruction) -> EResult<Flow> {
        let InstrFormat::RI(reg, imm) = instr.format else {
            return Err(EmuError::UnsupportedOperation(instr.op));
        };
        self.registers.set(reg, imm);
        Ok(Flow::Advance)
    }

    fn prn(&mut self, instr: Instruction) -> EResult<Flow> {
        let reg = single_register(instr)?;
        let value = self.registers.get(reg);
        writeln!(self.out, "{}", value)?;
        Ok(Flow::Advance)
    }

    fn alu(&mut self, instr: Instruction) -> EResult<Flow> {
        let InstrFormat::RR(a, b) = instr.format else {
            return Err(EmuError::UnsupportedOperation(instr.op));
        };
        let mode = AluMode::try_from(instr.op)?;
        Alu::execute(mode, &mut self.registers, a, b);
        Ok(Flow::Advance)
    }

    fn jmp(&mut self, instr: Instruction) -> EResult<Flow> {
        let reg = single_register(instr)?;
        Ok(Flow::Jump(self.registers.get(reg)))
    }

    fn jeq(&mut self, instr: Instruction) -> EResult<Flow> {
        let reg = single_register(instr)?;
        if self.registers.fl.contains(Fl::EQUAL) {
            Ok(Flow::Jump(self.registers.get(reg)))
        } else {
            Ok(Flow::Advance)
        }
    }

    fn jne(&mut self, instr: Instruction) -> EResult<Flow> {
        let reg = single_register(instr)?;
        if self.registers.fl.contains(Fl::EQUAL) {
            Ok(Flow::Advance)
        } else {
            Ok(Flow::Jump(self.registers.get(reg)))
        }
    }

    fn push(&mut self, instr: Instruction) -> EResult<Flow> {
        let reg = single_register(instr)?;
        let sp = self.dec_sp()?;
        // read after the decrement, so `PUSH SP` stores the new stack pointer
        let value = self.registers.get(reg);
        self.ram.write(sp, value);
        Ok(Flow::Advance)
    }

    fn pop(&mut self, instr: Instruction) -> EResult<Flow> {
        let reg = single_register(instr)?;
        let value = self.ram.read(self.registers.sp());
        self.registers.set(reg, value);
        self.inc_sp()?;
        Ok(Flow::Advance)
    }

    fn call(&mut self, instr: Instruction) -> EResult<Flow> {
        let reg = single_register(instr)?;
        let return_addr = offset_addr(self.registers.pc, instr.len())?;
        let sp = self.dec_sp()?;
        self.ram.write(sp, return_addr);
        Ok(Flow::Jump(self.registers.get(reg)))
    }

    fn ret(&mut self, _instr: Instruction) -> EResult<Flow> {
        let return_addr = self.ram.read(self.registers.sp());
        self.inc_sp()?;
        Ok(Flow::Jump(return_addr))
    }
}

fn single_register(instr: Instruction) -> EResult<Register> {
    match instr.format {
        InstrFormat::R(reg) => Ok(reg),
        _ => Err(EmuError::UnsupportedOperation(instr.op)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_opcode_has_a_handler() {
        let dispatch = Dispatcher::<Vec<u8>>::new();
        for op in Opcode::ALL {
            assert!(dispatch.lookup(op).is_ok(), "no handler for {op}");
        }
    }

    #[test]
    fn test_handler_rejects_mismatched_format() {
        let mut emu = Emulator::new(&[], Default::default(), Vec::new()).unwrap();
        let dispatch = Dispatcher::<Vec<u8>>::new();
        let bogus = Instruction {
            op: Opcode::Jmp,
            format: InstrFormat::RR(Register::R0, Register::R1),
        };
        let handler = dispatch.lookup(Opcode::Jmp).unwrap();
        let err = handler(&mut emu, bogus).unwrap_err();
        assert!(matches!(err, EmuError::UnsupportedOperation(Opcode::Jmp)));
    }

    #[test]
    fn test_jne_without_prior_compare_jumps() {
        let mut emu = Emulator::new(&[], Default::default(), Vec::new()).unwrap();
        emu.registers.set(Register::R2, 0x40);
        let instr = Instruction {
            op: Opcode::Jne,
            format: InstrFormat::R(Register::R2),
        };
        assert_eq!(emu.jne(instr).unwrap(), Flow::Jump(0x40));
        let instr = Instruction {
            op: Opcode::Jeq,
            ..instr
        };
        assert_eq!(emu.jeq(instr).unwrap(), Flow::Advance);
    }
}

use std::fmt;

use crate::plat::REGISTER_COUNT;

use super::{ram::Ram, registers::Registers};

/// A read-only snapshot of the CPU: the program counter, the three bytes starting at it, and every register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trace {
    pub pc: u8,
    pub bytes: [u8; 3],
    pub registers: [u8; REGISTER_COUNT],
}

impl Trace {
    pub fn capture(regs: &Registers, ram: &Ram) -> Self {
        let pc = regs.pc;
        // display only, so reading past 0xFF wraps instead of failing
        Self {
            pc,
            bytes: [
                ram.read(pc),
                ram.read(pc.wrapping_add(1)),
                ram.read(pc.wrapping_add(2)),
            ],
            registers: regs.gp,
        }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc, self.bytes[0], self.bytes[1], self.bytes[2]
        )?;
        for reg in self.registers {
            write!(f, " {:02X}", reg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plat::Register;

    #[test]
    fn test_trace_format() {
        let mut ram = Ram::new();
        ram.load(&[0x82, 0x00, 0x08, 0x47]).unwrap();
        let mut regs = Registers::new();
        regs.set(Register::R2, 0xAB);
        let trace = Trace::capture(&regs, &ram);
        assert_eq!(
            trace.to_string(),
            "TRACE: 00 | 82 00 08 | 00 00 AB 00 00 00 00 F4"
        );
    }

    #[test]
    fn test_trace_wraps_at_end_of_memory() {
        let mut ram = Ram::new();
        ram.write(0xFF, 0x01);
        ram.write(0x00, 0x82);
        let mut regs = Registers::new();
        regs.pc = 0xFF;
        let trace = Trace::capture(&regs, &ram);
        assert_eq!(trace.bytes, [0x01, 0x82, 0x00]);
    }
}

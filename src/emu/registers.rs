use crate::plat::{Register, REGISTER_COUNT, STACK_TOP};

bitflags::bitflags! {
    /// The CPU status flags register. Only `CMP` writes it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fl: u8 {
        /// Set if the left operand of the last comparison equalled the right one.
        const EQUAL = 1 << 0;
        /// Set if the left operand of the last comparison was greater.
        const GREATER = 1 << 1;
        /// Set if the left operand of the last comparison was smaller.
        const LESS = 1 << 2;
    }
}

/// The register file, program counter and flags of the LS-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub gp: [u8; REGISTER_COUNT],
    pub pc: u8,
    pub fl: Fl,
}

impl Registers {
    /// Creates a register file in its reset state.
    pub fn new() -> Self {
        let mut gp = [0u8; REGISTER_COUNT];
        gp[Register::SP.index()] = STACK_TOP;
        Self {
            gp,
            pc: 0,
            fl: Fl::empty(),
        }
    }

    pub fn get(&self, reg: Register) -> u8 {
        self.gp[reg.index()]
    }

    pub fn set(&mut self, reg: Register, value: u8) {
        self.gp[reg.index()] = value;
    }

    pub fn sp(&self) -> u8 {
        self.get(Register::SP)
    }

    pub fn set_sp(&mut self, value: u8) {
        self.set(Register::SP, value);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_state() {
        let regs = Registers::new();
        assert_eq!(regs.gp, [0, 0, 0, 0, 0, 0, 0, 0xF4]);
        assert_eq!(regs.pc, 0);
        assert!(regs.fl.is_empty());
    }

    #[test]
    fn test_sp_is_register_seven() {
        let mut regs = Registers::new();
        regs.set(Register::try_from(7).unwrap(), 0x10);
        assert_eq!(regs.sp(), 0x10);
        regs.set_sp(0x20);
        assert_eq!(regs.gp[7], 0x20);
    }
}

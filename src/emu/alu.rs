use std::cmp::Ordering;

use crate::plat::{Opcode, Register};

use super::{registers::Fl, registers::Registers, EmuError};

// The ALU's mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AluMode {
    Add = 0,
    Mul,
    Cmp,
}

impl TryFrom<Opcode> for AluMode {
    type Error = EmuError;

    fn try_from(op: Opcode) -> Result<Self, EmuError> {
        match op {
            Opcode::Add => Ok(Self::Add),
            Opcode::Mul => Ok(Self::Mul),
            Opcode::Cmp => Ok(Self::Cmp),
            op => Err(EmuError::UnsupportedOperation(op)),
        }
    }
}

/// The ALU (Arithmetic and Logic Unit) of LS-8.
///
/// Stateless: results go back into the register file, comparisons into its flags.
/// Arithmetic wraps to 8 bits.
pub struct Alu;

impl Alu {
    /// Performs `mode` on the values of registers `a` and `b`.
    pub fn execute(mode: AluMode, regs: &mut Registers, a: Register, b: Register) {
        let left = regs.get(a);
        let right = regs.get(b);
        match mode {
            AluMode::Add => regs.set(a, left.wrapping_add(right)),
            AluMode::Mul => regs.set(a, left.wrapping_mul(right)),
            AluMode::Cmp => {
                regs.fl = match left.cmp(&right) {
                    Ordering::Equal => Fl::EQUAL,
                    Ordering::Less => Fl::LESS,
                    Ordering::Greater => Fl::GREATER,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs_with(a: u8, b: u8) -> Registers {
        let mut regs = Registers::new();
        regs.set(Register::R0, a);
        regs.set(Register::R1, b);
        regs
    }

    #[test]
    fn test_add_wraps() {
        let mut regs = regs_with(200, 100);
        Alu::execute(AluMode::Add, &mut regs, Register::R0, Register::R1);
        assert_eq!(regs.get(Register::R0), 44);
        assert_eq!(regs.get(Register::R1), 100);
    }

    #[test]
    fn test_mul_wraps() {
        let mut regs = regs_with(8, 9);
        Alu::execute(AluMode::Mul, &mut regs, Register::R0, Register::R1);
        assert_eq!(regs.get(Register::R0), 72);

        let mut regs = regs_with(16, 17);
        Alu::execute(AluMode::Mul, &mut regs, Register::R0, Register::R1);
        assert_eq!(regs.get(Register::R0), (16u32 * 17 % 256) as u8);
    }

    #[test]
    fn test_cmp_sets_exactly_one_flag() {
        for (a, b, expected) in [(5, 5, Fl::EQUAL), (1, 5, Fl::LESS), (9, 5, Fl::GREATER)] {
            let mut regs = regs_with(a, b);
            regs.fl = Fl::all();
            Alu::execute(AluMode::Cmp, &mut regs, Register::R0, Register::R1);
            assert_eq!(regs.fl, expected);
            assert_eq!(regs.get(Register::R0), a);
        }
    }

    #[test]
    fn test_unsupported_operation() {
        assert_eq!(AluMode::try_from(Opcode::Add).unwrap(), AluMode::Add);
        let err = AluMode::try_from(Opcode::Jmp).unwrap_err();
        assert!(matches!(err, EmuError::UnsupportedOperation(Opcode::Jmp)));
    }
}

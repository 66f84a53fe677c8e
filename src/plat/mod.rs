//! Common platform code between LS-8's other modules.

use std::fmt;

use thiserror::Error;

/// An error for the core platform of LS-8.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    #[error("invalid opcode {0:#010b}")]
    InvalidOpcode(u8),
    #[error("invalid register index {0}")]
    InvalidRegister(u8),
    #[error("invalid instruction")]
    InvalidInstruction,
}

/// Type alias for Result<T, [PlatformError]>.
pub type PResult<T> = Result<T, PlatformError>;

/// Number of addressable bytes of memory.
pub const MEMORY_SIZE: usize = 256;

/// Number of registers in the register file.
pub const REGISTER_COUNT: usize = 8;

/// Value of [SP](Register::SP) after reset.
pub const STACK_TOP: u8 = 0xF4;

/// The eight registers in LS-8.
///
/// `R0` - `R6` are general purpose registers. `SP` doubles as register 7 and the stack pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    /// Stack pointer
    SP,
}

impl Register {
    /// All registers in index order.
    pub const ALL: [Register; REGISTER_COUNT] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::SP,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Register {
    type Error = PlatformError;

    fn try_from(value: u8) -> Result<Self, PlatformError> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(PlatformError::InvalidRegister(value))
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SP => write!(f, "SP"),
            reg => write!(f, "R{}", *reg as u8),
        }
    }
}

/// The opcodes understood by the LS-8 decoder.
///
/// Each variant's discriminant is the exact byte that appears in program memory.
/// Instruction length is fixed per opcode (see [Opcode::len]).
///
/// Flag notes ([CMP][Opcode::Cmp], [JEQ][Opcode::Jeq], [JNE][Opcode::Jne]):
///
/// - Only `CMP` writes the flags, and it always leaves exactly one of Equal, Less-than or Greater-than set.
/// - `JNE` jumps whenever Equal is clear, including before any `CMP` has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /* Misc */
    /// Stops the clock
    Hlt = 0b0000_0001,
    /// `regA <- (immediate value)`
    Ldi = 0b1000_0010,
    /// Prints the decimal value of `regA`
    Prn = 0b0100_0111,

    /* ALU */
    /// `regA <- regA + regB`
    Add = 0b1010_0000,
    /// `regA <- regA * regB`
    Mul = 0b1010_0010,
    /// Compares `regA` with `regB`, setting the flags
    Cmp = 0b1010_0111,

    /* Branching */
    /// `PC <- regA`
    Jmp = 0b0101_0100,
    /// "Jump if Equal"
    /// ```text
    /// if FL.Equal == 1 {
    ///     PC <- regA
    /// }
    /// ```
    Jeq = 0b0101_0101,
    /// "Jump if Not Equal"
    /// ```text
    /// if FL.Equal == 0 {
    ///     PC <- regA
    /// }
    /// ```
    Jne = 0b0101_0110,

    /* Stack */
    /// `SP <- SP - 1; mem[SP] <- regA`
    Push = 0b0100_0101,
    /// `regA <- mem[SP]; SP <- SP + 1`
    Pop = 0b0100_0110,
    /// `SP <- SP - 1; mem[SP] <- PC + 2; PC <- regA`
    Call = 0b0101_0000,
    /// `PC <- mem[SP]; SP <- SP + 1`
    Ret = 0b0001_0001,
}

impl Opcode {
    /// Every opcode in the instruction set.
    pub const ALL: [Opcode; 13] = [
        Self::Hlt,
        Self::Ldi,
        Self::Prn,
        Self::Add,
        Self::Mul,
        Self::Cmp,
        Self::Jmp,
        Self::Jeq,
        Self::Jne,
        Self::Push,
        Self::Pop,
        Self::Call,
        Self::Ret,
    ];

    /// Number of operand bytes following the opcode.
    pub fn operand_count(self) -> u8 {
        match self {
            Self::Hlt | Self::Ret => 0,
            Self::Prn
            | Self::Jmp
            | Self::Jeq
            | Self::Jne
            | Self::Push
            | Self::Pop
            | Self::Call => 1,
            Self::Ldi | Self::Add | Self::Mul | Self::Cmp => 2,
        }
    }

    /// Total instruction length in bytes, opcode included.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(self) -> u8 {
        1 + self.operand_count()
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Hlt => "HLT",
            Self::Ldi => "LDI",
            Self::Prn => "PRN",
            Self::Add => "ADD",
            Self::Mul => "MUL",
            Self::Cmp => "CMP",
            Self::Jmp => "JMP",
            Self::Jeq => "JEQ",
            Self::Jne => "JNE",
            Self::Push => "PUSH",
            Self::Pop => "POP",
            Self::Call => "CALL",
            Self::Ret => "RET",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = PlatformError;

    fn try_from(value: u8) -> Result<Self, PlatformError> {
        Self::ALL
            .into_iter()
            .find(|op| *op as u8 == value)
            .ok_or(PlatformError::InvalidOpcode(value))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Operand layouts used by the LS-8 instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrFormat {
    /// `<Opcode, Register, Immediate>`
    RI(Register, u8),
    /// `<Opcode, Register, Register>`
    RR(Register, Register),
    /// `<Opcode, Register>`
    R(Register),
    /// `<Opcode>`
    OpOnly,
}

/// A decoded LS-8 instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub op: Opcode,
    pub format: InstrFormat,
}

impl Instruction {
    /// Checks if this instruction has a valid format for its opcode.
    ///
    /// # Errors
    ///
    /// This function will return an error if the instruction's format is invalid for its opcode.
    pub fn validate(self) -> PResult<()> {
        #[doc(hidden)]
        macro_rules! assert_format {
            ($fmt:pat) => {
                if matches!(self.format, $fmt) {
                    Ok(())
                } else {
                    Err(PlatformError::InvalidInstruction)
                }
            };
        }
        match self.op {
            Opcode::Hlt | Opcode::Ret => assert_format!(InstrFormat::OpOnly),
            Opcode::Ldi => assert_format!(InstrFormat::RI(_, _)),
            Opcode::Add | Opcode::Mul | Opcode::Cmp => assert_format!(InstrFormat::RR(_, _)),
            Opcode::Prn
            | Opcode::Jmp
            | Opcode::Jeq
            | Opcode::Jne
            | Opcode::Push
            | Opcode::Pop
            | Opcode::Call => assert_format!(InstrFormat::R(_)),
        }
    }

    /// Builds an [Instruction] from an opcode and the operand bytes that follow it.
    ///
    /// Only the first [Opcode::operand_count] bytes of `operands` are looked at.
    ///
    /// # Errors
    ///
    /// This function will return an error if too few operand bytes are given, or if an operand
    /// that names a register is not a valid register index.
    pub fn decode(op: Opcode, operands: &[u8]) -> PResult<Self> {
        if operands.len() < op.operand_count() as usize {
            return Err(PlatformError::InvalidInstruction);
        }
        let format = match op {
            Opcode::Hlt | Opcode::Ret => InstrFormat::OpOnly,
            Opcode::Ldi => InstrFormat::RI(operands[0].try_into()?, operands[1]),
            Opcode::Add | Opcode::Mul | Opcode::Cmp => {
                InstrFormat::RR(operands[0].try_into()?, operands[1].try_into()?)
            }
            Opcode::Prn
            | Opcode::Jmp
            | Opcode::Jeq
            | Opcode::Jne
            | Opcode::Push
            | Opcode::Pop
            | Opcode::Call => InstrFormat::R(operands[0].try_into()?),
        };
        Ok(Self { op, format })
    }

    /// Decodes the instruction at the start of `bytes`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the bytes do not hold a valid instruction.
    pub fn from_bytes(bytes: &[u8]) -> PResult<Self> {
        let (&op, operands) = bytes
            .split_first()
            .ok_or(PlatformError::InvalidInstruction)?;
        Self::decode(op.try_into()?, operands)
    }

    /// Generates the machine-code bytes for this instruction.
    ///
    /// # Errors
    ///
    /// This function will return an error if the instruction's format is invalid for its opcode.
    pub fn to_bytes(self) -> PResult<Vec<u8>> {
        self.validate()?;
        let mut out = vec![self.op as u8];
        match self.format {
            InstrFormat::RI(a, imm) => out.extend([a as u8, imm]),
            InstrFormat::RR(a, b) => out.extend([a as u8, b as u8]),
            InstrFormat::R(a) => out.push(a as u8),
            InstrFormat::OpOnly => {}
        }
        Ok(out)
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(self) -> u8 {
        self.op.len()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            InstrFormat::RI(a, imm) => write!(f, "{} {} {}", self.op, a, imm),
            InstrFormat::RR(a, b) => write!(f, "{} {} {}", self.op, a, b),
            InstrFormat::R(a) => write!(f, "{} {}", self.op, a),
            InstrFormat::OpOnly => write!(f, "{}", self.op),
        }
    }
}

/// Assembles a list of instructions into a flat program image.
///
/// # Errors
///
/// This function will return an error if any instruction's format is invalid for its opcode.
pub fn assemble(instrs: &[Instruction]) -> PResult<Vec<u8>> {
    let mut out = Vec::new();
    for instr in instrs {
        out.extend(instr.to_bytes()?);
    }
    Ok(out)
}

//! The emulator/debugger module for LS-8.

use thiserror::Error;

use crate::plat::Opcode;

pub mod alu;
pub mod debugger;
pub mod dispatch;
pub mod emulator;
pub mod ram;
pub mod registers;
pub mod trace;

#[derive(Debug, Error)]
pub enum EmuError {
    #[error("unknown instruction {opcode} at address {pc}")]
    UnknownOpcode { opcode: u8, pc: u8 },
    #[error("unsupported ALU operation: {0}")]
    UnsupportedOperation(Opcode),
    #[error("invalid register {index} in instruction at address {pc}")]
    InvalidRegister { index: u8, pc: u8 },
    #[error("address {0:#X} out of range")]
    AddressOutOfRange(u16),
    #[error("stack overflow (SP={0:#04X})")]
    StackOverflow(u8),
    #[error("stack underflow (SP={0:#04X})")]
    StackUnderflow(u8),
    #[error("program of {0} bytes does not fit in memory")]
    ProgramTooLarge(usize),
    #[error("cycle limit of {0} exceeded")]
    CycleLimitExceeded(u64),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Type alias for Result<T, [EmuError]>.
pub type EResult<T> = Result<T, EmuError>;

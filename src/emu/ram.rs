use crate::plat::MEMORY_SIZE;

use super::{EResult, EmuError};

/// The LS-8's flat, byte-addressed main memory.
pub struct Ram {
    pub memory: Box<[u8]>,
}

impl Ram {
    /// Creates a new [`Ram`] instance, allocating and initializing its memory to [0u8; 256].
    pub fn new() -> Self {
        Self {
            memory: vec![0u8; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    /// Reads the byte stored at `addr`.
    pub fn read(&self, addr: u8) -> u8 {
        self.memory[addr as usize]
    }

    /// Stores `value` at `addr`.
    pub fn write(&mut self, addr: u8, value: u8) {
        self.memory[addr as usize] = value;
    }

    /// Reads the byte at `base + offset`, failing if the sum leaves the address space.
    pub fn read_offset(&self, base: u8, offset: u8) -> EResult<u8> {
        Ok(self.read(offset_addr(base, offset)?))
    }

    /// Copies `program` into memory starting at address 0. The rest of memory is left as is.
    pub fn load(&mut self, program: &[u8]) -> EResult<()> {
        if program.len() > MEMORY_SIZE {
            return Err(EmuError::ProgramTooLarge(program.len()));
        }
        self.memory[..program.len()].copy_from_slice(program);
        Ok(())
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes `base + offset` as an address, or [`EmuError::AddressOutOfRange`] past 0xFF.
pub fn offset_addr(base: u8, offset: u8) -> EResult<u8> {
    base.checked_add(offset)
        .ok_or(EmuError::AddressOutOfRange(base as u16 + offset as u16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let mut ram = Ram::new();
        assert_eq!(ram.read(0xFF), 0);
        ram.write(0xFF, 42);
        ram.write(0, 7);
        assert_eq!(ram.read(0xFF), 42);
        assert_eq!(ram.read(0), 7);
    }

    #[test]
    fn test_load() {
        let mut ram = Ram::new();
        ram.load(&[1, 2, 3]).unwrap();
        assert_eq!(&ram.memory[..4], &[1, 2, 3, 0]);

        let full = vec![0xAA; MEMORY_SIZE];
        ram.load(&full).unwrap();
        assert_eq!(ram.read(0xFF), 0xAA);
    }

    #[test]
    fn test_load_too_large() {
        let mut ram = Ram::new();
        let err = ram.load(&[0; MEMORY_SIZE + 1]).unwrap_err();
        assert!(matches!(err, EmuError::ProgramTooLarge(257)));
    }

    #[test]
    fn test_read_offset_bounds() {
        let mut ram = Ram::new();
        ram.write(0xFF, 9);
        assert_eq!(ram.read_offset(0xFE, 1).unwrap(), 9);
        let err = ram.read_offset(0xFE, 2).unwrap_err();
        assert!(matches!(err, EmuError::AddressOutOfRange(0x100)));
    }
}

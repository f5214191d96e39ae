use crate::errors::errors::ErrorImpl;

pub const PAGE_SIZE: usize = 65536;

/// Byte-addressed memory shared by every unit run on the same machine.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearMemory {
    bytes: Vec<u8>,
}

impl Default for LinearMemory {
    fn default() -> Self {
        LinearMemory::new(1)
    }
}

impl LinearMemory {
    pub fn new(pages: usize) -> Self {
        LinearMemory {
            bytes: vec![0; pages * PAGE_SIZE],
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn range(&self, address: i32) -> Result<std::ops::Range<usize>, ErrorImpl> {
        let start = address as i64;
        if start < 0 || start + 4 > self.bytes.len() as i64 {
            return Err(ErrorImpl::Trap {
                message: format!("out of bounds memory access at address {}", address),
            });
        }

        let start = start as usize;
        Ok(start..start + 4)
    }

    pub fn load(&self, address: i32) -> Result<i32, ErrorImpl> {
        let range = self.range(address)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[range]);
        Ok(i32::from_le_bytes(word))
    }

    pub fn store(&mut self, address: i32, value: i32) -> Result<(), ErrorImpl> {
        let range = self.range(address)?;
        self.bytes[range].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

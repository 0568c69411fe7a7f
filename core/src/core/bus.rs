/// Byte-addressed 16-bit memory interface seen by the reference CPU.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Side-effect free read, used by the disassembler and state dumps.
    /// Default maps to a plain read; override when reads have side effects.
    fn peek(&mut self, addr: u16) -> u8 {
        self.read(addr)
    }

    /// Read a little-endian word. The high byte address wraps within 64 KiB.
    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }
}

/// Flat 64 KiB RAM, no peripherals.
pub struct FlatBus {
    pub memory: Box<[u8; 0x10000]>,
}

impl FlatBus {
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
        }
    }

    /// Copy `data` into memory starting at `addr`. Writes past $FFFF wrap to $0000.
    pub fn load(&mut self, addr: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.memory[addr.wrapping_add(i as u16) as usize] = byte;
        }
    }

    /// Copy `len` bytes starting at `addr`, wrapping at $FFFF.
    pub fn slice(&self, addr: u16, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.memory[addr.wrapping_add(i as u16) as usize])
            .collect()
    }
}

impl Default for FlatBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for FlatBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }
}

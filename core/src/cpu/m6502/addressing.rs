use super::M6502;
use crate::core::Bus;
use crate::opcodes::AddressingMode;

/// Decoded operand, after all operand bytes have been fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Operand {
    None,
    Accumulator,
    Immediate(u8),
    /// Effective address; `page_crossed` is set when indexing carried into the high byte.
    Address { addr: u16, page_crossed: bool },
    Relative(i8),
}

impl M6502 {
    #[inline]
    fn fetch<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let byte = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    #[inline]
    fn fetch_word<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch(bus) as u16;
        let hi = self.fetch(bus) as u16;
        (hi << 8) | lo
    }

    /// Read a pointer from zero page; the high byte wraps within page 0.
    #[inline]
    fn read_zp_pointer<B: Bus + ?Sized>(bus: &mut B, zp: u8) -> u16 {
        let lo = bus.read(zp as u16) as u16;
        let hi = bus.read(zp.wrapping_add(1) as u16) as u16;
        (hi << 8) | lo
    }

    fn indexed(base: u16, index: u8) -> Operand {
        let addr = base.wrapping_add(index as u16);
        Operand::Address {
            addr,
            page_crossed: (base & 0xFF00) != (addr & 0xFF00),
        }
    }

    pub(crate) fn resolve_operand<B: Bus + ?Sized>(
        &mut self,
        mode: AddressingMode,
        bus: &mut B,
    ) -> Operand {
        match mode {
            AddressingMode::Implicit => Operand::None,
            AddressingMode::Accumulator => Operand::Accumulator,
            AddressingMode::Immediate => Operand::Immediate(self.fetch(bus)),
            AddressingMode::ZeroPage => Operand::Address {
                addr: self.fetch(bus) as u16,
                page_crossed: false,
            },
            AddressingMode::ZeroPageX => Operand::Address {
                addr: self.fetch(bus).wrapping_add(self.x) as u16,
                page_crossed: false,
            },
            AddressingMode::ZeroPageY => Operand::Address {
                addr: self.fetch(bus).wrapping_add(self.y) as u16,
                page_crossed: false,
            },
            AddressingMode::Absolute => Operand::Address {
                addr: self.fetch_word(bus),
                page_crossed: false,
            },
            AddressingMode::AbsoluteX => {
                let base = self.fetch_word(bus);
                Self::indexed(base, self.x)
            }
            AddressingMode::AbsoluteY => {
                let base = self.fetch_word(bus);
                Self::indexed(base, self.y)
            }
            AddressingMode::IndexedIndirect => {
                let zp = self.fetch(bus).wrapping_add(self.x);
                Operand::Address {
                    addr: Self::read_zp_pointer(bus, zp),
                    page_crossed: false,
                }
            }
            AddressingMode::IndirectIndexed => {
                let zp = self.fetch(bus);
                let base = Self::read_zp_pointer(bus, zp);
                Self::indexed(base, self.y)
            }
            AddressingMode::Relative => Operand::Relative(self.fetch(bus) as i8),
            AddressingMode::Indirect => {
                // NMOS bug: the pointer high byte is fetched without carrying into the page.
                let ptr = self.fetch_word(bus);
                let lo = bus.read(ptr) as u16;
                let hi = bus.read((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF)) as u16;
                Operand::Address {
                    addr: (hi << 8) | lo,
                    page_crossed: false,
                }
            }
        }
    }

    /// Value an instruction reads: immediate byte, accumulator, or memory at the
    /// effective address.
    pub(crate) fn load_operand<B: Bus + ?Sized>(&self, operand: Operand, bus: &mut B) -> u8 {
        match operand {
            Operand::Immediate(value) => value,
            Operand::Accumulator => self.a,
            Operand::Address { addr, .. } => bus.read(addr),
            Operand::None | Operand::Relative(_) => 0,
        }
    }

    /// Write a read-modify-write result back to where it came from.
    pub(crate) fn store_operand<B: Bus + ?Sized>(
        &mut self,
        operand: Operand,
        bus: &mut B,
        value: u8,
    ) {
        match operand {
            Operand::Accumulator => self.a = value,
            Operand::Address { addr, .. } => bus.write(addr, value),
            Operand::None | Operand::Immediate(_) | Operand::Relative(_) => {}
        }
    }
}

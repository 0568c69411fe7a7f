use super::{M6502, StatusFlag};
use crate::core::Bus;

impl M6502 {
    // ---- Flag helpers ----

    /// Set N, Z flags from result (for loads, transfers, logical ops).
    #[inline]
    pub(crate) fn set_nz(&mut self, result: u8) {
        self.set_flag(StatusFlag::N, result & 0x80 != 0);
        self.set_flag(StatusFlag::Z, result == 0);
    }

    /// Set N, Z, C flags for shift/rotate operations.
    #[inline]
    pub(crate) fn set_flags_shift(&mut self, result: u8, carry: bool) {
        self.set_nz(result);
        self.set_flag(StatusFlag::C, carry);
    }

    #[inline]
    fn carry_in(&self) -> u8 {
        self.flag(StatusFlag::C) as u8
    }

    // ---- Arithmetic ----

    /// ADC. Binary: A = A + M + C.
    /// Decimal: N and V from the intermediate sum, Z from the binary sum, C from the
    /// BCD-corrected sum (NMOS behaviour).
    pub(crate) fn perform_adc(&mut self, operand: u8) {
        let a = self.a;
        let c = self.carry_in();

        if self.flag(StatusFlag::D) {
            let mut al = (a & 0x0F) as u16 + (operand & 0x0F) as u16 + c as u16;
            if al >= 0x0A {
                al = ((al + 0x06) & 0x0F) + 0x10;
            }
            let mut sum = (a as u16 & 0xF0) + (operand as u16 & 0xF0) + al;

            self.set_flag(StatusFlag::N, sum & 0x80 != 0);
            self.set_flag(
                StatusFlag::V,
                (!(a as u16 ^ operand as u16) & (a as u16 ^ sum)) & 0x80 != 0,
            );

            if sum >= 0xA0 {
                sum += 0x60;
            }
            self.set_flag(StatusFlag::C, sum >= 0x100);

            let binary = a as u16 + operand as u16 + c as u16;
            self.set_flag(StatusFlag::Z, (binary & 0xFF) == 0);

            self.a = sum as u8;
        } else {
            let sum = a as u16 + operand as u16 + c as u16;
            let result = sum as u8;
            self.set_flag(StatusFlag::C, sum > 0xFF);
            self.set_flag(StatusFlag::V, ((!(a ^ operand)) & (a ^ result)) & 0x80 != 0);
            self.a = result;
            self.set_nz(result);
        }
    }

    /// SBC. A = A - M - !C. Flags always come from the binary result; in decimal mode
    /// only the accumulator is BCD-corrected.
    pub(crate) fn perform_sbc(&mut self, operand: u8) {
        let a = self.a;
        let c = self.carry_in();

        let diff = a as u16 + (operand ^ 0xFF) as u16 + c as u16;
        let result = diff as u8;

        self.set_flag(StatusFlag::C, diff > 0xFF);
        self.set_flag(StatusFlag::V, ((a ^ operand) & (a ^ result)) & 0x80 != 0);
        self.set_nz(result);

        if self.flag(StatusFlag::D) {
            let borrow = 1 - c;
            let mut lo = (a & 0x0F) as i16 - (operand & 0x0F) as i16 - borrow as i16;
            let lo_borrow = lo < 0;
            if lo_borrow {
                lo -= 6;
            }
            let mut hi = (a >> 4) as i16 - (operand >> 4) as i16 - lo_borrow as i16;
            if hi < 0 {
                hi -= 6;
            }
            self.a = ((hi as u8 & 0x0F) << 4) | (lo as u8 & 0x0F);
        } else {
            self.a = result;
        }
    }

    /// CMP/CPX/CPY. Sets N, Z, C; V untouched.
    pub(crate) fn perform_compare(&mut self, register: u8, operand: u8) {
        self.set_flag(StatusFlag::C, register >= operand);
        self.set_nz(register.wrapping_sub(operand));
    }

    /// BIT. N = M bit 7, V = M bit 6, Z = (A & M) == 0.
    pub(crate) fn perform_bit(&mut self, operand: u8) {
        self.set_flag(StatusFlag::N, operand & 0x80 != 0);
        self.set_flag(StatusFlag::V, operand & 0x40 != 0);
        self.set_flag(StatusFlag::Z, (self.a & operand) == 0);
    }

    // ---- Shifts ----

    pub(crate) fn perform_asl(&mut self, value: u8) -> u8 {
        let result = value << 1;
        self.set_flags_shift(result, value & 0x80 != 0);
        result
    }

    pub(crate) fn perform_lsr(&mut self, value: u8) -> u8 {
        let result = value >> 1;
        self.set_flags_shift(result, value & 0x01 != 0);
        result
    }

    pub(crate) fn perform_rol(&mut self, value: u8) -> u8 {
        let result = (value << 1) | self.carry_in();
        self.set_flags_shift(result, value & 0x80 != 0);
        result
    }

    pub(crate) fn perform_ror(&mut self, value: u8) -> u8 {
        let result = (value >> 1) | (self.carry_in() << 7);
        self.set_flags_shift(result, value & 0x01 != 0);
        result
    }

    // ---- Stack ----

    pub(crate) fn push<B: Bus + ?Sized>(&mut self, bus: &mut B, value: u8) {
        bus.write(0x0100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pull<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | self.sp as u16)
    }

    pub(crate) fn push_word<B: Bus + ?Sized>(&mut self, bus: &mut B, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    pub(crate) fn pull_word<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pull(bus) as u16;
        let hi = self.pull(bus) as u16;
        (hi << 8) | lo
    }

    /// Status byte as pulled by PLP/RTI: B is always clear, U always set.
    #[inline]
    pub(crate) fn pulled_status(value: u8) -> u8 {
        (value | StatusFlag::U as u8) & !(StatusFlag::B as u8)
    }
}

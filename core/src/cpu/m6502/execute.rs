use super::{M6502, Operand, StatusFlag};
use crate::core::Bus;
use crate::opcodes::Mnemonic;

impl M6502 {
    /// Execute a decoded instruction. Returns cycles beyond the table's base count.
    pub(crate) fn execute<B: Bus + ?Sized>(
        &mut self,
        mnemonic: Mnemonic,
        operand: Operand,
        bus: &mut B,
    ) -> u32 {
        let page_penalty = match operand {
            Operand::Address {
                page_crossed: true, ..
            } => 1,
            _ => 0,
        };

        match mnemonic {
            // ---- Loads, logic, arithmetic (page-crossing penalty applies) ----
            Mnemonic::Lda => {
                self.a = self.load_operand(operand, bus);
                self.set_nz(self.a);
                return page_penalty;
            }
            Mnemonic::Ldx => {
                self.x = self.load_operand(operand, bus);
                self.set_nz(self.x);
                return page_penalty;
            }
            Mnemonic::Ldy => {
                self.y = self.load_operand(operand, bus);
                self.set_nz(self.y);
                return page_penalty;
            }
            Mnemonic::And => {
                self.a &= self.load_operand(operand, bus);
                self.set_nz(self.a);
                return page_penalty;
            }
            Mnemonic::Ora => {
                self.a |= self.load_operand(operand, bus);
                self.set_nz(self.a);
                return page_penalty;
            }
            Mnemonic::Eor => {
                self.a ^= self.load_operand(operand, bus);
                self.set_nz(self.a);
                return page_penalty;
            }
            Mnemonic::Adc => {
                let value = self.load_operand(operand, bus);
                self.perform_adc(value);
                return page_penalty;
            }
            Mnemonic::Sbc => {
                let value = self.load_operand(operand, bus);
                self.perform_sbc(value);
                return page_penalty;
            }
            Mnemonic::Cmp => {
                let value = self.load_operand(operand, bus);
                self.perform_compare(self.a, value);
                return page_penalty;
            }
            Mnemonic::Cpx => {
                let value = self.load_operand(operand, bus);
                self.perform_compare(self.x, value);
            }
            Mnemonic::Cpy => {
                let value = self.load_operand(operand, bus);
                self.perform_compare(self.y, value);
            }
            Mnemonic::Bit => {
                let value = self.load_operand(operand, bus);
                self.perform_bit(value);
            }

            // ---- Stores ----
            Mnemonic::Sta => self.store_operand(operand, bus, self.a),
            Mnemonic::Stx => self.store_operand(operand, bus, self.x),
            Mnemonic::Sty => self.store_operand(operand, bus, self.y),

            // ---- Read-modify-write ----
            Mnemonic::Asl => {
                let value = self.load_operand(operand, bus);
                let result = self.perform_asl(value);
                self.store_operand(operand, bus, result);
            }
            Mnemonic::Lsr => {
                let value = self.load_operand(operand, bus);
                let result = self.perform_lsr(value);
                self.store_operand(operand, bus, result);
            }
            Mnemonic::Rol => {
                let value = self.load_operand(operand, bus);
                let result = self.perform_rol(value);
                self.store_operand(operand, bus, result);
            }
            Mnemonic::Ror => {
                let value = self.load_operand(operand, bus);
                let result = self.perform_ror(value);
                self.store_operand(operand, bus, result);
            }
            Mnemonic::Inc => {
                let result = self.load_operand(operand, bus).wrapping_add(1);
                self.set_nz(result);
                self.store_operand(operand, bus, result);
            }
            Mnemonic::Dec => {
                let result = self.load_operand(operand, bus).wrapping_sub(1);
                self.set_nz(result);
                self.store_operand(operand, bus, result);
            }

            // ---- Register increments and transfers ----
            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_nz(self.x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_nz(self.y);
            }
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_nz(self.x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_nz(self.y);
            }
            Mnemonic::Tax => {
                self.x = self.a;
                self.set_nz(self.x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                self.set_nz(self.y);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                self.set_nz(self.a);
            }
            Mnemonic::Tya => {
                self.a = self.y;
                self.set_nz(self.a);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                self.set_nz(self.x);
            }
            // TXS does not affect flags
            Mnemonic::Txs => self.sp = self.x,

            // ---- Flags ----
            Mnemonic::Clc => self.set_flag(StatusFlag::C, false),
            Mnemonic::Sec => self.set_flag(StatusFlag::C, true),
            Mnemonic::Cli => self.set_flag(StatusFlag::I, false),
            Mnemonic::Sei => self.set_flag(StatusFlag::I, true),
            Mnemonic::Cld => self.set_flag(StatusFlag::D, false),
            Mnemonic::Sed => self.set_flag(StatusFlag::D, true),
            Mnemonic::Clv => self.set_flag(StatusFlag::V, false),

            // ---- Stack ----
            Mnemonic::Pha => self.push(bus, self.a),
            Mnemonic::Php => {
                let pushed = self.p | StatusFlag::B as u8 | StatusFlag::U as u8;
                self.push(bus, pushed);
            }
            Mnemonic::Pla => {
                self.a = self.pull(bus);
                self.set_nz(self.a);
            }
            Mnemonic::Plp => {
                let pulled = self.pull(bus);
                self.p = Self::pulled_status(pulled);
            }

            // ---- Control transfer ----
            Mnemonic::Bpl => return self.branch(operand, !self.flag(StatusFlag::N)),
            Mnemonic::Bmi => return self.branch(operand, self.flag(StatusFlag::N)),
            Mnemonic::Bvc => return self.branch(operand, !self.flag(StatusFlag::V)),
            Mnemonic::Bvs => return self.branch(operand, self.flag(StatusFlag::V)),
            Mnemonic::Bcc => return self.branch(operand, !self.flag(StatusFlag::C)),
            Mnemonic::Bcs => return self.branch(operand, self.flag(StatusFlag::C)),
            Mnemonic::Bne => return self.branch(operand, !self.flag(StatusFlag::Z)),
            Mnemonic::Beq => return self.branch(operand, self.flag(StatusFlag::Z)),
            Mnemonic::Jmp => {
                if let Operand::Address { addr, .. } = operand {
                    self.pc = addr;
                }
            }
            Mnemonic::Jsr => {
                if let Operand::Address { addr, .. } = operand {
                    // Pushes the address of the last byte of the JSR instruction
                    let ret = self.pc.wrapping_sub(1);
                    self.push_word(bus, ret);
                    self.pc = addr;
                }
            }
            Mnemonic::Rts => {
                self.pc = self.pull_word(bus).wrapping_add(1);
            }
            Mnemonic::Rti => {
                let pulled = self.pull(bus);
                self.p = Self::pulled_status(pulled);
                self.pc = self.pull_word(bus);
            }
            Mnemonic::Brk => {
                // Padding byte after the opcode is skipped
                let ret = self.pc.wrapping_add(1);
                self.push_word(bus, ret);
                let pushed = self.p | StatusFlag::B as u8 | StatusFlag::U as u8;
                self.push(bus, pushed);
                self.set_flag(StatusFlag::I, true);
                self.pc = bus.read_word(0xFFFE);
            }

            Mnemonic::Nop => {}

            // Undocumented families never reach here: step_instruction refuses them.
            _ => {}
        }
        0
    }

    /// Conditional branch: +1 cycle when taken, +1 more when the target is on another page.
    fn branch(&mut self, operand: Operand, condition: bool) -> u32 {
        let Operand::Relative(offset) = operand else {
            return 0;
        };
        if !condition {
            return 0;
        }
        let target = self.pc.wrapping_add(offset as i16 as u16);
        let penalty = if (target & 0xFF00) != (self.pc & 0xFF00) {
            2
        } else {
            1
        };
        self.pc = target;
        penalty
    }
}

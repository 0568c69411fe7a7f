//! Uniform capability surface over the two emulator backends.

use std::io::{Read, Write};

use log::{debug, warn};
use lockstep65_core::core::{Bus, FlatBus};
use lockstep65_core::cpu::{CpuState, CpuStateTrait, M6502};
use lockstep65_core::disasm::{self, Disassembly};

use crate::channel::{CommandChannel, Connection, ProcessGuard, ResponseChannel};
use crate::client::DebugClient;
use crate::error::{AdapterError, ProtocolError};
use crate::protocol::{Register, RegisterFile};

/// Longest 6502 instruction, in bytes.
const MAX_INSTRUCTION_LEN: u16 = 3;

pub trait EmulatorAdapter {
    /// Short label used in logs and reports.
    fn name(&self) -> &str;

    /// Current architectural state.
    fn state(&self) -> CpuState;

    /// Write a register. Eight-bit registers take the low byte of `value`.
    fn set_register(&mut self, register: Register, value: u16) -> Result<(), AdapterError>;

    fn read_memory(&mut self, start: u16, len: usize) -> Result<Vec<u8>, AdapterError>;

    fn write_memory(&mut self, start: u16, bytes: &[u8]) -> Result<(), AdapterError>;

    /// Execute exactly one instruction.
    fn step(&mut self) -> Result<(), AdapterError>;

    fn disassemble_at(&mut self, pc: u16) -> Result<Disassembly, AdapterError>;

    fn set_a(&mut self, value: u8) -> Result<(), AdapterError> {
        self.set_register(Register::A, value as u16)
    }

    fn set_x(&mut self, value: u8) -> Result<(), AdapterError> {
        self.set_register(Register::X, value as u16)
    }

    fn set_y(&mut self, value: u8) -> Result<(), AdapterError> {
        self.set_register(Register::Y, value as u16)
    }

    fn set_p(&mut self, value: u8) -> Result<(), AdapterError> {
        self.set_register(Register::P, value as u16)
    }

    fn set_sp(&mut self, value: u8) -> Result<(), AdapterError> {
        self.set_register(Register::Sp, value as u16)
    }

    fn set_pc(&mut self, value: u16) -> Result<(), AdapterError> {
        self.set_register(Register::Pc, value)
    }
}

impl<T: EmulatorAdapter + ?Sized> EmulatorAdapter for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn state(&self) -> CpuState {
        (**self).state()
    }
    fn set_register(&mut self, register: Register, value: u16) -> Result<(), AdapterError> {
        (**self).set_register(register, value)
    }
    fn read_memory(&mut self, start: u16, len: usize) -> Result<Vec<u8>, AdapterError> {
        (**self).read_memory(start, len)
    }
    fn write_memory(&mut self, start: u16, bytes: &[u8]) -> Result<(), AdapterError> {
        (**self).write_memory(start, bytes)
    }
    fn step(&mut self) -> Result<(), AdapterError> {
        (**self).step()
    }
    fn disassemble_at(&mut self, pc: u16) -> Result<Disassembly, AdapterError> {
        (**self).disassemble_at(pc)
    }
}

// --- Reference: in-process NMOS 6502 ---

/// The trusted emulator, called directly.
pub struct ReferenceAdapter {
    cpu: M6502,
    bus: FlatBus,
}

impl ReferenceAdapter {
    pub fn new() -> Self {
        Self {
            cpu: M6502::new(),
            bus: FlatBus::new(),
        }
    }

    pub fn cpu(&self) -> &M6502 {
        &self.cpu
    }

    pub fn bus(&self) -> &FlatBus {
        &self.bus
    }
}

impl Default for ReferenceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatorAdapter for ReferenceAdapter {
    fn name(&self) -> &str {
        "reference"
    }

    fn state(&self) -> CpuState {
        self.cpu.snapshot()
    }

    fn set_register(&mut self, register: Register, value: u16) -> Result<(), AdapterError> {
        let byte = value as u8;
        match register {
            Register::A => self.cpu.a = byte,
            Register::X => self.cpu.x = byte,
            Register::Y => self.cpu.y = byte,
            Register::P => self.cpu.p = byte,
            Register::Sp => self.cpu.sp = byte,
            Register::Pc => self.cpu.pc = value,
        }
        Ok(())
    }

    fn read_memory(&mut self, start: u16, len: usize) -> Result<Vec<u8>, AdapterError> {
        Ok(self.bus.slice(start, len))
    }

    fn write_memory(&mut self, start: u16, bytes: &[u8]) -> Result<(), AdapterError> {
        self.bus.load(start, bytes);
        Ok(())
    }

    fn step(&mut self) -> Result<(), AdapterError> {
        self.cpu.step_instruction(&mut self.bus)?;
        Ok(())
    }

    fn disassemble_at(&mut self, pc: u16) -> Result<Disassembly, AdapterError> {
        let bytes: Vec<u8> = (0..MAX_INSTRUCTION_LEN)
            .map(|i| self.bus.peek(pc.wrapping_add(i)))
            .collect();
        Ok(disasm::disassemble(&bytes, pc))
    }
}

// --- Device: remote emulator over the debug protocol ---

/// The device under test, reached through a [`DebugClient`].
///
/// Registers are cached: read once when the adapter is built and again after every
/// register write or step. A STEP response carrying the register file stands in for
/// the re-read.
pub struct DeviceAdapter<W: Write, R: Read> {
    client: DebugClient<W, R>,
    registers: RegisterFile,
    stopped: bool,
    // Declared after `client` so the channels close before the process is reaped.
    process: Option<ProcessGuard>,
}

impl<W: Write, R: Read> DeviceAdapter<W, R> {
    pub fn new(mut client: DebugClient<W, R>) -> Result<Self, ProtocolError> {
        let registers = client.get_registers()?;
        debug!("device primed: {:?}", registers.to_state());
        Ok(Self {
            client,
            registers,
            stopped: false,
            process: None,
        })
    }

    pub fn pending_interrupt(&self) -> bool {
        self.registers.pending_interrupt != 0
    }

    pub fn client_mut(&mut self) -> &mut DebugClient<W, R> {
        &mut self.client
    }

    fn refresh(&mut self) -> Result<(), ProtocolError> {
        self.registers = self.client.get_registers()?;
        Ok(())
    }

    /// Send STOP. Later calls and the drop are no-ops.
    pub fn shutdown(&mut self) -> Result<(), ProtocolError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.client.stop()
    }
}

impl DeviceAdapter<CommandChannel, ResponseChannel> {
    /// Take ownership of an opened connection, including its child process if any.
    pub fn connect(connection: Connection) -> Result<Self, ProtocolError> {
        let Connection {
            commands,
            responses,
            process,
        } = connection;
        let mut adapter = Self::new(DebugClient::new(commands, responses))?;
        adapter.process = process;
        Ok(adapter)
    }
}

impl<W: Write, R: Read> Drop for DeviceAdapter<W, R> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("stopping device emulator: {e}");
        }
    }
}

impl<W: Write, R: Read> EmulatorAdapter for DeviceAdapter<W, R> {
    fn name(&self) -> &str {
        "device"
    }

    fn state(&self) -> CpuState {
        self.registers.to_state()
    }

    fn set_register(&mut self, register: Register, value: u16) -> Result<(), AdapterError> {
        self.client.set_register(register, value)?;
        self.refresh()?;
        Ok(())
    }

    fn read_memory(&mut self, start: u16, len: usize) -> Result<Vec<u8>, AdapterError> {
        let len = u16::try_from(len).map_err(|_| ProtocolError::PayloadTooLarge { len })?;
        Ok(self.client.read_memory(start, len)?)
    }

    fn write_memory(&mut self, start: u16, bytes: &[u8]) -> Result<(), AdapterError> {
        Ok(self.client.write_memory(start, bytes)?)
    }

    fn step(&mut self) -> Result<(), AdapterError> {
        match self.client.step()? {
            Some(registers) => self.registers = registers,
            None => self.refresh()?,
        }
        Ok(())
    }

    fn disassemble_at(&mut self, pc: u16) -> Result<Disassembly, AdapterError> {
        // Stay inside the address space; the disassembler zero-fills what is missing.
        let len = (0x10000 - pc as u32).min(MAX_INSTRUCTION_LEN as u32) as u16;
        let bytes = self.client.read_memory(pc, len)?;
        Ok(disasm::disassemble(&bytes, pc))
    }
}

#![allow(dead_code)]

use std::os::unix::net::UnixStream;
use std::thread;

use lockstep65_core::cpu::CpuState;
use lockstep65_core::disasm::Disassembly;
use lockstep65_validation::protocol::Command;
use lockstep65_validation::{
    AdapterError, DebugClient, DebugServer, DeviceAdapter, DifferentialEngine, EmulatorAdapter,
    ProtocolError, ReferenceAdapter, Register, RunConfig,
};

pub type RemoteDevice = DeviceAdapter<UnixStream, UnixStream>;

/// A reference CPU served over the debug protocol on a background thread.
pub fn remote_device() -> RemoteDevice {
    remote_device_with(ReferenceAdapter::new())
}

pub fn remote_device_with<E: EmulatorAdapter + Send + 'static>(adapter: E) -> RemoteDevice {
    let (client, server) = UnixStream::pair().unwrap();
    let server_out = server.try_clone().unwrap();
    thread::spawn(move || DebugServer::new(adapter).serve(server, server_out));
    let client_in = client.try_clone().unwrap();
    DeviceAdapter::new(DebugClient::new(client, client_in)).unwrap()
}

pub fn quiet_config() -> RunConfig {
    RunConfig {
        progress_interval: 0,
        ..RunConfig::default()
    }
}

pub fn remote_engine(seed: u64) -> DifferentialEngine<ReferenceAdapter, RemoteDevice> {
    DifferentialEngine::new(ReferenceAdapter::new(), remote_device(), quiet_config(), seed)
}

/// Wraps an adapter and flips `bits` in the reported status register once `after`
/// steps have been taken.
pub struct FlagFault<A: EmulatorAdapter> {
    pub inner: A,
    pub steps: usize,
    pub after: usize,
    pub bits: u8,
}

impl<A: EmulatorAdapter> FlagFault<A> {
    pub fn new(inner: A, after: usize, bits: u8) -> Self {
        Self {
            inner,
            steps: 0,
            after,
            bits,
        }
    }
}

impl<A: EmulatorAdapter> EmulatorAdapter for FlagFault<A> {
    fn name(&self) -> &str {
        "faulty"
    }

    fn state(&self) -> CpuState {
        let mut state = self.inner.state();
        if self.steps >= self.after {
            state.p ^= self.bits;
        }
        state
    }

    fn set_register(&mut self, register: Register, value: u16) -> Result<(), AdapterError> {
        self.inner.set_register(register, value)
    }

    fn read_memory(&mut self, start: u16, len: usize) -> Result<Vec<u8>, AdapterError> {
        self.inner.read_memory(start, len)
    }

    fn write_memory(&mut self, start: u16, bytes: &[u8]) -> Result<(), AdapterError> {
        self.inner.write_memory(start, bytes)
    }

    fn step(&mut self) -> Result<(), AdapterError> {
        self.steps += 1;
        self.inner.step()
    }

    fn disassemble_at(&mut self, pc: u16) -> Result<Disassembly, AdapterError> {
        self.inner.disassemble_at(pc)
    }
}

/// Reference adapter whose disassembler always reports one byte.
pub struct ShortDisassembler(pub ReferenceAdapter);

impl EmulatorAdapter for ShortDisassembler {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn state(&self) -> CpuState {
        self.0.state()
    }

    fn set_register(&mut self, register: Register, value: u16) -> Result<(), AdapterError> {
        self.0.set_register(register, value)
    }

    fn read_memory(&mut self, start: u16, len: usize) -> Result<Vec<u8>, AdapterError> {
        self.0.read_memory(start, len)
    }

    fn write_memory(&mut self, start: u16, bytes: &[u8]) -> Result<(), AdapterError> {
        self.0.write_memory(start, bytes)
    }

    fn step(&mut self) -> Result<(), AdapterError> {
        self.0.step()
    }

    fn disassemble_at(&mut self, pc: u16) -> Result<Disassembly, AdapterError> {
        let mut dis = self.0.disassemble_at(pc)?;
        dis.length = 1;
        Ok(dis)
    }
}

/// Wraps an adapter and answers its `reject_at`-th step with a device rejection,
/// without stepping the inner adapter.
pub struct StepRejection<A: EmulatorAdapter> {
    pub inner: A,
    pub steps: usize,
    pub reject_at: usize,
}

impl<A: EmulatorAdapter> StepRejection<A> {
    pub fn new(inner: A, reject_at: usize) -> Self {
        Self {
            inner,
            steps: 0,
            reject_at,
        }
    }
}

impl<A: EmulatorAdapter> EmulatorAdapter for StepRejection<A> {
    fn name(&self) -> &str {
        "rejecting"
    }

    fn state(&self) -> CpuState {
        self.inner.state()
    }

    fn set_register(&mut self, register: Register, value: u16) -> Result<(), AdapterError> {
        self.inner.set_register(register, value)
    }

    fn read_memory(&mut self, start: u16, len: usize) -> Result<Vec<u8>, AdapterError> {
        self.inner.read_memory(start, len)
    }

    fn write_memory(&mut self, start: u16, bytes: &[u8]) -> Result<(), AdapterError> {
        self.inner.write_memory(start, bytes)
    }

    fn step(&mut self) -> Result<(), AdapterError> {
        self.steps += 1;
        if self.steps == self.reject_at {
            return Err(ProtocolError::DeviceRejected {
                command: Command::Step,
            }
            .into());
        }
        self.inner.step()
    }

    fn disassemble_at(&mut self, pc: u16) -> Result<Disassembly, AdapterError> {
        self.inner.disassemble_at(pc)
    }
}

/// Reference adapter whose single-byte reads come back empty.
pub struct EmptyByteReads(pub ReferenceAdapter);

impl EmulatorAdapter for EmptyByteReads {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn state(&self) -> CpuState {
        self.0.state()
    }

    fn set_register(&mut self, register: Register, value: u16) -> Result<(), AdapterError> {
        self.0.set_register(register, value)
    }

    fn read_memory(&mut self, start: u16, len: usize) -> Result<Vec<u8>, AdapterError> {
        if len == 1 {
            return Ok(Vec::new());
        }
        self.0.read_memory(start, len)
    }

    fn write_memory(&mut self, start: u16, bytes: &[u8]) -> Result<(), AdapterError> {
        self.0.write_memory(start, bytes)
    }

    fn step(&mut self) -> Result<(), AdapterError> {
        self.0.step()
    }

    fn disassemble_at(&mut self, pc: u16) -> Result<Disassembly, AdapterError> {
        self.0.disassemble_at(pc)
    }
}

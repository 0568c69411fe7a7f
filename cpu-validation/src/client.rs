use std::io::{Read, Write};

use log::trace;

use crate::error::ProtocolError;
use crate::protocol::{
    self, Command, CommandHeader, REGISTERS_PAYLOAD_LEN, RESPONSE_HEADER_LEN, Register,
    RegisterFile, ResponseHeader, STATUS_OK,
};

/// Synchronous client for the debug protocol.
///
/// Owns both channels exclusively. Each call writes one command and blocks until its
/// response has been drained, so commands are never pipelined.
pub struct DebugClient<W: Write, R: Read> {
    commands: W,
    responses: R,
}

impl<W: Write, R: Read> DebugClient<W, R> {
    pub fn new(commands: W, responses: R) -> Self {
        Self {
            commands,
            responses,
        }
    }

    pub fn into_inner(self) -> (W, R) {
        (self.commands, self.responses)
    }

    /// Send one command and return the response payload.
    ///
    /// The payload is drained before the status is checked so the channel stays framed
    /// even when the device rejects a command.
    pub fn transact(
        &mut self,
        command: Command,
        param1: u16,
        param2: u16,
        payload: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        let extra_len = protocol::payload_len(payload)?;
        let header = CommandHeader::new(command, param1, param2, extra_len);
        trace!("-> {command:?} p1=${param1:04x} p2=${param2:04x} extra={extra_len}");

        self.commands.write_all(&header.encode())?;
        self.commands.write_all(payload)?;
        self.commands.flush()?;

        let mut raw = [0u8; RESPONSE_HEADER_LEN];
        protocol::read_full(&mut self.responses, &mut raw)?;
        let response = ResponseHeader::decode(&raw);
        let body = protocol::read_payload(&mut self.responses, response.extra_len)?;
        trace!("<- {command:?} status={} extra={}", response.status, response.extra_len);

        if response.status != STATUS_OK {
            return Err(ProtocolError::DeviceRejected { command });
        }
        Ok(body)
    }

    fn expect_empty(command: Command, body: &[u8]) -> Result<(), ProtocolError> {
        if body.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::UnexpectedPayload {
                command,
                expected: 0,
                actual: body.len(),
            })
        }
    }

    pub fn nop(&mut self) -> Result<(), ProtocolError> {
        let body = self.transact(Command::Nop, 0, 0, &[])?;
        Self::expect_empty(Command::Nop, &body)
    }

    pub fn version(&mut self) -> Result<String, ProtocolError> {
        let body = self.transact(Command::Version, 0, 0, &[])?;
        Ok(protocol::zero_terminated(&body))
    }

    pub fn get_registers(&mut self) -> Result<RegisterFile, ProtocolError> {
        let body = self.transact(Command::GetRegisters, 0, 0, &[])?;
        if body.len() != REGISTERS_PAYLOAD_LEN {
            return Err(ProtocolError::UnexpectedPayload {
                command: Command::GetRegisters,
                expected: REGISTERS_PAYLOAD_LEN,
                actual: body.len(),
            });
        }
        RegisterFile::decode(&body)
    }

    pub fn set_register(&mut self, register: Register, value: u16) -> Result<(), ProtocolError> {
        let body = self.transact(Command::SetRegister, register as u16, value, &[])?;
        Self::expect_empty(Command::SetRegister, &body)
    }

    pub fn read_memory(&mut self, start: u16, len: u16) -> Result<Vec<u8>, ProtocolError> {
        let body = self.transact(Command::ReadMemory, start, len, &[])?;
        if body.len() != len as usize {
            return Err(ProtocolError::UnexpectedPayload {
                command: Command::ReadMemory,
                expected: len as usize,
                actual: body.len(),
            });
        }
        Ok(body)
    }

    pub fn write_memory(&mut self, start: u16, bytes: &[u8]) -> Result<(), ProtocolError> {
        let len = protocol::payload_len(bytes)?;
        let body = self.transact(Command::WriteMemory, start, len, bytes)?;
        Self::expect_empty(Command::WriteMemory, &body)
    }

    /// Ask the device to load `filename` at `start`.
    pub fn load(&mut self, start: u16, filename: &str) -> Result<(), ProtocolError> {
        let mut payload = filename.as_bytes().to_vec();
        payload.push(0);
        let body = self.transact(Command::Load, start, 0, &payload)?;
        Self::expect_empty(Command::Load, &body)
    }

    /// Execute one instruction on the device.
    ///
    /// Some devices answer STEP with their register file; it is returned so the caller
    /// can skip a GET_REGISTERS round trip.
    pub fn step(&mut self) -> Result<Option<RegisterFile>, ProtocolError> {
        let body = self.transact(Command::Step, 0, 0, &[])?;
        match body.len() {
            0 => Ok(None),
            REGISTERS_PAYLOAD_LEN => RegisterFile::decode(&body).map(Some),
            actual => Err(ProtocolError::UnexpectedPayload {
                command: Command::Step,
                expected: REGISTERS_PAYLOAD_LEN,
                actual,
            }),
        }
    }

    /// Ask the device emulator to terminate.
    pub fn stop(&mut self) -> Result<(), ProtocolError> {
        self.transact(Command::Stop, 0, 0, &[]).map(|_| ())
    }
}

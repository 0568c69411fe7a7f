//! Device side of the debug protocol.
//!
//! Serves any [`EmulatorAdapter`] over a command/response channel pair. Used by
//! `lockstep65 serve` and as the remote end in tests.

use std::fs;
use std::io::{Read, Write};

use log::{debug, trace, warn};

use crate::adapter::EmulatorAdapter;
use crate::error::ProtocolError;
use crate::protocol::{
    self, Command, CommandHeader, Register, RegisterFile, STATUS_ERROR, STATUS_OK,
};

/// How a serve loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServeEnd {
    /// The client sent STOP.
    Stopped,
    /// The command channel reached end of stream between commands.
    Disconnected,
}

/// A command failed on the device side; answered with an ERROR status.
struct Rejected;

pub struct DebugServer<E: EmulatorAdapter> {
    adapter: E,
    version: String,
}

impl<E: EmulatorAdapter> DebugServer<E> {
    pub fn new(adapter: E) -> Self {
        Self {
            adapter,
            version: format!("lockstep65 {}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn adapter(&self) -> &E {
        &self.adapter
    }

    pub fn into_adapter(self) -> E {
        self.adapter
    }

    /// Answer commands until STOP or end of stream.
    pub fn serve<R: Read, W: Write>(
        &mut self,
        mut commands: R,
        mut responses: W,
    ) -> Result<ServeEnd, ProtocolError> {
        loop {
            let Some(header) = protocol::read_command_header(&mut commands)? else {
                debug!("command channel closed");
                return Ok(ServeEnd::Disconnected);
            };
            let payload = protocol::read_payload(&mut commands, header.extra_len)?;

            let Some(command) = Command::from_byte(header.command) else {
                warn!("unknown command ${:02x}", header.command);
                protocol::write_response(&mut responses, STATUS_ERROR, &[])?;
                continue;
            };
            trace!("serving {command:?}");

            match self.dispatch(command, &header, &payload) {
                Ok(body) => protocol::write_response(&mut responses, STATUS_OK, &body)?,
                Err(Rejected) => protocol::write_response(&mut responses, STATUS_ERROR, &[])?,
            }
            if command == Command::Stop {
                return Ok(ServeEnd::Stopped);
            }
        }
    }

    fn dispatch(
        &mut self,
        command: Command,
        header: &CommandHeader,
        payload: &[u8],
    ) -> Result<Vec<u8>, Rejected> {
        match command {
            Command::Nop | Command::Stop => Ok(Vec::new()),
            Command::Version => {
                let mut text = self.version.clone().into_bytes();
                text.push(0);
                Ok(text)
            }
            Command::GetRegisters => {
                let state = self.adapter.state();
                Ok(RegisterFile::from_state(&state).encode().to_vec())
            }
            Command::ReadMemory => {
                check_span(header.param1, header.param2 as usize)?;
                self.adapter
                    .read_memory(header.param1, header.param2 as usize)
                    .map_err(|e| reject("read", e))
            }
            Command::WriteMemory => {
                if payload.len() != header.param2 as usize {
                    warn!(
                        "write of {} bytes declared {} bytes",
                        payload.len(),
                        header.param2
                    );
                    return Err(Rejected);
                }
                check_span(header.param1, payload.len())?;
                self.adapter
                    .write_memory(header.param1, payload)
                    .map(|_| Vec::new())
                    .map_err(|e| reject("write", e))
            }
            Command::Load => {
                let filename = protocol::zero_terminated(payload);
                let image = fs::read(&filename).map_err(|e| reject(&filename, e))?;
                check_span(header.param1, image.len())?;
                self.adapter
                    .write_memory(header.param1, &image)
                    .map(|_| Vec::new())
                    .map_err(|e| reject("load", e))
            }
            Command::SetRegister => {
                let register = Register::from_selector(header.param1).ok_or_else(|| {
                    warn!("unknown register selector {}", header.param1);
                    Rejected
                })?;
                self.adapter
                    .set_register(register, header.param2)
                    .map(|_| Vec::new())
                    .map_err(|e| reject("set register", e))
            }
            Command::Step => self
                .adapter
                .step()
                .map(|_| Vec::new())
                .map_err(|e| reject("step", e)),
        }
    }
}

fn check_span(start: u16, len: usize) -> Result<(), Rejected> {
    if start as usize + len > 0x10000 {
        warn!("span ${start:04x}+{len} runs past $ffff");
        return Err(Rejected);
    }
    Ok(())
}

fn reject(what: &str, err: impl std::fmt::Display) -> Rejected {
    warn!("{what}: {err}");
    Rejected
}

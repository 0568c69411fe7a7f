//! Debug wire protocol framing.
//!
//! Every exchange is one command followed by exactly one response:
//!
//! ```text
//! command:  cmd u8 | param1 u16 LE | param2 u16 LE | extra_len u16 LE | payload
//! response: status u8 | extra_len u16 LE | payload
//! ```

use std::io::{self, Read, Write};

use lockstep65_core::cpu::CpuState;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

pub const COMMAND_HEADER_LEN: usize = 7;
pub const RESPONSE_HEADER_LEN: usize = 3;
pub const REGISTERS_PAYLOAD_LEN: usize = 8;

pub const STATUS_OK: u8 = 0;
pub const STATUS_ERROR: u8 = 1;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Nop = 0x00,
    Version = 0x01,
    GetRegisters = 0x02,
    ReadMemory = 0x03,
    WriteMemory = 0x04,
    Load = 0x05,
    SetRegister = 0x06,
    Step = 0x07,
    Stop = 0xFF,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Command> {
        Some(match byte {
            0x00 => Command::Nop,
            0x01 => Command::Version,
            0x02 => Command::GetRegisters,
            0x03 => Command::ReadMemory,
            0x04 => Command::WriteMemory,
            0x05 => Command::Load,
            0x06 => Command::SetRegister,
            0x07 => Command::Step,
            0xFF => Command::Stop,
            _ => return None,
        })
    }
}

/// Register selector carried in `param1` of SET_REGISTER.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Register {
    A = 1,
    X = 2,
    Y = 3,
    P = 4,
    Sp = 5,
    Pc = 6,
}

impl Register {
    pub const ALL: [Register; 6] = [
        Register::A,
        Register::X,
        Register::Y,
        Register::P,
        Register::Sp,
        Register::Pc,
    ];

    pub fn from_selector(selector: u16) -> Option<Register> {
        Register::ALL
            .into_iter()
            .find(|r| *r as u16 == selector)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandHeader {
    pub command: u8,
    pub param1: u16,
    pub param2: u16,
    pub extra_len: u16,
}

impl CommandHeader {
    pub fn new(command: Command, param1: u16, param2: u16, extra_len: u16) -> Self {
        Self {
            command: command as u8,
            param1,
            param2,
            extra_len,
        }
    }

    pub fn encode(&self) -> [u8; COMMAND_HEADER_LEN] {
        let [p1_lo, p1_hi] = self.param1.to_le_bytes();
        let [p2_lo, p2_hi] = self.param2.to_le_bytes();
        let [len_lo, len_hi] = self.extra_len.to_le_bytes();
        [self.command, p1_lo, p1_hi, p2_lo, p2_hi, len_lo, len_hi]
    }

    pub fn decode(bytes: &[u8; COMMAND_HEADER_LEN]) -> Self {
        Self {
            command: bytes[0],
            param1: u16::from_le_bytes([bytes[1], bytes[2]]),
            param2: u16::from_le_bytes([bytes[3], bytes[4]]),
            extra_len: u16::from_le_bytes([bytes[5], bytes[6]]),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseHeader {
    pub status: u8,
    pub extra_len: u16,
}

impl ResponseHeader {
    pub fn encode(&self) -> [u8; RESPONSE_HEADER_LEN] {
        let [lo, hi] = self.extra_len.to_le_bytes();
        [self.status, lo, hi]
    }

    pub fn decode(bytes: &[u8; RESPONSE_HEADER_LEN]) -> Self {
        Self {
            status: bytes[0],
            extra_len: u16::from_le_bytes([bytes[1], bytes[2]]),
        }
    }
}

/// GET_REGISTERS payload: `flags, A, X, Y, PC (LE), SP, pending interrupt`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterFile {
    pub p: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub pending_interrupt: u8,
}

impl RegisterFile {
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        let &[p, a, x, y, pc_lo, pc_hi, sp, pending_interrupt] = payload else {
            return Err(ProtocolError::UnexpectedPayload {
                command: Command::GetRegisters,
                expected: REGISTERS_PAYLOAD_LEN,
                actual: payload.len(),
            });
        };
        Ok(Self {
            p,
            a,
            x,
            y,
            pc: u16::from_le_bytes([pc_lo, pc_hi]),
            sp,
            pending_interrupt,
        })
    }

    pub fn encode(&self) -> [u8; REGISTERS_PAYLOAD_LEN] {
        let [pc_lo, pc_hi] = self.pc.to_le_bytes();
        [
            self.p,
            self.a,
            self.x,
            self.y,
            pc_lo,
            pc_hi,
            self.sp,
            self.pending_interrupt,
        ]
    }

    pub fn from_state(state: &CpuState) -> Self {
        Self {
            p: state.p,
            a: state.a,
            x: state.x,
            y: state.y,
            pc: state.pc,
            sp: state.sp,
            pending_interrupt: 0,
        }
    }

    pub fn to_state(&self) -> CpuState {
        CpuState {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            p: self.p,
        }
    }
}

/// Fill `buf` completely. A short read means the peer died or lost framing.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<(), ProtocolError> {
    reader.read_exact(buf).map_err(map_read_error)
}

/// Read the next command header, or `None` on a clean end of stream between commands.
pub fn read_command_header<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<Option<CommandHeader>, ProtocolError> {
    let mut bytes = [0u8; COMMAND_HEADER_LEN];
    let first = loop {
        match reader.read(&mut bytes[..1]) {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(map_read_error(e)),
        }
    };
    if first == 0 {
        return Ok(None);
    }
    read_full(reader, &mut bytes[1..])?;
    Ok(Some(CommandHeader::decode(&bytes)))
}

/// Read a payload of `len` bytes.
pub fn read_payload<R: Read + ?Sized>(reader: &mut R, len: u16) -> Result<Vec<u8>, ProtocolError> {
    let mut payload = vec![0u8; len as usize];
    read_full(reader, &mut payload)?;
    Ok(payload)
}

/// Write a response frame and flush it.
pub fn write_response<W: Write + ?Sized>(
    writer: &mut W,
    status: u8,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    let extra_len = payload_len(payload)?;
    let header = ResponseHeader { status, extra_len };
    writer.write_all(&header.encode())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

pub fn payload_len(payload: &[u8]) -> Result<u16, ProtocolError> {
    u16::try_from(payload.len()).map_err(|_| ProtocolError::PayloadTooLarge { len: payload.len() })
}

/// Bytes up to (not including) the first NUL, as text.
pub fn zero_terminated(payload: &[u8]) -> String {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    String::from_utf8_lossy(&payload[..end]).into_owned()
}

fn map_read_error(e: io::Error) -> ProtocolError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => ProtocolError::ChannelClosed,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProtocolError::ChannelTimeout,
        _ => ProtocolError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_header_layout() {
        let header = CommandHeader::new(Command::WriteMemory, 0x2000, 0x0003, 0x0003);
        assert_eq!(header.encode(), [0x04, 0x00, 0x20, 0x03, 0x00, 0x03, 0x00]);
        assert_eq!(CommandHeader::decode(&header.encode()), header);
    }

    #[test]
    fn register_payload_layout() {
        let regs = RegisterFile::decode(&[0x23, 0x01, 0x02, 0x03, 0x34, 0x12, 0xFD, 0x00]).unwrap();
        assert_eq!(regs.p, 0x23);
        assert_eq!((regs.a, regs.x, regs.y), (1, 2, 3));
        assert_eq!(regs.pc, 0x1234);
        assert_eq!(regs.sp, 0xFD);
        assert_eq!(regs.encode()[4..6], [0x34, 0x12]);
    }

    #[test]
    fn short_register_payload_is_rejected() {
        let err = RegisterFile::decode(&[0; 7]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedPayload {
                expected: 8,
                actual: 7,
                ..
            }
        ));
    }

    #[test]
    fn short_read_is_channel_closed() {
        let mut data: &[u8] = &[0x00, 0x01];
        let mut buf = [0u8; RESPONSE_HEADER_LEN];
        assert!(matches!(
            read_full(&mut data, &mut buf),
            Err(ProtocolError::ChannelClosed)
        ));
    }

    #[test]
    fn clean_eof_between_commands() {
        let mut data: &[u8] = &[];
        assert!(read_command_header(&mut data).unwrap().is_none());

        let mut partial: &[u8] = &[0x07, 0x00];
        assert!(matches!(
            read_command_header(&mut partial),
            Err(ProtocolError::ChannelClosed)
        ));
    }

    #[test]
    fn selectors_round_trip() {
        for register in Register::ALL {
            assert_eq!(Register::from_selector(register as u16), Some(register));
        }
        assert_eq!(Register::from_selector(0), None);
        assert_eq!(Register::from_selector(7), None);
    }

    #[test]
    fn zero_terminated_strings() {
        assert_eq!(zero_terminated(b"rom.bin\0junk"), "rom.bin");
        assert_eq!(zero_terminated(b"no-nul"), "no-nul");
    }
}

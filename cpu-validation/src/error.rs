use std::io;
use std::path::PathBuf;

use lockstep65_core::cpu::m6502::CpuError;
use lockstep65_core::opcodes::AddressingMode;
use thiserror::Error;

use crate::engine::Phase;
use crate::protocol::Command;
use crate::report::{FailureContext, MismatchRecord};

/// Failures talking to the device emulator. All of them are fatal: once framing is in
/// doubt there is no way to resynchronise the channel pair.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("device rejected {command:?} command")]
    DeviceRejected { command: Command },

    #[error("channel closed mid-message")]
    ChannelClosed,

    #[error("timed out waiting for the device response")]
    ChannelTimeout,

    #[error("{command:?} response carried {actual} payload bytes, expected {expected}")]
    UnexpectedPayload {
        command: Command,
        expected: usize,
        actual: usize,
    },

    #[error("payload of {len} bytes does not fit a 16-bit length field")]
    PayloadTooLarge { len: usize },

    #[error("channel I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failures surfaced through an emulator adapter, whichever backend produced them.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("reference emulator: {0}")]
    Reference(#[from] CpuError),
}

/// The opcode table and the generator disagree; a bug in this tool, not in the device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("no testable opcode found in {attempts} attempts")]
    NoCandidate { attempts: u32 },

    #[error("opcode ${opcode:02x} uses {} addressing, which the generator cannot synthesize", .mode.name())]
    UnsupportedMode { opcode: u8, mode: AddressingMode },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("unknown mnemonic in `{statement}`")]
    UnknownMnemonic { statement: String },

    #[error("cannot parse operand in `{statement}`")]
    InvalidOperand { statement: String },

    #[error("no encoding for `{statement}`")]
    NoEncoding { statement: String },

    #[error("branch target out of range in `{statement}`")]
    BranchOutOfRange { statement: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything that can end a differential run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("reference emulator: {0}")]
    Reference(#[from] CpuError),

    #[error("generator configuration error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("assembler error: {0}")]
    Assembler(#[from] AssemblerError),

    #[error("state mismatch after {}", .0.instruction)]
    StateMismatch(Box<MismatchRecord>),

    #[error(
        "{description}: generated {generated} bytes but the disassembler reads `{text}` as {disassembled}"
    )]
    LengthDisagreement {
        description: String,
        text: String,
        generated: usize,
        disassembled: usize,
    },

    /// Any other error raised while running an instruction, with the state needed to
    /// reproduce it by hand.
    #[error("{source}\n{context}")]
    Fatal {
        context: Box<FailureContext>,
        source: Box<HarnessError>,
    },

    #[error("engine is {phase:?}, not running")]
    NotRunning { phase: Phase },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<AdapterError> for HarnessError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Protocol(e) => HarnessError::Protocol(e),
            AdapterError::Reference(e) => HarnessError::Reference(e),
        }
    }
}

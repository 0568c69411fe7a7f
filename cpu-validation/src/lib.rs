//! Differential tester for 6502 emulators.
//!
//! A trusted in-process reference CPU and a device under test, reachable only through
//! the debug protocol, are stepped in lockstep over randomly generated instructions and
//! compared after every step.

pub mod adapter;
pub mod assembler;
pub mod channel;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod protocol;
pub mod report;
pub mod server;

pub use adapter::{DeviceAdapter, EmulatorAdapter, ReferenceAdapter};
pub use assembler::{Assembler, StatementAssembler};
pub use channel::Connection;
pub use client::DebugClient;
pub use config::RunConfig;
pub use engine::{DifferentialEngine, Phase, RunSummary, SweepSummary};
pub use error::{
    AdapterError, AssemblerError, ConfigError, GeneratorError, HarnessError, ProtocolError,
};
pub use generator::{Instruction, InstructionGenerator};
pub use protocol::Register;
pub use report::{FailureContext, MismatchRecord, Snapshot};
pub use server::{DebugServer, ServeEnd};

//! Lockstep differential engine.
//!
//! Drives a reference and a device adapter through the same instruction stream, one
//! instruction at a time, and stops at the first divergence.

use std::time::Instant;

use log::{debug, error, info};
use lockstep65_core::cpu::CpuState;

use crate::adapter::EmulatorAdapter;
use crate::assembler::{Assembler, StatementAssembler};
use crate::config::RunConfig;
use crate::error::{HarnessError, ProtocolError};
use crate::generator::{Instruction, InstructionGenerator};
use crate::protocol::{Command, Register};
use crate::report::{FailureContext, HistoryEntry, MismatchRecord, Snapshot, StoreProbe};

/// Puts both CPUs into a known state: flags cleared, registers zeroed, SP at the top of
/// the stack.
pub const PRIMING_PROLOGUE: [&str; 12] = [
    "CLC", "CLI", "CLD", "CLV", "LDA #$00", "PHA", "PLP", "LDX #$FF", "TXS", "LDA #$00",
    "LDX #$00", "LDY #$00",
];

/// Where the arithmetic sweep places its three-instruction program.
pub const SWEEP_ADDRESS: u16 = 0x1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Built but not yet primed.
    Idle,
    Priming,
    Running,
    /// Terminal: no further instructions are generated.
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: u64,
    pub seed: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepSummary {
    pub cases: u64,
}

pub struct DifferentialEngine<R, D, A = StatementAssembler>
where
    R: EmulatorAdapter,
    D: EmulatorAdapter,
    A: Assembler,
{
    reference: R,
    device: D,
    assembler: A,
    generator: InstructionGenerator,
    config: RunConfig,
    seed: u64,
    phase: Phase,
    executed: u64,
    history: Vec<HistoryEntry>,
    started: Instant,
}

impl<R: EmulatorAdapter, D: EmulatorAdapter> DifferentialEngine<R, D> {
    pub fn new(reference: R, device: D, config: RunConfig, seed: u64) -> Self {
        Self::with_assembler(reference, device, StatementAssembler, config, seed)
    }
}

impl<R, D, A> DifferentialEngine<R, D, A>
where
    R: EmulatorAdapter,
    D: EmulatorAdapter,
    A: Assembler,
{
    pub fn with_assembler(
        reference: R,
        device: D,
        assembler: A,
        config: RunConfig,
        seed: u64,
    ) -> Self {
        let generator = InstructionGenerator::from_seed(seed)
            .max_attempts(config.max_attempts)
            .absolute_page(config.absolute_page);
        Self {
            reference,
            device,
            assembler,
            generator,
            config,
            seed,
            phase: Phase::Idle,
            executed: 0,
            history: Vec::new(),
            started: Instant::now(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn executed(&self) -> u64 {
        self.executed
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn reference(&self) -> &R {
        &self.reference
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_adapters(self) -> (R, D) {
        (self.reference, self.device)
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!("engine phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Run `body`, moving to `Failed` if it errors.
    fn guarded<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, HarnessError>,
    ) -> Result<T, HarnessError> {
        let result = body(self);
        if result.is_err() {
            self.set_phase(Phase::Failed);
        }
        result
    }

    /// Execute the priming prologue on both sides, clear memory and check that both
    /// ended in the same state. Returns that state.
    pub fn prime(&mut self) -> Result<CpuState, HarnessError> {
        if self.phase == Phase::Failed {
            return Err(HarnessError::NotRunning { phase: self.phase });
        }
        self.set_phase(Phase::Priming);
        let before = self.states();
        self.guarded(|engine| {
            engine
                .prime_both()
                .map_err(|err| engine.with_context("priming", Vec::new(), before, err))
        })
    }

    fn prime_both(&mut self) -> Result<CpuState, HarnessError> {
        let origin = self.config.test_address;
        self.execute_statements(&PRIMING_PROLOGUE, origin)?;

        let block = vec![0u8; self.config.reset_block_size as usize];
        for i in 0..self.config.reset_blocks {
            let start = (i as u32 * self.config.reset_block_size as u32) as u16;
            self.write_memory(start, &block)?;
        }
        self.reference.set_pc(origin)?;
        self.device.set_pc(origin)?;

        let reference = Snapshot {
            state: self.reference.state(),
            store: None,
        };
        let device = Snapshot {
            state: self.device.state(),
            store: None,
        };
        self.check("priming", reference, device)?;
        self.set_phase(Phase::Running);
        Ok(reference.state)
    }

    /// Assemble `statements` at `origin`, load them into both sides and step once per
    /// statement.
    fn execute_statements(
        &mut self,
        statements: &[&str],
        origin: u16,
    ) -> Result<(), HarnessError> {
        let code = self.assembler.assemble(statements, origin)?;
        self.reference.write_memory(origin, &code)?;
        self.device.write_memory(origin, &code)?;
        self.reference.set_pc(origin)?;
        self.device.set_pc(origin)?;
        for _ in statements {
            self.reference.step()?;
            self.device.step()?;
        }
        Ok(())
    }

    /// Write a register on both sides.
    pub fn set_register(&mut self, register: Register, value: u16) -> Result<(), HarnessError> {
        self.reference.set_register(register, value)?;
        self.device.set_register(register, value)?;
        Ok(())
    }

    /// Write memory on both sides.
    pub fn write_memory(&mut self, start: u16, bytes: &[u8]) -> Result<(), HarnessError> {
        self.reference.write_memory(start, bytes)?;
        self.device.write_memory(start, bytes)?;
        Ok(())
    }

    /// Generate one instruction and run it on both sides.
    pub fn step_once(&mut self) -> Result<Instruction, HarnessError> {
        self.ensure_running()?;
        self.guarded(|engine| {
            let before = engine.states();
            let zero_page = engine
                .zero_page()
                .map_err(|err| engine.with_context("zero-page snapshot", Vec::new(), before, err))?;
            let instruction = engine.generator.generate(&before.0, &zero_page)?;
            engine.run_instruction(&instruction)?;
            Ok(instruction)
        })
    }

    /// Run a given instruction on both sides and compare the results.
    pub fn execute(
        &mut self,
        instruction: &Instruction,
    ) -> Result<(Snapshot, Snapshot), HarnessError> {
        self.ensure_running()?;
        self.guarded(|engine| engine.run_instruction(instruction))
    }

    fn ensure_running(&self) -> Result<(), HarnessError> {
        match self.phase {
            Phase::Running => Ok(()),
            phase => Err(HarnessError::NotRunning { phase }),
        }
    }

    fn zero_page(&mut self) -> Result<[u8; 256], HarnessError> {
        let bytes = self.reference.read_memory(0x0000, 256)?;
        <[u8; 256]>::try_from(bytes.as_slice()).map_err(|_| {
            HarnessError::from(ProtocolError::UnexpectedPayload {
                command: Command::ReadMemory,
                expected: 256,
                actual: bytes.len(),
            })
        })
    }

    /// Both sides' current register state.
    fn states(&self) -> (CpuState, CpuState) {
        (self.reference.state(), self.device.state())
    }

    /// Attach what is needed to reproduce `err` by hand. Mismatches already carry their
    /// own record and pass through unchanged.
    fn with_context(
        &self,
        instruction: &str,
        bytes: Vec<u8>,
        (reference, device): (CpuState, CpuState),
        err: HarnessError,
    ) -> HarnessError {
        if matches!(
            err,
            HarnessError::StateMismatch(_) | HarnessError::Fatal { .. }
        ) {
            return err;
        }
        error!("{instruction}: {err}");
        HarnessError::Fatal {
            context: Box::new(FailureContext {
                instruction: instruction.to_string(),
                bytes,
                seed: self.seed,
                executed: self.executed,
                flag_mask: self.config.flag_mask,
                reference,
                device,
                history: self.history.clone(),
            }),
            source: Box::new(err),
        }
    }

    fn run_instruction(
        &mut self,
        instruction: &Instruction,
    ) -> Result<(Snapshot, Snapshot), HarnessError> {
        let before = self.states();
        self.compare_instruction(instruction).map_err(|err| {
            self.with_context(&instruction.description, instruction.bytes(), before, err)
        })
    }

    fn compare_instruction(
        &mut self,
        instruction: &Instruction,
    ) -> Result<(Snapshot, Snapshot), HarnessError> {
        let address = self.config.test_address;
        let bytes = instruction.bytes();
        self.reference.write_memory(address, &bytes)?;
        self.device.write_memory(address, &bytes)?;

        let disassembly = self.reference.disassemble_at(address)?;
        self.history.push(HistoryEntry {
            bytes: bytes.clone(),
            text: disassembly.text.clone(),
        });
        if disassembly.length != instruction.length() {
            return Err(HarnessError::LengthDisagreement {
                description: instruction.description.clone(),
                text: disassembly.text,
                generated: instruction.length(),
                disassembled: disassembly.length,
            });
        }

        self.reference.set_pc(address)?;
        self.device.set_pc(address)?;
        self.reference.step()?;
        self.device.step()?;

        let reference = Self::snapshot(&mut self.reference, instruction.store_address)?;
        let device = Self::snapshot(&mut self.device, instruction.store_address)?;
        let label = format!("{} ({})", instruction.description, disassembly.text);
        self.check(&label, reference, device)?;

        self.executed += 1;
        self.report_progress();
        Ok((reference, device))
    }

    fn snapshot<E: EmulatorAdapter>(
        adapter: &mut E,
        store: Option<u16>,
    ) -> Result<Snapshot, HarnessError> {
        let store = match store {
            Some(address) => {
                let bytes = adapter.read_memory(address, 1)?;
                let &[value] = bytes.as_slice() else {
                    return Err(ProtocolError::UnexpectedPayload {
                        command: Command::ReadMemory,
                        expected: 1,
                        actual: bytes.len(),
                    }
                    .into());
                };
                Some(StoreProbe { address, value })
            }
            None => None,
        };
        Ok(Snapshot {
            state: adapter.state(),
            store,
        })
    }

    fn check(
        &self,
        instruction: &str,
        reference: Snapshot,
        device: Snapshot,
    ) -> Result<(), HarnessError> {
        if reference.matches(&device, self.config.flag_mask) {
            return Ok(());
        }
        let record = MismatchRecord {
            instruction: instruction.to_string(),
            seed: self.seed,
            executed: self.executed,
            flag_mask: self.config.flag_mask,
            reference,
            device,
            history: self.history.clone(),
        };
        error!("state mismatch: {instruction}");
        Err(HarnessError::StateMismatch(Box::new(record)))
    }

    fn report_progress(&self) {
        let interval = self.config.progress_interval;
        if interval == 0 || self.executed % interval != 0 {
            return;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            self.executed as f64 / elapsed
        } else {
            0.0
        };
        info!("Instructions: {} ({rate:.0}/s)", self.executed);
    }

    /// Prime if needed, then step until a mismatch, an error, or `limit` instructions.
    pub fn run(&mut self, limit: Option<u64>) -> Result<RunSummary, HarnessError> {
        info!("seed {}", self.seed);
        if self.phase != Phase::Running {
            self.prime()?;
        }
        self.started = Instant::now();
        let mut remaining = limit;
        while remaining != Some(0) {
            self.step_once()?;
            remaining = remaining.map(|n| n - 1);
        }
        Ok(RunSummary {
            executed: self.executed,
            seed: self.seed,
        })
    }

    /// Exhaustive ADC/SBC immediate check: every carry-in, accumulator and operand
    /// combination, comparing A and the masked flags.
    pub fn sweep(&mut self) -> Result<SweepSummary, HarnessError> {
        if self.phase != Phase::Running {
            self.prime()?;
        }
        self.guarded(|engine| {
            let mut cases = 0u64;
            for (carry, op) in [("CLC", "ADC"), ("SEC", "ADC"), ("CLC", "SBC"), ("SEC", "SBC")] {
                info!("sweeping {op} after {carry}");
                for a in 0..=255u8 {
                    for imm in 0..=255u8 {
                        let lda = format!("LDA #${a:02X}");
                        let arith = format!("{op} #${imm:02X}");
                        let label = format!("{carry}; {lda}; {arith}");
                        let before = engine.states();
                        engine
                            .execute_statements(&[carry, &lda, &arith], SWEEP_ADDRESS)
                            .map_err(|err| engine.with_context(&label, Vec::new(), before, err))?;

                        let reference = engine.reference.state();
                        let device = engine.device.state();
                        let mask = engine.config.flag_mask;
                        if reference.a != device.a || (reference.p ^ device.p) & mask != 0 {
                            engine.check(
                                &label,
                                Snapshot {
                                    state: reference,
                                    store: None,
                                },
                                Snapshot {
                                    state: device,
                                    store: None,
                                },
                            )?;
                        }
                        cases += 1;
                    }
                }
            }
            Ok(SweepSummary { cases })
        })
    }
}

//! Mismatch diagnostics.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use lockstep65_core::cpu::CpuState;
use lockstep65_core::cpu::state::format_flags;
use serde::{Deserialize, Serialize};

/// Byte read back from a predicted store address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreProbe {
    pub address: u16,
    pub value: u8,
}

/// One side's post-step view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: CpuState,
    pub store: Option<StoreProbe>,
}

impl Snapshot {
    pub fn matches(&self, other: &Snapshot, flag_mask: u8) -> bool {
        self.state.matches(&other.state, flag_mask) && self.store == other.store
    }
}

/// An instruction executed earlier in the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub bytes: Vec<u8>,
    pub text: String,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bytes {
            write!(f, "{b:02x} ")?;
        }
        write!(f, "{:>width$}{}", "", self.text, width = 3 * (3 - self.bytes.len().min(3)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchRecord {
    /// Description of the failing instruction, or the phase that failed.
    pub instruction: String,
    pub seed: u64,
    /// Instructions that compared equal before this one.
    pub executed: u64,
    pub flag_mask: u8,
    pub reference: Snapshot,
    pub device: Snapshot,
    pub history: Vec<HistoryEntry>,
}

impl MismatchRecord {
    /// Field-by-field rows: name, reference, device.
    pub fn rows(&self) -> Vec<(&'static str, String, String)> {
        let mut rows = state_rows(&self.reference.state, &self.device.state, self.flag_mask);
        if self.reference.store.is_some() || self.device.store.is_some() {
            rows.push((
                "store",
                probe_text(self.reference.store),
                probe_text(self.device.store),
            ));
        }
        rows
    }

    /// Write as pretty JSON, gzip-compressed when the path ends in `.gz`.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        write_json(self, path)
    }
}

/// What the engine knew when an error other than a state mismatch ended the run.
///
/// `reference` and `device` are the last states that compared equal, taken just
/// before the failing instruction was loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    /// Description of the failing instruction, or the phase that failed.
    pub instruction: String,
    /// Encoded instruction; empty when the failure was not tied to one instruction.
    pub bytes: Vec<u8>,
    pub seed: u64,
    pub executed: u64,
    pub flag_mask: u8,
    pub reference: CpuState,
    pub device: CpuState,
    pub history: Vec<HistoryEntry>,
}

impl FailureContext {
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        write_json(self, path)
    }
}

impl fmt::Display for FailureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error:  Instruction: {}", self.instruction)?;
        if !self.bytes.is_empty() {
            let bytes: Vec<String> = self.bytes.iter().map(|b| format!("{b:02x}")).collect();
            writeln!(f, "bytes: {}", bytes.join(" "))?;
        }
        writeln!(f, "seed {} after {} instructions", self.seed, self.executed)?;
        writeln!(f)?;
        writeln!(f, "state before the instruction:")?;
        let rows = state_rows(&self.reference, &self.device, self.flag_mask);
        write_table(f, &rows)?;
        write_history(f, &self.history)
    }
}

fn state_rows(r: &CpuState, d: &CpuState, flag_mask: u8) -> Vec<(&'static str, String, String)> {
    vec![
        ("a", format!("${:02x}", r.a), format!("${:02x}", d.a)),
        ("x", format!("${:02x}", r.x), format!("${:02x}", d.x)),
        ("y", format!("${:02x}", r.y), format!("${:02x}", d.y)),
        ("pc", format!("${:04x}", r.pc), format!("${:04x}", d.pc)),
        ("sp", format!("${:02x}", r.sp), format!("${:02x}", d.sp)),
        ("p", format_flags(r.p, flag_mask), format_flags(d.p, flag_mask)),
    ]
}

fn write_table(f: &mut fmt::Formatter<'_>, rows: &[(&'static str, String, String)]) -> fmt::Result {
    writeln!(f, "{:>12} {:>25} {:>25}", "value", "reference", "device")?;
    for (name, reference, device) in rows {
        let marker = if reference == device { ' ' } else { '*' };
        writeln!(f, "{name:>12} {reference:>25} {device:>25} {marker}")?;
    }
    Ok(())
}

fn write_history(f: &mut fmt::Formatter<'_>, history: &[HistoryEntry]) -> fmt::Result {
    if history.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "history:")?;
    for (i, entry) in history.iter().enumerate() {
        writeln!(f, "{i:>8}  {entry}")?;
    }
    Ok(())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> io::Result<()> {
    let file = BufWriter::new(File::create(path)?);
    if path.extension().is_some_and(|ext| ext == "gz") {
        let mut encoder = GzEncoder::new(file, Compression::default());
        serde_json::to_writer_pretty(&mut encoder, value)?;
        encoder.finish()?.flush()
    } else {
        let mut file = file;
        serde_json::to_writer_pretty(&mut file, value)?;
        file.flush()
    }
}

fn probe_text(probe: Option<StoreProbe>) -> String {
    match probe {
        Some(p) => format!("${:04x}=${:02x}", p.address, p.value),
        None => "-".to_string(),
    }
}

impl fmt::Display for MismatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error:  Instruction: {}", self.instruction)?;
        writeln!(f, "seed {} after {} instructions", self.seed, self.executed)?;
        writeln!(f)?;
        write_table(f, &self.rows())?;
        write_history(f, &self.history)
    }
}

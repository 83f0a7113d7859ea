// (C) 2025 - Enzo Lombardi
// Command subsystem: the multi-key input buffer, the grammar parser,
// and the executor that applies commands to engine state.

pub mod buffer;
pub mod executor;
pub mod parser;

pub use buffer::{CommandBuffer, SENTINEL};
pub use executor::{CommandExecutor, ExecCtx, ExecOutcome};
pub use parser::{ParsedCommand, SpecialKind, Target, parse};

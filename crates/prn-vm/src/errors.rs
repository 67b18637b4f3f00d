//! # VM Error Types
//!
//! Load-time analysis errors and runtime execution errors. The engine
//! never unwinds out of a step: every [`VmError`] is captured into the
//! context's error flag, which halts execution.

use thiserror::Error;

// =============================================================================
// LOAD-TIME ERRORS
// =============================================================================

/// Errors from the load-time control-flow analysis pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlFlowError {
    /// `ELSE` with no open `IF`.
    #[error("ELSE without matching IF at line {line}")]
    ElseWithoutIf { line: usize },

    /// A second `ELSE` inside the same `IF`.
    #[error("duplicate ELSE for the IF at line {if_line}")]
    DuplicateElse { if_line: usize },

    /// `ENDIF` with no open `IF`.
    #[error("ENDIF without matching IF at line {line}")]
    EndifWithoutIf { line: usize },

    /// `ENDLOOP`/`ENDWHILE` with no open loop.
    #[error("{mnemonic} without matching loop at line {line}")]
    EndWithoutLoop { mnemonic: String, line: usize },

    /// A loop closed by the wrong terminator.
    #[error("{found} at line {line} closes a {expected} block")]
    MismatchedLoopEnd {
        expected: &'static str,
        found: String,
        line: usize,
    },

    /// `IF` left open at end of program.
    #[error("IF at line {line} is never closed")]
    UnclosedIf { line: usize },

    /// Loop left open at end of program.
    #[error("loop at line {line} is never closed")]
    UnclosedLoop { line: usize },

    /// The same label declared twice.
    #[error("label {name} declared twice")]
    DuplicateLabel { name: String },
}

// =============================================================================
// RUNTIME ERRORS
// =============================================================================

/// Errors during instruction execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    /// No program is loaded.
    #[error("no program loaded")]
    NoProgram,

    /// Mnemonic not in the instruction set.
    #[error("unknown mnemonic: {0}")]
    UnknownMnemonic(String),

    /// `GOTO`/`CALL` target missing from the label table.
    #[error("unresolved label: {0}")]
    UnresolvedLabel(String),

    /// An instruction is missing a required operand.
    #[error("{mnemonic}: missing operand {index}")]
    MissingOperand { mnemonic: String, index: usize },

    /// An operand has the wrong shape.
    #[error("{mnemonic}: operand {index} must be {expected}")]
    InvalidOperand {
        mnemonic: String,
        index: usize,
        expected: &'static str,
    },

    /// A composite was offered where a prime is required.
    #[error("{0} is not prime")]
    InvalidPrime(u64),

    /// Unknown comparison operator.
    #[error("unknown comparison operator: {0}")]
    UnknownComparison(String),

    /// A bounded stack refused a push.
    #[error("{stack} stack limit exceeded ({limit})")]
    StackLimit { stack: &'static str, limit: usize },

    /// `RETURN` with an empty call stack.
    #[error("RETURN without an active CALL")]
    ReturnWithoutCall,

    /// `BREAK`/`CONTINUE` with no open loop.
    #[error("{0} outside of a loop")]
    OutsideLoop(&'static str),

    /// `ELSE`/`ENDIF` reached with no condition frame.
    #[error("{0} without an open IF")]
    OutsideCondition(&'static str),

    /// Load-time analysis failure surfacing at load.
    #[error(transparent)]
    ControlFlow(#[from] ControlFlowError),
}

// =============================================================================
// TESTS
// =============================================================================

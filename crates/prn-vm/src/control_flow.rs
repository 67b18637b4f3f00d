//! # Control-Flow Analysis
//!
//! One load-time pass over the program builds the label table and pairs
//! every `IF`/`ELSE`/`ENDIF` and `LOOP`/`ENDLOOP`/`WHILE`/`ENDWHILE`
//! across arbitrary nesting. `GOTO`/`CALL` permit cycles, so the program
//! is a graph walked by an explicit instruction pointer, never a tree.

use crate::errors::ControlFlowError;
use crate::program::Program;
use std::collections::HashMap;

/// How the engine treats a mnemonic when deciding IP movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlClass {
    /// Plain instruction: execute, advance.
    Sequential,
    /// `IF`/`IFCOH`: may branch forward.
    ConditionalStart,
    /// `ELSE`: boundary of the true branch.
    ConditionalElse,
    /// `ENDIF`: closes a condition frame.
    ConditionalEnd,
    /// `LOOP`/`WHILE`: opens a loop frame.
    LoopStart,
    /// `ENDLOOP`/`ENDWHILE`: back-edge of a loop.
    LoopEnd,
    /// `GOTO`: unconditional jump through the label table.
    Jump,
    /// `CALL`: jump plus call frame.
    Call,
    /// `RETURN`: pops a call frame.
    Return,
    /// `BREAK`: leaves the innermost loop.
    Break,
    /// `CONTINUE`: re-enters the innermost loop.
    Continue,
    /// `WAITCOH`: may park the engine without advancing.
    Wait,
    /// `HALT`: stops the engine.
    Halt,
    /// `LABEL`: jump target marker, no effect.
    Label,
}

/// Classifies an (uppercased) mnemonic.
#[must_use]
pub fn classify(mnemonic: &str) -> ControlClass {
    match mnemonic {
        "IF" | "IFCOH" => ControlClass::ConditionalStart,
        "ELSE" => ControlClass::ConditionalElse,
        "ENDIF" => ControlClass::ConditionalEnd,
        "LOOP" | "WHILE" => ControlClass::LoopStart,
        "ENDLOOP" | "ENDWHILE" => ControlClass::LoopEnd,
        "GOTO" => ControlClass::Jump,
        "CALL" => ControlClass::Call,
        "RETURN" => ControlClass::Return,
        "BREAK" => ControlClass::Break,
        "CONTINUE" => ControlClass::Continue,
        "WAITCOH" => ControlClass::Wait,
        "HALT" => ControlClass::Halt,
        "LABEL" => ControlClass::Label,
        _ => ControlClass::Sequential,
    }
}

/// Pairing record for one `IF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfEntry {
    /// IP of the paired `ELSE`, if present.
    pub else_ip: Option<usize>,
    /// IP of the paired `ENDIF`.
    pub end_ip: usize,
}

/// Kind of loop opener, for terminator validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopKind {
    Counted,
    While,
}

impl LoopKind {
    fn terminator(self) -> &'static str {
        match self {
            Self::Counted => "ENDLOOP",
            Self::While => "ENDWHILE",
        }
    }
}

/// The load-time jump tables.
#[derive(Debug, Clone, Default)]
pub struct ControlFlow {
    labels: HashMap<String, usize>,
    if_entries: HashMap<usize, IfEntry>,
    else_to_end: HashMap<usize, usize>,
    loop_start_to_end: HashMap<usize, usize>,
    loop_end_to_start: HashMap<usize, usize>,
}

impl ControlFlow {
    /// Runs the stack-based pairing pass over `program`.
    ///
    /// # Errors
    ///
    /// Unbalanced conditionals or loops, mismatched terminators, and
    /// duplicate labels.
    pub fn analyze(program: &Program) -> Result<Self, ControlFlowError> {
        let mut flow = Self::default();
        let mut if_stack: Vec<(usize, Option<usize>, usize)> = Vec::new(); // (ip, else_ip, line)
        let mut loop_stack: Vec<(usize, LoopKind, usize)> = Vec::new(); // (ip, kind, line)

        for (ip, instruction) in program.instructions.iter().enumerate() {
            let line = instruction.line;
            match classify(&instruction.mnemonic) {
                ControlClass::Label => {
                    if let Some(name) = instruction.args.first().and_then(|a| a.as_str()) {
                        if flow.labels.insert(name.to_string(), ip).is_some() {
                            return Err(ControlFlowError::DuplicateLabel {
                                name: name.to_string(),
                            });
                        }
                    }
                }
                ControlClass::ConditionalStart => {
                    if_stack.push((ip, None, line));
                }
                ControlClass::ConditionalElse => {
                    let Some(top) = if_stack.last_mut() else {
                        return Err(ControlFlowError::ElseWithoutIf { line });
                    };
                    if top.1.is_some() {
                        return Err(ControlFlowError::DuplicateElse { if_line: top.2 });
                    }
                    top.1 = Some(ip);
                }
                ControlClass::ConditionalEnd => {
                    let Some((if_ip, else_ip, _)) = if_stack.pop() else {
                        return Err(ControlFlowError::EndifWithoutIf { line });
                    };
                    flow.if_entries.insert(
                        if_ip,
                        IfEntry {
                            else_ip,
                            end_ip: ip,
                        },
                    );
                    if let Some(else_ip) = else_ip {
                        flow.else_to_end.insert(else_ip, ip);
                    }
                }
                ControlClass::LoopStart => {
                    let kind = if instruction.mnemonic == "WHILE" {
                        LoopKind::While
                    } else {
                        LoopKind::Counted
                    };
                    loop_stack.push((ip, kind, line));
                }
                ControlClass::LoopEnd => {
                    let Some((start_ip, kind, _)) = loop_stack.pop() else {
                        return Err(ControlFlowError::EndWithoutLoop {
                            mnemonic: instruction.mnemonic.clone(),
                            line,
                        });
                    };
                    if instruction.mnemonic != kind.terminator() {
                        return Err(ControlFlowError::MismatchedLoopEnd {
                            expected: kind.terminator(),
                            found: instruction.mnemonic.clone(),
                            line,
                        });
                    }
                    flow.loop_start_to_end.insert(start_ip, ip);
                    flow.loop_end_to_start.insert(ip, start_ip);
                }
                _ => {}
            }
        }

        if let Some((_, _, line)) = if_stack.first() {
            return Err(ControlFlowError::UnclosedIf { line: *line });
        }
        if let Some((_, _, line)) = loop_stack.first() {
            return Err(ControlFlowError::UnclosedLoop { line: *line });
        }
        Ok(flow)
    }

    /// Resolves a label to its IP.
    #[must_use]
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// The pairing entry of the `IF` at `ip`.
    #[must_use]
    pub fn if_entry(&self, ip: usize) -> Option<IfEntry> {
        self.if_entries.get(&ip).copied()
    }

    /// `ENDIF` IP paired with the `ELSE` at `ip`.
    #[must_use]
    pub fn else_end(&self, ip: usize) -> Option<usize> {
        self.else_to_end.get(&ip).copied()
    }

    /// Terminator IP of the loop opening at `ip`.
    #[must_use]
    pub fn loop_end(&self, start_ip: usize) -> Option<usize> {
        self.loop_start_to_end.get(&start_ip).copied()
    }

    /// Opener IP of the loop terminating at `ip`.
    #[must_use]
    pub fn loop_start(&self, end_ip: usize) -> Option<usize> {
        self.loop_end_to_start.get(&end_ip).copied()
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # Execution Engine
//!
//! Owns the program, the jump tables, the machine state, the three
//! control stacks and the RNG. The step loop is:
//! fetch, classify, dispatch, then advance the IP only when the handler
//! asked for it.
//!
//! Errors never unwind out of a step: any [`VmError`] raised by a
//! handler lands in the context's error flag and stops the engine.

use crate::control_flow::{classify, ControlFlow};
use crate::errors::VmError;
use crate::holographic::HolographicStore;
use crate::instructions;
use crate::program::{Argument, Program};
use crate::stacks::{StackLimits, StackManager};
use crate::state::VmState;
use prn_numerics::Lcg64;
use serde::Serialize;
use std::time::Instant;

/// Default step budget for [`Engine::run`].
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

/// Comparison tolerance for `EQ`/`NE` on floats.
const EQ_EPSILON: f64 = 1e-9;

// =============================================================================
// CONTEXT
// =============================================================================

/// Engine status flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionFlags {
    /// The driver has started the engine and no stop condition fired.
    pub running: bool,
    /// `HALT` executed or the program ran off its end.
    pub halted: bool,
    /// `WAITCOH` is parked below its threshold.
    pub waiting: bool,
    /// Fatal error message, if any.
    pub error: Option<String>,
}

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionMetrics {
    /// Instructions dispatched successfully.
    pub instructions_executed: u64,
}

/// Instruction pointer, flags and metrics of one run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Next instruction to execute.
    pub ip: usize,
    /// Status flags.
    pub flags: ExecutionFlags,
    /// Counters.
    pub metrics: ExecutionMetrics,
}

impl ExecutionContext {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Outcome of one [`Engine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// An instruction executed; the engine can step again.
    Continue,
    /// `WAITCOH` is below threshold; re-step later.
    Waiting,
    /// The engine halted normally.
    Halted,
    /// The error flag is set.
    Faulted,
}

/// Exit status of one execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStatus {
    /// True when the program halted without error.
    pub success: bool,
    /// Wall-clock run time. Cosmetic.
    pub execution_time_ms: f64,
    /// Instructions dispatched.
    pub instructions_executed: u64,
    /// Error message when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// ENGINE
// =============================================================================

/// The RISA virtual machine.
pub struct Engine {
    pub(crate) program: Option<Program>,
    pub(crate) control: ControlFlow,
    pub(crate) state: VmState,
    pub(crate) holo: HolographicStore,
    pub(crate) stacks: StackManager,
    pub(crate) context: ExecutionContext,
    pub(crate) rng: Lcg64,
    pub(crate) outputs: Vec<String>,
    observers: Vec<Box<dyn FnMut(&str) + Send>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("ip", &self.context.ip)
            .field("flags", &self.context.flags)
            .field("oscillators", &self.state.oscillator_count())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Engine {
    /// Engine with default stack limits and the default RNG seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(StackLimits::default())
    }

    /// Engine with explicit stack limits.
    #[must_use]
    pub fn with_limits(limits: StackLimits) -> Self {
        Self {
            program: None,
            control: ControlFlow::default(),
            state: VmState::new(),
            holo: HolographicStore::new(),
            stacks: StackManager::new(limits),
            context: ExecutionContext::default(),
            rng: Lcg64::default(),
            outputs: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Reseeds the engine RNG (affects `RANDOM`, `DECOHERE`, `COLLAPSE`,
    /// `MEASURE`).
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    /// Loads a program: runs control-flow analysis, resets the execution
    /// context and control stacks. Machine state and the holographic
    /// store persist across loads; use [`Engine::reset`] to clear them.
    ///
    /// # Errors
    ///
    /// Control-flow analysis failures (unbalanced blocks, duplicate
    /// labels).
    pub fn load_program(&mut self, program: Program) -> Result<(), VmError> {
        let control = ControlFlow::analyze(&program)?;
        tracing::debug!(instructions = program.len(), "program loaded");
        self.control = control;
        self.program = Some(program);
        self.context.reset();
        self.stacks.clear();
        Ok(())
    }

    /// Clears everything: context, stacks, state, store, outputs.
    pub fn reset(&mut self) {
        self.context.reset();
        self.stacks.clear();
        self.state.clear();
        self.holo.clear();
        self.outputs.clear();
    }

    /// Machine state (oscillators, registers, entropy model).
    #[must_use]
    pub fn state(&self) -> &VmState {
        &self.state
    }

    /// The holographic store.
    #[must_use]
    pub fn holographic(&self) -> &HolographicStore {
        &self.holo
    }

    /// Execution context (IP, flags, metrics).
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// The call/loop/condition stacks.
    #[must_use]
    pub fn stacks(&self) -> &StackManager {
        &self.stacks
    }

    /// Lines emitted by `OUTPUT` so far.
    #[must_use]
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Subscribes an observer to `OUTPUT` lines.
    pub fn on_output(&mut self, observer: Box<dyn FnMut(&str) + Send>) {
        self.observers.push(observer);
    }

    pub(crate) fn emit(&mut self, line: String) {
        for observer in &mut self.observers {
            observer(&line);
        }
        self.outputs.push(line);
    }

    /// Executes one instruction.
    pub fn step(&mut self) -> StepOutcome {
        if self.context.flags.error.is_some() {
            return StepOutcome::Faulted;
        }
        if self.context.flags.halted || !self.context.flags.running {
            return StepOutcome::Halted;
        }

        let Some(program) = &self.program else {
            return self.fault(VmError::NoProgram);
        };
        let Some(instruction) = program.instructions.get(self.context.ip).cloned() else {
            // Ran off the end: a normal halt.
            self.context.flags.halted = true;
            self.context.flags.running = false;
            return StepOutcome::Halted;
        };

        let class = classify(&instruction.mnemonic);
        let Some(handler) = instructions::lookup(&instruction.mnemonic) else {
            return self.fault(VmError::UnknownMnemonic(instruction.mnemonic));
        };

        tracing::trace!(ip = self.context.ip, mnemonic = %instruction.mnemonic, ?class, "dispatch");
        match handler.execute(self, &instruction.args) {
            Ok(advance) => {
                self.context.metrics.instructions_executed += 1;
                if advance {
                    self.context.ip += 1;
                }
                if self.context.flags.waiting {
                    StepOutcome::Waiting
                } else if self.context.flags.halted {
                    self.context.flags.running = false;
                    StepOutcome::Halted
                } else {
                    StepOutcome::Continue
                }
            }
            Err(err) => self.fault(err),
        }
    }

    fn fault(&mut self, err: VmError) -> StepOutcome {
        tracing::warn!(ip = self.context.ip, error = %err, "engine fault");
        self.context.flags.error = Some(err.to_string());
        self.context.flags.running = false;
        StepOutcome::Faulted
    }

    /// Runs until halt, fault, wait, or the step budget is spent.
    ///
    /// A spent budget is reported as an error; a parked `WAITCOH` is
    /// reported as unsuccessful but error-free, and the driver may call
    /// [`Engine::run`] again later.
    pub fn run(&mut self, max_steps: u64) -> ExecutionStatus {
        let started = Instant::now();
        self.context.flags.running = true;
        self.context.flags.halted = false;

        let mut steps = 0u64;
        loop {
            if steps >= max_steps {
                self.context.flags.error = Some(format!("step budget exceeded: {max_steps}"));
                self.context.flags.running = false;
                break;
            }
            steps += 1;
            match self.step() {
                StepOutcome::Continue => {}
                StepOutcome::Waiting | StepOutcome::Halted | StepOutcome::Faulted => break,
            }
        }

        let flags = &self.context.flags;
        ExecutionStatus {
            success: flags.error.is_none() && flags.halted,
            execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            instructions_executed: self.context.metrics.instructions_executed,
            error: flags.error.clone(),
        }
    }

    // =========================================================================
    // HANDLER SUPPORT
    // =========================================================================

    /// Operand at `index`, or a `MissingOperand` error.
    pub(crate) fn arg<'a>(
        &self,
        mnemonic: &str,
        args: &'a [Argument],
        index: usize,
    ) -> Result<&'a Argument, VmError> {
        args.get(index).ok_or_else(|| VmError::MissingOperand {
            mnemonic: mnemonic.to_string(),
            index,
        })
    }

    /// Numeric operand: literals pass through, strings read registers
    /// (absent registers read as zero).
    pub(crate) fn value_arg(
        &self,
        mnemonic: &str,
        args: &[Argument],
        index: usize,
    ) -> Result<f64, VmError> {
        let arg = self.arg(mnemonic, args, index)?;
        Ok(match arg {
            Argument::Int(v) => *v as f64,
            Argument::Float(v) => *v,
            Argument::Str(name) => self.state.register(name),
        })
    }

    /// Prime operand: a non-negative integer that passes the primality
    /// test.
    pub(crate) fn prime_arg(
        &self,
        mnemonic: &str,
        args: &[Argument],
        index: usize,
    ) -> Result<u64, VmError> {
        let arg = self.arg(mnemonic, args, index)?;
        let value = arg.as_u64().ok_or_else(|| VmError::InvalidOperand {
            mnemonic: mnemonic.to_string(),
            index,
            expected: "a prime number",
        })?;
        if !prn_numerics::is_prime(value) {
            return Err(VmError::InvalidPrime(value));
        }
        Ok(value)
    }

    /// String operand (register or label name).
    pub(crate) fn str_arg<'a>(
        &self,
        mnemonic: &str,
        args: &'a [Argument],
        index: usize,
    ) -> Result<&'a str, VmError> {
        self.arg(mnemonic, args, index)?
            .as_str()
            .ok_or_else(|| VmError::InvalidOperand {
                mnemonic: mnemonic.to_string(),
                index,
                expected: "a name",
            })
    }

    /// Evaluates `a op b` for the comparison mnemonics.
    pub(crate) fn compare(op: &str, a: f64, b: f64) -> Result<bool, VmError> {
        Ok(match op.to_ascii_uppercase().as_str() {
            "EQ" | "==" => (a - b).abs() < EQ_EPSILON,
            "NE" | "!=" => (a - b).abs() >= EQ_EPSILON,
            "LT" | "<" => a < b,
            "LE" | "<=" => a <= b,
            "GT" | ">" => a > b,
            "GE" | ">=" => a >= b,
            other => return Err(VmError::UnknownComparison(other.to_string())),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

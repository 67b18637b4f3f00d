//! # RISA Virtual Machine
//!
//! A register/stack interpreter over prime-indexed oscillators. Machine
//! state is a table of per-prime oscillators (amplitude + phase), a named
//! register file, and a holographic key/value store. Control flow
//! (if/else, counted and conditional loops, call/return, goto/label,
//! break/continue) runs off jump tables built by a single load-time
//! analysis pass.
//!
//! ## Execution model
//!
//! The driver owns an [`Engine`], loads a [`Program`] (text assembler or
//! JSON records), and steps it. Handlers return whether the IP should
//! auto-advance; all failures surface as the context's error flag and
//! halt the engine. `WAITCOH` below threshold parks the engine without
//! advancing; the driver decides the retry cadence.
//!
//! ```
//! use prn_vm::{Engine, Program, DEFAULT_MAX_STEPS};
//!
//! let mut engine = Engine::new();
//! let program = Program::parse("LOAD 7 0.8\nOBSERVE 7\nHALT\n").unwrap();
//! engine.load_program(program).unwrap();
//! let status = engine.run(DEFAULT_MAX_STEPS);
//! assert!(status.success);
//! assert_eq!(engine.state().register("P7_amp"), 0.8);
//! ```

pub mod control_flow;
pub mod engine;
pub mod errors;
pub mod holographic;
pub mod instructions;
pub mod program;
pub mod stacks;
pub mod state;

pub use control_flow::{classify, ControlClass, ControlFlow};
pub use engine::{
    Engine, ExecutionContext, ExecutionFlags, ExecutionMetrics, ExecutionStatus, StepOutcome,
    DEFAULT_MAX_STEPS,
};
pub use errors::{ControlFlowError, VmError};
pub use holographic::HolographicStore;
pub use program::{Argument, Instruction, ParseError, Program};
pub use stacks::{CallFrame, ConditionFrame, LoopFrame, StackLimits, StackManager};
pub use state::{Oscillator, Register, RegisterKind, VmState};

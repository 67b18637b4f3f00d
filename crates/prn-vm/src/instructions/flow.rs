//! Control-flow instructions: conditionals, loops, jumps, calls.
//!
//! Handlers that move the IP return `Ok(false)` to suppress the engine's
//! auto-advance. Branch targets come from the load-time jump tables; a
//! missing pairing here means the analyser was bypassed and is reported
//! as an error rather than a panic.

use super::{Handler, Registry};
use crate::engine::Engine;
use crate::errors::VmError;
use crate::program::Argument;
use crate::stacks::{CallFrame, ConditionFrame, LoopFrame};

/// `IF a op b`: run the true branch, or jump to `ELSE`/`ENDIF`.
struct If;

impl Handler for If {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let a = engine.value_arg("IF", args, 0)?;
        let op = engine.str_arg("IF", args, 1)?;
        let b = engine.value_arg("IF", args, 2)?;
        let condition = Engine::compare(op, a, b)?;
        branch(engine, condition)
    }
}

/// `IFCOH p1 p2 op t`: branch on the pairwise coherence of two primes.
struct IfCoh;

impl Handler for IfCoh {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let p1 = engine.prime_arg("IFCOH", args, 0)?;
        let p2 = engine.prime_arg("IFCOH", args, 1)?;
        let op = engine.str_arg("IFCOH", args, 2)?;
        let threshold = engine.value_arg("IFCOH", args, 3)?;
        let coherence = engine.state.coherence(p1, p2);
        let condition = Engine::compare(op, coherence, threshold)?;
        branch(engine, condition)
    }
}

/// Shared `IF`-family branch mechanics.
fn branch(engine: &mut Engine, condition: bool) -> Result<bool, VmError> {
    let ip = engine.context.ip;
    let entry = engine
        .control
        .if_entry(ip)
        .ok_or(VmError::OutsideCondition("IF"))?;

    let pushed = engine.stacks.push_condition(ConditionFrame {
        if_ip: ip,
        branch_taken: condition,
        // Jumping straight into the else-branch consumes the ELSE marker.
        else_seen: !condition && entry.else_ip.is_some(),
    });
    if !pushed {
        return Err(VmError::StackLimit {
            stack: "condition",
            limit: engine.stacks.limits().max_condition_depth,
        });
    }

    if condition {
        Ok(true)
    } else {
        engine.context.ip = match entry.else_ip {
            Some(else_ip) => else_ip + 1,
            None => entry.end_ip,
        };
        Ok(false)
    }
}

/// `ELSE`: end of the taken true branch; skip to `ENDIF`.
struct Else;

impl Handler for Else {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let _ = args;
        let ip = engine.context.ip;
        let end_ip = engine
            .control
            .else_end(ip)
            .ok_or(VmError::OutsideCondition("ELSE"))?;
        let frame = engine
            .stacks
            .current_condition_mut()
            .ok_or(VmError::OutsideCondition("ELSE"))?;
        frame.else_seen = true;
        engine.context.ip = end_ip;
        Ok(false)
    }
}

/// `ENDIF`: closes the innermost condition frame.
struct EndIf;

impl Handler for EndIf {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let _ = args;
        engine
            .stacks
            .pop_condition()
            .ok_or(VmError::OutsideCondition("ENDIF"))?;
        Ok(true)
    }
}

/// `LOOP n`: open a counted loop; zero iterations skip the body.
struct Loop;

impl Handler for Loop {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let count =
            engine
                .arg("LOOP", args, 0)?
                .as_u64()
                .ok_or(VmError::InvalidOperand {
                    mnemonic: "LOOP".to_string(),
                    index: 0,
                    expected: "a non-negative iteration count",
                })?;
        let ip = engine.context.ip;
        let end_ip = engine
            .control
            .loop_end(ip)
            .ok_or(VmError::OutsideLoop("LOOP"))?;

        if count == 0 {
            engine.context.ip = end_ip + 1;
            return Ok(false);
        }

        let pushed = engine.stacks.push_loop(LoopFrame {
            start_ip: ip,
            end_ip,
            iterations: 0,
            max_iterations: count,
            is_while: false,
        });
        if !pushed {
            return Err(VmError::StackLimit {
                stack: "loop",
                limit: engine.stacks.limits().max_loop_depth,
            });
        }
        Ok(true)
    }
}

/// `ENDLOOP`: bump the counter and jump back, or fall through when done.
struct EndLoop;

impl Handler for EndLoop {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let _ = args;
        let frame = engine
            .stacks
            .current_loop_mut()
            .ok_or(VmError::OutsideLoop("ENDLOOP"))?;
        if frame.is_while {
            return Err(VmError::OutsideLoop("ENDLOOP"));
        }
        frame.iterations += 1;
        if frame.iterations < frame.max_iterations {
            engine.context.ip = frame.start_ip + 1;
            Ok(false)
        } else {
            engine.stacks.pop_loop();
            Ok(true)
        }
    }
}

/// `WHILE a op b`: evaluated on every pass; false exits past `ENDWHILE`.
struct While;

impl Handler for While {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let a = engine.value_arg("WHILE", args, 0)?;
        let op = engine.str_arg("WHILE", args, 1)?;
        let b = engine.value_arg("WHILE", args, 2)?;
        let condition = Engine::compare(op, a, b)?;

        let ip = engine.context.ip;
        let end_ip = engine
            .control
            .loop_end(ip)
            .ok_or(VmError::OutsideLoop("WHILE"))?;
        let already_open = engine
            .stacks
            .current_loop()
            .is_some_and(|f| f.is_while && f.start_ip == ip);

        if condition {
            if !already_open {
                let pushed = engine.stacks.push_loop(LoopFrame {
                    start_ip: ip,
                    end_ip,
                    iterations: 0,
                    max_iterations: u64::MAX,
                    is_while: true,
                });
                if !pushed {
                    return Err(VmError::StackLimit {
                        stack: "loop",
                        limit: engine.stacks.limits().max_loop_depth,
                    });
                }
            }
            Ok(true)
        } else {
            if already_open {
                engine.stacks.pop_loop();
            }
            engine.context.ip = end_ip + 1;
            Ok(false)
        }
    }
}

/// `ENDWHILE`: back-edge to the `WHILE` for re-evaluation.
struct EndWhile;

impl Handler for EndWhile {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let _ = args;
        let frame = engine
            .stacks
            .current_loop_mut()
            .ok_or(VmError::OutsideLoop("ENDWHILE"))?;
        if !frame.is_while {
            return Err(VmError::OutsideLoop("ENDWHILE"));
        }
        frame.iterations += 1;
        engine.context.ip = frame.start_ip;
        Ok(false)
    }
}

/// `BREAK`: pop the innermost loop and jump past its terminator.
struct Break;

impl Handler for Break {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let _ = args;
        let frame = engine
            .stacks
            .pop_loop()
            .ok_or(VmError::OutsideLoop("BREAK"))?;
        engine.context.ip = frame.end_ip + 1;
        Ok(false)
    }
}

/// `CONTINUE`: re-enter the innermost loop. A `WHILE` re-evaluates its
/// condition; a counted loop runs its terminator so the counter moves.
struct Continue;

impl Handler for Continue {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let _ = args;
        let frame = engine
            .stacks
            .current_loop()
            .ok_or(VmError::OutsideLoop("CONTINUE"))?;
        engine.context.ip = if frame.is_while {
            frame.start_ip
        } else {
            frame.end_ip
        };
        Ok(false)
    }
}

/// `GOTO label`: unconditional jump through the label table.
struct Goto;

impl Handler for Goto {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let label = engine.str_arg("GOTO", args, 0)?;
        let target = engine
            .control
            .label(label)
            .ok_or_else(|| VmError::UnresolvedLabel(label.to_string()))?;
        engine.context.ip = target;
        Ok(false)
    }
}

/// `CALL label [params...]`: push a frame and jump.
struct Call;

impl Handler for Call {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let label = engine.str_arg("CALL", args, 0)?;
        let target = engine
            .control
            .label(label)
            .ok_or_else(|| VmError::UnresolvedLabel(label.to_string()))?;
        let frame = CallFrame {
            return_ip: engine.context.ip + 1,
            scope: label.to_string(),
            parameters: args[1..].to_vec(),
        };
        if !engine.stacks.push_call(frame) {
            return Err(VmError::StackLimit {
                stack: "call",
                limit: engine.stacks.limits().max_call_depth,
            });
        }
        engine.context.ip = target;
        Ok(false)
    }
}

/// `RETURN`: pop the innermost frame and restore its return IP.
struct Return;

impl Handler for Return {
    fn execute(&self, engine: &mut Engine, args: &[Argument]) -> Result<bool, VmError> {
        let _ = args;
        let frame = engine.stacks.pop_call().ok_or(VmError::ReturnWithoutCall)?;
        engine.context.ip = frame.return_ip;
        Ok(false)
    }
}

/// `LABEL name`: jump-target marker.
struct Label;

impl Handler for Label {
    fn execute(&self, _engine: &mut Engine, _args: &[Argument]) -> Result<bool, VmError> {
        Ok(true)
    }
}

/// `NOP`: explicit no-op.
struct Nop;

impl Handler for Nop {
    fn execute(&self, _engine: &mut Engine, _args: &[Argument]) -> Result<bool, VmError> {
        Ok(true)
    }
}

/// `HALT`: stop the engine.
struct Halt;

impl Handler for Halt {
    fn execute(&self, engine: &mut Engine, _args: &[Argument]) -> Result<bool, VmError> {
        engine.context.flags.halted = true;
        Ok(false)
    }
}

pub(super) fn register(map: &mut Registry) {
    map.insert("IF", Box::new(If));
    map.insert("IFCOH", Box::new(IfCoh));
    map.insert("ELSE", Box::new(Else));
    map.insert("ENDIF", Box::new(EndIf));
    map.insert("LOOP", Box::new(Loop));
    map.insert("ENDLOOP", Box::new(EndLoop));
    map.insert("WHILE", Box::new(While));
    map.insert("ENDWHILE", Box::new(EndWhile));
    map.insert("BREAK", Box::new(Break));
    map.insert("CONTINUE", Box::new(Continue));
    map.insert("GOTO", Box::new(Goto));
    map.insert("CALL", Box::new(Call));
    map.insert("RETURN", Box::new(Return));
    map.insert("LABEL", Box::new(Label));
    map.insert("NOP", Box::new(Nop));
    map.insert("HALT", Box::new(Halt));
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::engine::{Engine, DEFAULT_MAX_STEPS};
    use crate::program::Program;
    use crate::stacks::StackLimits;

    fn run(source: &str) -> Engine {
        let mut engine = Engine::new();
        engine
            .load_program(Program::parse(source).unwrap())
            .unwrap();
        let status = engine.run(DEFAULT_MAX_STEPS);
        assert!(status.success, "{:?}", status.error);
        engine
    }

    fn run_failing(source: &str) -> String {
        let mut engine = Engine::new();
        engine
            .load_program(Program::parse(source).unwrap())
            .unwrap();
        let status = engine.run(DEFAULT_MAX_STEPS);
        assert!(!status.success);
        status.error.unwrap()
    }

    #[test]
    fn test_if_true_branch() {
        let engine = run("IF 1 EQ 1\nLOAD 2 1.0\nELSE\nLOAD 3 1.0\nENDIF\nHALT\n");
        assert_eq!(engine.state().amplitude(2), 1.0);
        assert_eq!(engine.state().amplitude(3), 0.0);
    }

    #[test]
    fn test_if_false_takes_else() {
        let engine = run("IF 1 GT 2\nLOAD 2 1.0\nELSE\nLOAD 3 1.0\nENDIF\nHALT\n");
        assert_eq!(engine.state().amplitude(2), 0.0);
        assert_eq!(engine.state().amplitude(3), 1.0);
    }

    #[test]
    fn test_if_false_without_else() {
        let engine = run("IF 1 GT 2\nLOAD 2 1.0\nENDIF\nLOAD 5 0.5\nHALT\n");
        assert_eq!(engine.state().amplitude(2), 0.0);
        assert_eq!(engine.state().amplitude(5), 0.5);
    }

    #[test]
    fn test_symbol_operator_aliases() {
        let engine = run("IF 3 >= 3\nLOAD 2 1.0\nENDIF\nHALT\n");
        assert_eq!(engine.state().amplitude(2), 1.0);
    }

    #[test]
    fn test_nested_conditionals() {
        let source = "\
IF 1 EQ 1
  IF 2 GT 5
    LOAD 2 1.0
  ELSE
    LOAD 3 1.0
  ENDIF
ELSE
  LOAD 5 1.0
ENDIF
HALT
";
        let engine = run(source);
        assert_eq!(engine.state().amplitude(2), 0.0);
        assert_eq!(engine.state().amplitude(3), 1.0);
        assert_eq!(engine.state().amplitude(5), 0.0);
    }

    #[test]
    fn test_counted_loop_runs_exactly_n_times() {
        let engine = run("LOOP 4\nADD 2 0.1\nENDLOOP\nHALT\n");
        assert!((engine.state().amplitude(2) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_loop_zero_skips_body() {
        let engine = run("LOOP 0\nLOAD 2 1.0\nENDLOOP\nHALT\n");
        assert_eq!(engine.state().amplitude(2), 0.0);
    }

    #[test]
    fn test_nested_loops_multiply() {
        let engine = run("LOOP 3\nLOOP 2\nADD 2 0.1\nENDLOOP\nENDLOOP\nHALT\n");
        assert!((engine.state().amplitude(2) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_while_with_break_runs_once() {
        // The condition register never changes; BREAK bounds the loop.
        let source = "\
WHILE i LT 3
  ADD 2 0.25
  BREAK
ENDWHILE
HALT
";
        let engine = run(source);
        assert!((engine.state().amplitude(2) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_while_false_skips_entirely() {
        let engine = run("WHILE 5 LT 3\nLOAD 2 1.0\nENDWHILE\nLOAD 3 0.5\nHALT\n");
        assert_eq!(engine.state().amplitude(2), 0.0);
        assert_eq!(engine.state().amplitude(3), 0.5);
    }

    #[test]
    fn test_while_terminates_on_condition() {
        // amp(2) grows 0.2 per pass; WHILE reads it through OBSERVE.
        let source = "\
OBSERVE 2 c
WHILE c_amp LT 0.59
  ADD 2 0.2
  OBSERVE 2 c
ENDWHILE
HALT
";
        let engine = run(source);
        assert!((engine.state().amplitude(2) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_break_exits_innermost_loop() {
        let source = "\
LOOP 3
  ADD 2 0.1
  LOOP 5
    ADD 3 0.1
    BREAK
    ADD 5 1.0
  ENDLOOP
ENDLOOP
HALT
";
        let engine = run(source);
        assert!((engine.state().amplitude(2) - 0.3).abs() < 1e-12);
        assert!((engine.state().amplitude(3) - 0.3).abs() < 1e-12);
        assert_eq!(engine.state().amplitude(5), 0.0);
    }

    #[test]
    fn test_continue_in_counted_loop_still_counts() {
        let source = "\
LOOP 3
  ADD 2 0.1
  CONTINUE
  ADD 5 1.0
ENDLOOP
HALT
";
        let engine = run(source);
        assert!((engine.state().amplitude(2) - 0.3).abs() < 1e-12);
        assert_eq!(engine.state().amplitude(5), 0.0);
    }

    #[test]
    fn test_goto_skips_instructions() {
        let engine = run("ADD 2 0.1\nGOTO past\nADD 2 5.0\nLABEL past\nADD 3 0.1\nHALT\n");
        assert!((engine.state().amplitude(2) - 0.1).abs() < 1e-12);
        assert!((engine.state().amplitude(3) - 0.1).abs() < 1e-12);
        // HALT is the resting instruction.
        assert_eq!(engine.context().ip, 5);
    }

    #[test]
    fn test_goto_unresolved_label_faults() {
        let err = run_failing("GOTO nowhere\nHALT\n");
        assert!(err.contains("unresolved label"));
    }

    #[test]
    fn test_call_and_return() {
        let source = "\
CALL boost
ADD 3 0.1
HALT
LABEL boost
ADD 2 0.5
RETURN
";
        let engine = run(source);
        assert!((engine.state().amplitude(2) - 0.5).abs() < 1e-12);
        assert!((engine.state().amplitude(3) - 0.1).abs() < 1e-12);
        assert_eq!(engine.stacks.call_depth(), 0);
    }

    #[test]
    fn test_recursion_hits_call_limit() {
        let limits = StackLimits {
            max_call_depth: 16,
            ..StackLimits::default()
        };
        let mut engine = Engine::with_limits(limits);
        engine
            .load_program(Program::parse("LABEL rec\nCALL rec\nHALT\n").unwrap())
            .unwrap();
        let status = engine.run(DEFAULT_MAX_STEPS);
        assert!(!status.success);
        assert!(status.error.unwrap().contains("call stack limit"));
    }

    #[test]
    fn test_return_without_call_faults() {
        let err = run_failing("RETURN\nHALT\n");
        assert!(err.contains("RETURN"));
    }

    #[test]
    fn test_break_outside_loop_faults() {
        let err = run_failing("BREAK\nHALT\n");
        assert!(err.contains("outside of a loop"));
    }
}

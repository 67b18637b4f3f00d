//! Whole-program VM scenarios: arithmetic-and-halt, jumps, nested
//! control flow, and the JSON assembler surface.

use prn_vm::{Engine, Program, StackLimits, DEFAULT_MAX_STEPS};

fn run(source: &str) -> Engine {
    let mut engine = Engine::new();
    engine
        .load_program(Program::parse(source).unwrap())
        .unwrap();
    let status = engine.run(DEFAULT_MAX_STEPS);
    assert!(status.success, "{:?}", status.error);
    engine
}

#[test]
fn add_and_halt_leaves_result() {
    let source = "\
LOAD 2 0.10
ADD 2 0.20
OBSERVE 2 result
HALT
";
    let mut engine = Engine::new();
    engine
        .load_program(Program::parse(source).unwrap())
        .unwrap();
    let status = engine.run(DEFAULT_MAX_STEPS);

    assert!(status.success);
    assert_eq!(status.instructions_executed, 4);
    assert!((engine.state().register("result_amp") - 0.30).abs() < 1e-9);
}

#[test]
fn jump_skips_dead_code_and_rests_on_halt() {
    let source = "\
ADD 2 0.1
GOTO target
ADD 2 1.0
LABEL target
ADD 3 0.2
HALT
";
    let engine = run(source);
    assert!((engine.state().amplitude(2) - 0.1).abs() < 1e-12);
    assert!((engine.state().amplitude(3) - 0.2).abs() < 1e-12);
    // The IP rests on the HALT instruction.
    assert_eq!(engine.context().ip, 5);
}

#[test]
fn subroutine_program_composes() {
    let source = "\
CALL setup
CALL boost
CALL boost
HALT
LABEL setup
LOAD 5 0.2
RETURN
LABEL boost
ADD 5 0.3
RETURN
";
    let engine = run(source);
    assert!((engine.state().amplitude(5) - 0.8).abs() < 1e-12);
}

#[test]
fn nested_loops_and_conditionals() {
    let source = "\
LOOP 3
  ADD 2 0.1
  OBSERVE 2 probe
  IF probe_amp GE 0.25
    ADD 3 0.1
  ELSE
    ADD 5 0.1
  ENDIF
ENDLOOP
HALT
";
    let engine = run(source);
    // Passes: amp(2) = 0.1, 0.2, 0.3 -> one IF-true on the last pass.
    assert!((engine.state().amplitude(2) - 0.3).abs() < 1e-9);
    assert!((engine.state().amplitude(3) - 0.1).abs() < 1e-9);
    assert!((engine.state().amplitude(5) - 0.2).abs() < 1e-9);
}

#[test]
fn measurement_pipeline_is_deterministic_per_seed() {
    let source = "\
LOAD 2 0.6
LOAD 3 0.8
COLLAPSE
COHERENCEALL g
ENTROPY s
HALT
";
    let run_seeded = |seed: u64| {
        let mut engine = Engine::new();
        engine.seed_rng(seed);
        engine
            .load_program(Program::parse(source).unwrap())
            .unwrap();
        assert!(engine.run(DEFAULT_MAX_STEPS).success);
        let live: Vec<u64> = engine
            .state()
            .oscillators()
            .filter(|(_, o)| o.amplitude() > 0.0)
            .map(|(p, _)| p)
            .collect();
        (live, engine.state().register("s"))
    };
    assert_eq!(run_seeded(11), run_seeded(11));
    let (live, entropy) = run_seeded(11);
    assert_eq!(live.len(), 1);
    assert!(entropy > 0.0);
}

#[test]
fn json_surface_matches_text_surface() {
    let text = Program::parse("LOAD 7 0.5\nOBSERVE 7 r\nHALT\n").unwrap();
    let json = Program::parse_json(
        r#"[
            {"mnemonic": "LOAD", "args": [7, 0.5]},
            {"mnemonic": "OBSERVE", "args": [7, "r"]},
            {"mnemonic": "HALT"}
        ]"#,
    )
    .unwrap();

    let run_program = |program: Program| {
        let mut engine = Engine::new();
        engine.load_program(program).unwrap();
        assert!(engine.run(DEFAULT_MAX_STEPS).success);
        engine.state().register("r_amp")
    };
    assert_eq!(run_program(text), run_program(json));
}

#[test]
fn exit_status_serialises_for_drivers() {
    let mut engine = Engine::new();
    engine
        .load_program(Program::parse("TICK\nHALT\n").unwrap())
        .unwrap();
    let status = engine.run(DEFAULT_MAX_STEPS);
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["instructionsExecuted"], 2);
    assert!(json["executionTimeMs"].is_number());
}

#[test]
fn stack_exhaustion_is_a_clean_fault() {
    let mut engine = Engine::with_limits(StackLimits {
        max_call_depth: 8,
        ..StackLimits::default()
    });
    engine
        .load_program(Program::parse("LABEL spin\nCALL spin\n").unwrap())
        .unwrap();
    let status = engine.run(DEFAULT_MAX_STEPS);
    assert!(!status.success);
    assert!(status.error.unwrap().contains("call stack limit"));
    // The engine stopped at the fault, not mid-instruction.
    assert_eq!(engine.stacks().call_depth(), 8);
}

#[test]
fn holographic_memory_survives_reload() {
    let mut engine = Engine::new();
    engine
        .load_program(Program::parse("HOLO_STORE 3.5 mem\nHALT\n").unwrap())
        .unwrap();
    assert!(engine.run(DEFAULT_MAX_STEPS).success);

    engine
        .load_program(Program::parse("HOLO_RETRIEVE mem 0.0 out\nHALT\n").unwrap())
        .unwrap();
    assert!(engine.run(DEFAULT_MAX_STEPS).success);
    assert!((engine.state().register("out") - 3.5).abs() < 1e-12);
}

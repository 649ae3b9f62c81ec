/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use basm::assemble;
use basm::file_reader::MockFileReader;
use basm::simulator::flags::{FLAG_CARRY, FLAG_NEGATIVE, FLAG_ZERO};
use basm::simulator::{RunOutcome, STACK_TOP, Simulator};
use std::path::Path;

fn simulate(source: &str) -> Simulator {
    let mut reader = MockFileReader::default();
    reader.add_file("test.asm", source);
    let output = assemble(Path::new("test.asm"), false, &reader).unwrap();
    assert!(
        !output.diagnostics.has_errors(),
        "assembly failed: {:?}",
        output.diagnostics.iter().collect::<Vec<_>>()
    );
    Simulator::from_image(&output.image)
}

#[test]
fn test_halt_scenario() {
    let mut sim = simulate("HALT\n");
    assert_eq!(sim.run().unwrap(), RunOutcome::Halted);
    assert!(sim.halted);
}

#[test]
fn test_add_scenario() {
    let mut sim = simulate(
        "MOV R0, #7\n\
         MOV R1, #3\n\
         ADD R2, R0, R1\n\
         HALT\n",
    );
    assert_eq!(sim.run().unwrap(), RunOutcome::Halted);
    assert_eq!(sim.register(2), 10);
    assert!(!sim.flags.contains(FLAG_ZERO));
    assert!(!sim.flags.contains(FLAG_NEGATIVE));
}

#[test]
fn test_branch_taken_scenario() {
    let mut sim = simulate(
        "MOV R0, #0\n\
         CMP R0, #0\n\
         JE end\n\
         MOV R0, #1\n\
         end: HALT\n",
    );
    assert_eq!(sim.run().unwrap(), RunOutcome::Halted);
    assert_eq!(sim.register(0), 0);
}

#[test]
fn test_stress_loop_terminates_under_safety_cap() {
    let mut sim = simulate(
        "start: MOV R0, #1\n\
         INC R0\n\
         CMP R0, #3\n\
         JNE start_plus\n\
         HALT\n\
         start_plus: JMP start\n",
    );
    assert_eq!(sim.run().unwrap(), RunOutcome::InstructionLimit);
    assert!(sim.register(0) == 1 || sim.register(0) == 2);
}

#[test]
fn test_call_ret_scenario() {
    let mut sim = simulate(
        "CALL sub\n\
         HALT\n\
         sub: MOV R0, #42\n\
         RET\n",
    );
    assert_eq!(sim.run().unwrap(), RunOutcome::Halted);
    assert_eq!(sim.register(0), 42);
    // The HALT sits at address 3; PC rests just past it.
    assert_eq!(sim.pc(), 4);
    assert_eq!(sim.sp(), STACK_TOP);
}

#[test]
fn test_add_flag_rule_samples() {
    // (a, b) samples for: R3 = (a + b) mod 2^32, Z, N, C per the 33-bit sum.
    let samples: [(u32, u32); 5] = [
        (7, 3),
        (0, 0),
        (0xFFFF_FFFF, 1),
        (0x7FFF_FFFF, 1),
        (0x8000_0000, 0x8000_0000),
    ];
    for (a, b) in samples {
        let mut sim = simulate(&format!(
            "MOVW R1, #0x{a:X}\n\
             MOVW R2, #0x{b:X}\n\
             ADD R3, R1, R2\n\
             HALT\n"
        ));
        sim.run().unwrap();
        let expected = a.wrapping_add(b);
        assert_eq!(sim.register(3), expected, "sum for {a:#X}+{b:#X}");
        assert_eq!(
            sim.flags.contains(FLAG_ZERO),
            expected == 0,
            "Z for {a:#X}+{b:#X}"
        );
        assert_eq!(
            sim.flags.contains(FLAG_NEGATIVE),
            expected & 0x8000_0000 != 0,
            "N for {a:#X}+{b:#X}"
        );
        assert_eq!(
            sim.flags.contains(FLAG_CARRY),
            (a as u64) + (b as u64) > u32::MAX as u64,
            "C for {a:#X}+{b:#X}"
        );
    }
}

#[test]
fn test_push_pop_leaves_stack_unchanged() {
    for value in [0u32, 1, 0x7FFF, 0x8000, 0xFFFF] {
        let mut sim = simulate(&format!(
            "MOV R1, #0x{value:X}\n\
             PUSH R1\n\
             POP R2\n\
             HALT\n"
        ));
        sim.run().unwrap();
        assert_eq!(sim.register(2), value);
        assert_eq!(sim.sp(), STACK_TOP);
    }
}

#[test]
fn test_string_copy_loop_via_ports() {
    // Walks a NUL-terminated string with byte loads, writing each character
    // to an I/O port.
    let mut sim = simulate(
        "MOV R1, #message\n\
         next: LOAD R2, [R1]\n\
         CMP R2, #0\n\
         JE done\n\
         OUT #1, R2\n\
         INC R1\n\
         JMP next\n\
         done: HALT\n\
         .data\n\
         message: .string \"Hi\"\n",
    );
    assert_eq!(sim.run().unwrap(), RunOutcome::Halted);
    // The last character written to the port survives.
    assert_eq!(sim.io_port(1), b'i' as u32);
    assert_eq!(sim.register(1), 0x4002);
}

#[test]
fn test_store_then_load_through_memory() {
    let mut sim = simulate(
        "MOV R0, #65\n\
         STORE R0, [0x4100]\n\
         LOAD R3, [0x4100]\n\
         HALT\n",
    );
    sim.run().unwrap();
    assert_eq!(sim.register(3), 65);
}

#[test]
fn test_conditional_family_against_flags() {
    // 5 < 9: JL (with V clear, N set by the negative difference) taken.
    let mut sim = simulate(
        "MOV R0, #5\n\
         CMP R0, #9\n\
         JL less\n\
         MOV R4, #0\n\
         HALT\n\
         less: MOV R4, #1\n\
         HALT\n",
    );
    sim.run().unwrap();
    assert_eq!(sim.register(4), 1);

    // Carry set by the borrow: JC taken on 1 - 2.
    let mut sim = simulate(
        "MOV R0, #1\n\
         CMP R0, #2\n\
         JC borrowed\n\
         MOV R4, #0\n\
         HALT\n\
         borrowed: MOV R4, #1\n\
         HALT\n",
    );
    sim.run().unwrap();
    assert_eq!(sim.register(4), 1);

    // JO never fires while OVERFLOW stays clear.
    let mut sim = simulate(
        "MOV R0, #1\n\
         CMP R0, #1\n\
         JO overflowed\n\
         MOV R4, #2\n\
         HALT\n\
         overflowed: MOV R4, #3\n\
         HALT\n",
    );
    sim.run().unwrap();
    assert_eq!(sim.register(4), 2);
}

#[test]
fn test_breakpoint_pauses_execution() {
    let mut reader = MockFileReader::default();
    reader.add_file("test.asm", "MOV R0, #1\nmark: MOV R0, #2\nHALT\n");
    let output = assemble(Path::new("test.asm"), false, &reader).unwrap();
    let mark = output.symbols.get("mark").unwrap().value;

    let mut sim = Simulator::from_image(&output.image);
    sim.add_breakpoint(mark);
    assert_eq!(sim.run().unwrap(), RunOutcome::Breakpoint(mark));
    assert_eq!(sim.register(0), 1);
    assert_eq!(sim.run().unwrap(), RunOutcome::Halted);
    assert_eq!(sim.register(0), 2);
}

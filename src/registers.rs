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

pub const NUM_REGISTERS: usize = 32;

// Registers 28-31 are aliased to the program counter, stack pointer,
// frame pointer and link register.
pub const REG_PC: usize = 28;
pub const REG_SP: usize = 29;
pub const REG_FP: usize = 30;
pub const REG_LR: usize = 31;

static REGISTER_NAMES: [&str; NUM_REGISTERS] = [
    "R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9", "R10", "R11", "R12", "R13", "R14",
    "R15", "R16", "R17", "R18", "R19", "R20", "R21", "R22", "R23", "R24", "R25", "R26", "R27",
    "PC", "SP", "FP", "LR",
];

pub fn register_name(index: u8) -> &'static str {
    REGISTER_NAMES
        .get(index as usize)
        .copied()
        .unwrap_or("INVALID")
}

/// Parses `R0`-`R31` or one of the four aliases, case-insensitively.
pub fn parse_register(name: &str) -> Option<u8> {
    for (alias, index) in [
        ("PC", REG_PC),
        ("SP", REG_SP),
        ("FP", REG_FP),
        ("LR", REG_LR),
    ] {
        if name.eq_ignore_ascii_case(alias) {
            return Some(index as u8);
        }
    }

    let digits = name.strip_prefix('R').or_else(|| name.strip_prefix('r'))?;
    let index: usize = digits.parse().ok()?;
    if index < NUM_REGISTERS {
        Some(index as u8)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_general_registers() {
        assert_eq!(parse_register("R0"), Some(0));
        assert_eq!(parse_register("r17"), Some(17));
        assert_eq!(parse_register("R31"), Some(31));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(parse_register("PC"), Some(28));
        assert_eq!(parse_register("sp"), Some(29));
        assert_eq!(parse_register("Fp"), Some(30));
        assert_eq!(parse_register("LR"), Some(31));
    }

    #[test]
    fn test_parse_invalid_registers() {
        assert_eq!(parse_register("R32"), None);
        assert_eq!(parse_register("R99"), None);
        assert_eq!(parse_register("RX"), None);
        assert_eq!(parse_register("foo"), None);
    }

    #[test]
    fn test_register_names_for_aliases() {
        assert_eq!(register_name(5), "R5");
        assert_eq!(register_name(28), "PC");
        assert_eq!(register_name(31), "LR");
        assert_eq!(register_name(32), "INVALID");
    }
}

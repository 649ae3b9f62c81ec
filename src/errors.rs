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

use thiserror::Error;

/// Fatal assembly conditions. Syntax and semantic problems are not errors in
/// this sense; they accumulate in the diagnostics buffer so a single run can
/// surface all of them.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("Cannot open file: {path}: {message}")]
    FileOpen { path: String, message: String },

    #[error("Include depth too deep ({depth}) while including {path}")]
    IncludeDepth { path: String, depth: usize },
}

/// Encoding failures surfaced during pass 2. The driver converts these into
/// diagnostics on the line that produced them.
#[derive(Error, Debug, PartialEq)]
pub enum EncodeError {
    #[error("Undefined label: {0}")]
    UndefinedLabel(String),

    #[error("Unsupported addressing mode for {mnemonic} operand {index}")]
    UnsupportedOperand {
        mnemonic: &'static str,
        index: usize,
    },
}

/// Runtime faults that stop the execute loop.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SimulatorError {
    #[error("Unknown opcode: 0x{opcode:02X} at PC=0x{address:04X}")]
    UnknownOpcode { opcode: u8, address: u32 },

    #[error("Invalid {mnemonic} mode: 0x{mode:02X} at PC=0x{address:04X}")]
    InvalidMode {
        mnemonic: &'static str,
        mode: u8,
        address: u32,
    },

    #[error("Division by zero at PC=0x{address:04X}")]
    DivisionByZero { address: u32 },
}

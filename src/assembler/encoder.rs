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

use crate::assembler::symbol_table::SymbolTable;
use crate::ast::{Instruction, Operand};
use crate::errors::EncodeError;
use crate::opcodes::Opcode;
use crate::registers::parse_register;

/// Helper function to determine instruction size in bytes during pass 1.
///
/// Pass 2 must emit exactly this many bytes for the same parsed instruction,
/// otherwise every later label would be wrong. Operands that may carry an
/// unresolved label are always sized as the wide (16-bit payload) form, which
/// is also how they encode, so the two passes agree by construction. A
/// bracketed name takes the narrow register-indirect form only when no
/// symbol with that name exists.
pub fn instruction_size(instruction: &Instruction, symbols: &SymbolTable) -> u32 {
    use Opcode::*;
    match instruction.opcode {
        Inc | Dec | Push | Pop | Not | Clr => 2,
        Mov | Load | Store | Cmp | Test | Shl | Shr => {
            if wide(instruction.operands.get(1), symbols) { 5 } else { 4 }
        }
        Movw => {
            if wide(instruction.operands.get(1), symbols) { 7 } else { 4 }
        }
        Add | Sub | Mul | Div | Mod | And | Or | Xor => {
            if wide(instruction.operands.get(2), symbols) { 6 } else { 5 }
        }
        Jmp | Jz | Jnz | Je | Jne | Jg | Jge | Jl | Jle | Jc | Jnc | Jo | Jno | Call => 3,
        In | Out => 4,
        Halt | Nop | Ret => 1,
    }
}

fn wide(operand: Option<&Operand>, symbols: &SymbolTable) -> bool {
    match operand {
        // The symbol wins over a same-named register; only a pure register
        // reading is narrow.
        Some(Operand::DirectLabel(name)) => {
            symbols.contains(name) || parse_register(name).is_none()
        }
        Some(operand) => operand.is_wide(),
        None => false,
    }
}

/// Helper function to translate a single instruction into bytes during
/// pass 2. Label references resolve against the pass-1 symbol table.
pub fn encode_instruction(
    instruction: &Instruction,
    symbols: &SymbolTable,
) -> Result<Vec<u8>, EncodeError> {
    use Opcode::*;
    let opcode = instruction.opcode;
    let mut bytes = vec![opcode as u8];

    match opcode {
        Inc | Dec | Push | Pop | Not | Clr => {
            bytes.push(expect_register(instruction, 0)?);
        }
        Mov | Movw | Load | Store | Cmp | Test | Shl | Shr => {
            bytes.push(expect_register(instruction, 0)?);
            encode_mode_operand(instruction, 1, opcode == Movw, symbols, &mut bytes)?;
        }
        Add | Sub | Mul | Div | Mod | And | Or | Xor => {
            bytes.push(expect_register(instruction, 0)?);
            bytes.push(expect_register(instruction, 1)?);
            encode_mode_operand(instruction, 2, false, symbols, &mut bytes)?;
        }
        Jmp | Jz | Jnz | Je | Jne | Jg | Jge | Jl | Jle | Jc | Jnc | Jo | Jno | Call => {
            let target = resolve_value(instruction, 0, symbols)?;
            bytes.extend_from_slice(&(target as u16).to_le_bytes());
        }
        Out => {
            let port = resolve_value(instruction, 0, symbols)?;
            bytes.extend_from_slice(&(port as u16).to_le_bytes());
            bytes.push(expect_register(instruction, 1)?);
        }
        In => {
            bytes.push(expect_register(instruction, 0)?);
            let port = resolve_value(instruction, 1, symbols)?;
            bytes.extend_from_slice(&(port as u16).to_le_bytes());
        }
        Halt | Nop | Ret => {}
    }

    Ok(bytes)
}

/// Emits the mode byte followed by either a register number or a 16-bit
/// (32-bit for MOVW) little-endian payload.
fn encode_mode_operand(
    instruction: &Instruction,
    index: usize,
    wide32: bool,
    symbols: &SymbolTable,
    bytes: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    match &instruction.operands[index] {
        Operand::Register(reg) | Operand::RegisterIndirect(reg) => {
            bytes.push(0x00);
            bytes.push(*reg);
        }
        // A bracketed name resolves through the symbol table first; the
        // register-indirect reading applies only when no symbol matches.
        Operand::DirectLabel(name) => {
            if let Some(symbol) = symbols.get(name) {
                bytes.push(0x01);
                if wide32 {
                    bytes.extend_from_slice(&symbol.value.to_le_bytes());
                } else {
                    bytes.extend_from_slice(&(symbol.value as u16).to_le_bytes());
                }
            } else if let Some(reg) = parse_register(name) {
                bytes.push(0x00);
                bytes.push(reg);
            } else {
                return Err(EncodeError::UndefinedLabel(name.clone()));
            }
        }
        operand if operand.is_wide() => {
            bytes.push(0x01);
            let value = resolve_value(instruction, index, symbols)?;
            if wide32 {
                bytes.extend_from_slice(&value.to_le_bytes());
            } else {
                bytes.extend_from_slice(&(value as u16).to_le_bytes());
            }
        }
        _ => {
            return Err(EncodeError::UnsupportedOperand {
                mnemonic: instruction.opcode.mnemonic(),
                index,
            });
        }
    }
    Ok(())
}

fn expect_register(instruction: &Instruction, index: usize) -> Result<u8, EncodeError> {
    match instruction.operands.get(index) {
        Some(Operand::Register(reg)) => Ok(*reg),
        _ => Err(EncodeError::UnsupportedOperand {
            mnemonic: instruction.opcode.mnemonic(),
            index,
        }),
    }
}

/// Resolves an operand that can be a number or a label into its value.
fn resolve_value(
    instruction: &Instruction,
    index: usize,
    symbols: &SymbolTable,
) -> Result<u32, EncodeError> {
    match &instruction.operands[index] {
        Operand::Immediate(value) => Ok(*value as u32),
        Operand::Direct(address) => Ok(*address as u32),
        Operand::Absolute(address) => Ok(*address),
        Operand::ImmediateLabel(name)
        | Operand::DirectLabel(name)
        | Operand::PcRelative(name) => symbols
            .get(name)
            .map(|symbol| symbol.value)
            .ok_or_else(|| EncodeError::UndefinedLabel(name.clone())),
        _ => Err(EncodeError::UnsupportedOperand {
            mnemonic: instruction.opcode.mnemonic(),
            index,
        }),
    }
}

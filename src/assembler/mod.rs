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

pub mod diagnostics;
pub mod encoder;
pub mod optimizer;
pub mod sections;
pub mod symbol_table;

use crate::MEMORY_SIZE;
use crate::ast::{AssemblyLine, Directive, Instruction};
use crate::registers::parse_register;
use diagnostics::Diagnostics;
use sections::SectionTable;
use symbol_table::{Symbol, SymbolKind, SymbolScope, SymbolTable};

/// The two-pass assembler state: a flat memory image, the section and symbol
/// tables, the accumulated diagnostics, and the absolute program counter.
pub struct Assembler {
    pub memory: Vec<u8>,
    pub sections: SectionTable,
    pub symbols: SymbolTable,
    pub diagnostics: Diagnostics,
    pc: u32,
}

impl Assembler {
    pub fn new() -> Self {
        let sections = SectionTable::new();
        let pc = sections.current().origin;
        Self {
            memory: vec![0; MEMORY_SIZE],
            sections,
            symbols: SymbolTable::default(),
            diagnostics: Diagnostics::default(),
            pc,
        }
    }

    /// Runs both passes over the parsed line AST. Assembly always runs to
    /// completion so every problem is reported; the caller checks the
    /// diagnostics before using the image.
    pub fn assemble(&mut self, lines: &[AssemblyLine]) {
        self.pass1(lines);
        self.pass2(lines);
        self.resolve_references();
    }

    /// Pass 1: collect symbols and accumulate instruction sizes.
    fn pass1(&mut self, lines: &[AssemblyLine]) {
        for line in lines {
            // The label is recorded before any directive on the same line
            // executes, so a label on an .org line binds to the pre-org PC.
            if let Some(label) = &line.label {
                self.define_label(line, label);
            }
            if let Some(directive) = &line.directive {
                self.directive_pass1(line, directive);
            }
            if let Some(instruction) = &line.instruction {
                self.pc += encoder::instruction_size(instruction, &self.symbols);
            }
        }
    }

    /// Pass 2: emit directive data and encoded instructions into the image.
    fn pass2(&mut self, lines: &[AssemblyLine]) {
        if let Some(pc) = self.sections.switch(".text", self.pc) {
            self.pc = pc;
        }
        for line in lines {
            if let Some(directive) = &line.directive {
                self.directive_pass2(line, directive);
            }
            if let Some(instruction) = &line.instruction {
                self.emit_instruction(line, instruction);
            }
        }
    }

    /// Pass 3: late reference resolution. Forward references are resolved
    /// inline during pass 2 via the pass-1 symbol table, so this is a no-op
    /// hook reserved for out-of-line patching.
    fn resolve_references(&mut self) {}

    fn define_label(&mut self, line: &AssemblyLine, name: &str) {
        if parse_register(name).is_some() {
            self.diagnostics.warning(
                &line.file,
                line.line_number,
                format!("Label {name} shadows a register name and cannot be referenced"),
            );
        }
        if self.symbols.contains(name) {
            self.diagnostics.error(
                &line.file,
                line.line_number,
                format!("Duplicate label definition: {name}"),
            );
            return;
        }
        if self.symbols.is_full() {
            self.diagnostics
                .error(&line.file, line.line_number, "Symbol table full");
            return;
        }

        let section = self.sections.current();
        let kind = match section.name.as_str() {
            ".text" => SymbolKind::Code,
            ".bss" => SymbolKind::Bss,
            _ => SymbolKind::Data,
        };
        self.symbols.insert(Symbol {
            name: name.to_string(),
            value: self.pc,
            size: 0,
            kind,
            scope: SymbolScope::Local,
            section: section.name.clone(),
            file: line.file.clone(),
            line: line.line_number,
            defined: true,
            exported: false,
        });
    }

    fn directive_pass1(&mut self, line: &AssemblyLine, directive: &Directive) {
        match directive {
            Directive::Code => self.switch_section(line, ".text"),
            Directive::Data => self.switch_section(line, ".data"),
            Directive::Org(address) => self.pc = *address,
            Directive::Byte(values) => self.pc += values.len() as u32,
            Directive::Word(values) => self.pc += values.len() as u32 * 2,
            Directive::Dword(values) => self.pc += values.len() as u32 * 4,
            Directive::Str(text) => self.pc += text.len() as u32 + 1,
            Directive::Include(_) => {} // expanded during parsing
        }
    }

    fn directive_pass2(&mut self, line: &AssemblyLine, directive: &Directive) {
        match directive {
            Directive::Code => self.switch_section(line, ".text"),
            Directive::Data => self.switch_section(line, ".data"),
            Directive::Org(address) => self.pc = *address,
            Directive::Byte(values) => {
                for value in values {
                    self.emit_byte(line, *value as u8);
                }
            }
            Directive::Word(values) => {
                for value in values {
                    self.emit_bytes(line, &(*value as u16).to_le_bytes());
                }
            }
            Directive::Dword(values) => {
                for value in values {
                    self.emit_bytes(line, &(*value as u32).to_le_bytes());
                }
            }
            Directive::Str(text) => {
                let bytes: Vec<u8> = text.bytes().chain(std::iter::once(0)).collect();
                self.emit_bytes(line, &bytes);
            }
            Directive::Include(_) => {}
        }
    }

    fn emit_instruction(&mut self, line: &AssemblyLine, instruction: &Instruction) {
        match encoder::encode_instruction(instruction, &self.symbols) {
            Ok(bytes) => {
                debug_assert_eq!(
                    bytes.len() as u32,
                    encoder::instruction_size(instruction, &self.symbols)
                );
                self.emit_bytes(line, &bytes);
            }
            Err(err) => {
                // Skip emission but keep the layout stable so later
                // diagnostics still report sensible addresses.
                self.pc += encoder::instruction_size(instruction, &self.symbols);
                self.diagnostics
                    .error(&line.file, line.line_number, err.to_string());
            }
        }
    }

    fn switch_section(&mut self, line: &AssemblyLine, name: &str) {
        match self.sections.switch(name, self.pc) {
            Some(pc) => self.pc = pc,
            None => self
                .diagnostics
                .error(&line.file, line.line_number, "Too many sections"),
        }
    }

    fn emit_bytes(&mut self, line: &AssemblyLine, bytes: &[u8]) {
        for &byte in bytes {
            self.emit_byte(line, byte);
        }
    }

    fn emit_byte(&mut self, line: &AssemblyLine, byte: u8) {
        let pc = self.pc;
        if (pc as usize) < MEMORY_SIZE {
            self.memory[pc as usize] = byte;
        } else {
            self.diagnostics.error(
                &line.file,
                line.line_number,
                format!("Emitted byte outside memory bounds at 0x{pc:08X}"),
            );
        }

        let section = self.sections.current_mut();
        if pc >= section.origin {
            let offset = pc - section.origin;
            if (offset as usize) < section.data.len() {
                section.data[offset as usize] = byte;
            }
            if offset + 1 > section.size {
                section.size = offset + 1;
            }
        }

        self.pc = pc.wrapping_add(1);
    }

    /// Highest address covered by emitted bytes, falling back to the final
    /// PC when nothing landed inside a section.
    pub fn max_address(&self) -> u32 {
        let max = self.sections.max_address();
        if max == 0 { self.pc } else { max }
    }

    /// The flat output image: bytes [0, max_address).
    pub fn image(&self) -> Vec<u8> {
        let max = self.max_address().min(MEMORY_SIZE as u32);
        self.memory[..max as usize].to_vec()
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

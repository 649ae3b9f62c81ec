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

pub mod assembler;
pub mod ast;
pub mod debugger;
pub mod errors;
pub mod file_reader;
pub mod opcodes;
pub mod parser;
pub mod registers;
pub mod simulator;

use anyhow::{Context, Result};
use assembler::Assembler;
use assembler::diagnostics::Diagnostics;
use assembler::symbol_table::SymbolTable;
use file_reader::FileReader;
use std::path::Path;

/// Flat byte-addressed machine memory, shared by the assembler image and the
/// simulator.
pub const MEMORY_SIZE: usize = 16 * 1024 * 1024;

pub struct AssemblyOutput {
    /// The flat binary image: bytes [0, max_address).
    pub image: Vec<u8>,
    pub max_address: u32,
    pub symbols: SymbolTable,
    pub diagnostics: Diagnostics,
}

/// Assembles a source file (with its includes) into a flat binary image.
///
/// Syntax and semantic problems accumulate in the returned diagnostics so a
/// single run reports all of them; only unreadable files and include-depth
/// overflow return an error. The caller decides whether to keep the image
/// when errors were recorded.
pub fn assemble<F: FileReader>(
    source_path: &Path,
    optimize: bool,
    reader: &F,
) -> Result<AssemblyOutput> {
    let mut diagnostics = Diagnostics::default();
    let lines = parser::parse_source_recursive(source_path, 0, reader, &mut diagnostics)
        .context("Failed during parsing stage")?;

    let mut assembler = Assembler::new();
    assembler.diagnostics = diagnostics;
    assembler.assemble(&lines);

    if optimize && !assembler.diagnostics.has_errors() {
        assembler::optimizer::peephole_optimize(&mut assembler);
    }

    let max_address = assembler.max_address();
    let image = assembler.image();
    Ok(AssemblyOutput {
        image,
        max_address,
        symbols: assembler.symbols,
        diagnostics: assembler.diagnostics,
    })
}

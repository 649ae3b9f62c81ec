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

use crate::assembler::diagnostics::Diagnostics;
use crate::ast::{AssemblyLine, Directive, Instruction, Operand};
use crate::errors::AssemblyError;
use crate::file_reader::FileReader;
use crate::opcodes;
use crate::registers::parse_register;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use std::path::Path;

// Derive the parser from our grammar file.
#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct BasmParser;

pub const MAX_INCLUDE_DEPTH: usize = 16;
pub const MAX_LABEL_LEN: usize = 63;

/// Parses a source file into a flat line AST, expanding `.include` files
/// inline as they are encountered. Malformed lines are recorded in the
/// diagnostics buffer and skipped so one run reports every problem; only
/// unreadable files and include-depth overflow abort the parse.
pub fn parse_source_recursive<F: FileReader>(
    source_path: &Path,
    depth: usize,
    reader: &F,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<AssemblyLine>, AssemblyError> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(AssemblyError::IncludeDepth {
            path: source_path.display().to_string(),
            depth,
        });
    }

    let source = reader
        .read_to_string(source_path)
        .map_err(|err| AssemblyError::FileOpen {
            path: source_path.display().to_string(),
            message: err.to_string(),
        })?;
    let file_name = source_path.display().to_string();

    let mut lines = Vec::new();
    for (index, raw_line) in source.lines().enumerate() {
        let line_number = index + 1;
        if raw_line.trim().is_empty() {
            continue;
        }

        let mut parsed = match BasmParser::parse(Rule::line, raw_line) {
            Ok(pairs) => pairs,
            Err(err) => {
                diagnostics.error(
                    &file_name,
                    line_number,
                    format!("Syntax error: {}", err.variant.message()),
                );
                continue;
            }
        };

        // The `line` rule always matches exactly once.
        let line_pair = parsed.next().unwrap();
        let Some(line) = build_line(line_pair, &file_name, line_number, diagnostics) else {
            continue;
        };

        // Includes are expanded here so both assembler passes walk one
        // flattened AST.
        if let Some(Directive::Include(include)) = &line.directive {
            let include_path = source_path
                .parent()
                .unwrap_or(Path::new("."))
                .join(include);
            let mut included =
                parse_source_recursive(&include_path, depth + 1, reader, diagnostics)?;
            if line.label.is_some() {
                let mut label_line = line.clone();
                label_line.directive = None;
                lines.push(label_line);
            }
            lines.append(&mut included);
            continue;
        }

        if line.label.is_some() || line.instruction.is_some() || line.directive.is_some() {
            lines.push(line);
        }
    }

    Ok(lines)
}

fn build_line(
    line_pair: Pair<Rule>,
    file: &str,
    line_number: usize,
    diagnostics: &mut Diagnostics,
) -> Option<AssemblyLine> {
    let mut line = AssemblyLine {
        file: file.to_string(),
        line_number,
        ..Default::default()
    };

    for part in line_pair.into_inner() {
        match part.as_rule() {
            Rule::line_content => {
                for item in part.into_inner() {
                    match item.as_rule() {
                        Rule::label => {
                            let name = item.into_inner().next().unwrap().as_str();
                            if name.len() > MAX_LABEL_LEN {
                                diagnostics.error(
                                    file,
                                    line_number,
                                    format!("Label too long (max {MAX_LABEL_LEN}): {name}"),
                                );
                            } else {
                                line.label = Some(name.to_string());
                            }
                        }
                        Rule::statement => {
                            let stmt = item.into_inner().next().unwrap();
                            match stmt.as_rule() {
                                Rule::directive => {
                                    line.directive =
                                        build_directive(stmt, file, line_number, diagnostics);
                                }
                                Rule::instruction => {
                                    line.instruction =
                                        build_instruction(stmt, file, line_number, diagnostics);
                                }
                                _ => {}
                            }
                        }
                        _ => {}
                    }
                }
            }
            Rule::EOI => {}
            _ => {}
        }
    }

    Some(line)
}

fn build_instruction(
    pair: Pair<Rule>,
    file: &str,
    line_number: usize,
    diagnostics: &mut Diagnostics,
) -> Option<Instruction> {
    let mut inner = pair.into_inner();
    let mnemonic = inner.next().unwrap().as_str();

    let Some(info) = opcodes::find_mnemonic(mnemonic) else {
        diagnostics.error(
            file,
            line_number,
            format!("Unknown instruction: {}", mnemonic.to_uppercase()),
        );
        return None;
    };

    let mut operands = Vec::new();
    if let Some(list) = inner.next() {
        for operand_pair in list.into_inner() {
            operands.push(build_operand(operand_pair, file, line_number, diagnostics)?);
        }
    }

    if operands.len() != info.operand_count as usize {
        diagnostics.error(
            file,
            line_number,
            format!(
                "{} expects {} operand(s), found {}",
                info.mnemonic,
                info.operand_count,
                operands.len()
            ),
        );
        return None;
    }
    for (index, operand) in operands.iter().enumerate() {
        if operand.type_mask() & info.operand_types[index] == 0 {
            diagnostics.error(
                file,
                line_number,
                format!("Invalid operand {} for {}", index + 1, info.mnemonic),
            );
            return None;
        }
    }

    Some(Instruction {
        opcode: info.opcode,
        operands,
    })
}

fn build_operand(
    pair: Pair<Rule>,
    file: &str,
    line_number: usize,
    diagnostics: &mut Diagnostics,
) -> Option<Operand> {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::register => {
            let name = inner.as_str();
            match parse_register(name) {
                Some(index) => Some(Operand::Register(index)),
                None => {
                    diagnostics.error(file, line_number, format!("Invalid register: {name}"));
                    None
                }
            }
        }
        Rule::immediate => {
            let value = inner.into_inner().next().unwrap();
            match value.as_rule() {
                Rule::number => {
                    Some(Operand::Immediate(parse_number(
                        value.as_str(),
                        file,
                        line_number,
                        diagnostics,
                    )? as i32))
                }
                Rule::identifier => Some(Operand::ImmediateLabel(value.as_str().to_string())),
                _ => None,
            }
        }
        Rule::memory => {
            let value = inner.into_inner().next().unwrap();
            match value.as_rule() {
                Rule::number => Some(Operand::Direct(parse_number(
                    value.as_str(),
                    file,
                    line_number,
                    diagnostics,
                )? as u16)),
                // Bracketed names stay symbolic: the symbol table does not
                // exist yet, and a symbol wins over a same-named register.
                // The sizer and encoder resolve the name symbol-first and
                // only fall back to a register-indirect reading.
                Rule::identifier => Some(Operand::DirectLabel(value.as_str().to_string())),
                _ => None,
            }
        }
        Rule::label_ref => Some(Operand::PcRelative(
            inner.into_inner().next().unwrap().as_str().to_string(),
        )),
        _ => None,
    }
}

fn build_directive(
    pair: Pair<Rule>,
    file: &str,
    line_number: usize,
    diagnostics: &mut Diagnostics,
) -> Option<Directive> {
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str().to_ascii_lowercase();
    let args: Vec<Pair<Rule>> = inner
        .next()
        .map(|list| list.into_inner().collect())
        .unwrap_or_default();

    match name.as_str() {
        "code" | "text" => Some(Directive::Code),
        "data" => Some(Directive::Data),
        "org" => {
            let value = single_number_arg(&args, ".org", file, line_number, diagnostics)?;
            Some(Directive::Org(value as u32))
        }
        "byte" => Some(Directive::Byte(number_args(
            &args, ".byte", file, line_number, diagnostics,
        )?)),
        "word" => Some(Directive::Word(number_args(
            &args, ".word", file, line_number, diagnostics,
        )?)),
        "dword" => Some(Directive::Dword(number_args(
            &args, ".dword", file, line_number, diagnostics,
        )?)),
        "string" => {
            let text = args.first().and_then(|arg| {
                let value = arg.clone().into_inner().next()?;
                match value.as_rule() {
                    Rule::string => Some(value.into_inner().next().unwrap().as_str().to_string()),
                    _ => None,
                }
            });
            match text {
                Some(text) => Some(Directive::Str(text)),
                None => {
                    diagnostics.error(file, line_number, ".string expects a quoted string");
                    None
                }
            }
        }
        "include" => {
            let path = args.first().and_then(|arg| {
                let value = arg.clone().into_inner().next()?;
                match value.as_rule() {
                    Rule::string | Rule::angle_path => {
                        Some(value.into_inner().next().unwrap().as_str().to_string())
                    }
                    _ => None,
                }
            });
            match path {
                Some(path) => Some(Directive::Include(path)),
                None => {
                    diagnostics.error(
                        file,
                        line_number,
                        ".include expects a quoted or angle-bracketed path",
                    );
                    None
                }
            }
        }
        other => {
            diagnostics.error(file, line_number, format!("Unknown directive: .{other}"));
            None
        }
    }
}

fn single_number_arg(
    args: &[Pair<Rule>],
    directive: &str,
    file: &str,
    line_number: usize,
    diagnostics: &mut Diagnostics,
) -> Option<i64> {
    let values = number_args(args, directive, file, line_number, diagnostics)?;
    if values.len() == 1 {
        Some(values[0])
    } else {
        diagnostics.error(
            file,
            line_number,
            format!("{directive} expects exactly one value"),
        );
        None
    }
}

fn number_args(
    args: &[Pair<Rule>],
    directive: &str,
    file: &str,
    line_number: usize,
    diagnostics: &mut Diagnostics,
) -> Option<Vec<i64>> {
    if args.is_empty() {
        diagnostics.error(
            file,
            line_number,
            format!("{directive} expects at least one value"),
        );
        return None;
    }
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        let value = arg.clone().into_inner().next().unwrap();
        if value.as_rule() != Rule::number {
            diagnostics.error(
                file,
                line_number,
                format!("{directive} argument must be an immediate value"),
            );
            return None;
        }
        values.push(parse_number(value.as_str(), file, line_number, diagnostics)?);
    }
    Some(values)
}

/// Parses decimal, `0x` hex, and `0b` binary literals with an optional
/// leading minus.
fn parse_number(
    text: &str,
    file: &str,
    line_number: usize,
    diagnostics: &mut Diagnostics,
) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let parsed = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2)
    } else {
        body.parse()
    };
    match parsed {
        Ok(value) => Some(if negative { -value } else { value }),
        Err(_) => {
            diagnostics.error(file, line_number, format!("Invalid number: {text}"));
            None
        }
    }
}

// ------------- unit tests -------------

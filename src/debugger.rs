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

//! The interactive debugger: a one-command-per-line protocol on stdin. The
//! command grammar is a pure function so it can be tested without a terminal;
//! the REPL loop only owns the I/O.

use crate::registers::{NUM_REGISTERS, register_name};
use crate::simulator::{RunOutcome, Simulator, disassembler};
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Step,
    Break(u32),
    Registers,
    Memory { address: u32, size: u32 },
    Disassemble { address: Option<u32>, count: u32 },
    Quit,
    Help,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let mut tokens = line.split_whitespace();
        let Some(command) = tokens.next() else {
            return Err(String::new());
        };
        match command {
            "run" | "r" => Ok(Command::Run),
            "step" | "s" => Ok(Command::Step),
            "break" | "b" => {
                let address = tokens.next().ok_or("break requires an address")?;
                Ok(Command::Break(parse_address(address)?))
            }
            "registers" | "reg" => Ok(Command::Registers),
            "memory" | "mem" => {
                let address = tokens.next().ok_or("memory requires an address")?;
                let size = match tokens.next() {
                    Some(size) => parse_address(size)?,
                    None => 16,
                };
                Ok(Command::Memory {
                    address: parse_address(address)?,
                    size,
                })
            }
            "disassemble" | "dis" => {
                let address = tokens.next().map(parse_address).transpose()?;
                let count = match tokens.next() {
                    Some(count) => parse_address(count)?,
                    None => 5,
                };
                Ok(Command::Disassemble { address, count })
            }
            "quit" | "q" => Ok(Command::Quit),
            "help" | "?" => Ok(Command::Help),
            other => Err(format!("Unknown command: {other}")),
        }
    }
}

/// Accepts `0xNN` hex or plain decimal.
pub fn parse_address(text: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        text.parse()
    };
    parsed.map_err(|_| format!("Invalid address: {text}"))
}

/// Reads commands from stdin until quit or end of input.
pub fn repl(sim: &mut Simulator) -> io::Result<()> {
    println!("basm debugger");
    println!("Type 'help' for commands\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("(bsim) ");
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        if !line.trim().is_empty() {
            match Command::parse(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => execute_command(sim, command),
                Err(message) => println!("{message}"),
            }
        }
        print!("(bsim) ");
        stdout.flush()?;
    }
    Ok(())
}

fn execute_command(sim: &mut Simulator, command: Command) {
    match command {
        Command::Run => match sim.run() {
            Ok(RunOutcome::Halted) => println!("Processor halted"),
            Ok(RunOutcome::Breakpoint(address)) => {
                println!("Breakpoint hit at 0x{address:04X}");
                print_registers(sim);
            }
            Ok(RunOutcome::InstructionLimit) => println!("Instruction limit reached"),
            Ok(RunOutcome::Stopped) => println!("Stopped"),
            Err(err) => println!("Execution error: {err}"),
        },
        Command::Step => match sim.step() {
            Ok(()) => {
                print_registers(sim);
                let (text, _) = disassembler::disassemble_one(sim.memory(), sim.pc());
                println!("> 0x{:04X}: {}", sim.pc(), text);
            }
            Err(err) => println!("Execution error: {err}"),
        },
        Command::Break(address) => {
            sim.add_breakpoint(address);
            println!("Breakpoint set at 0x{address:08X}");
        }
        Command::Registers => print_registers(sim),
        Command::Memory { address, size } => print_memory(sim, address, size),
        Command::Disassemble { address, count } => {
            let mut pc = address.unwrap_or_else(|| sim.pc());
            for _ in 0..count {
                let marker = if pc == sim.pc() { '>' } else { ' ' };
                let (text, next) = disassembler::disassemble_one(sim.memory(), pc);
                println!("{marker} 0x{pc:04X}: {text}");
                pc = next;
            }
        }
        Command::Help => print_help(),
        Command::Quit => {}
    }
}

fn print_registers(sim: &Simulator) {
    println!("\n=== Registers ===");
    for index in 0..NUM_REGISTERS as u8 {
        print!("{:>3}: 0x{:08X}  ", register_name(index), sim.register(index));
        if (index + 1) % 4 == 0 {
            println!();
        }
    }
    println!("Flags: {}", sim.flags);
    println!(
        "Instructions: {}  Cycles: {}  Memory accesses: {}",
        sim.instructions_executed, sim.clock_cycles, sim.memory_accesses
    );
}

fn print_memory(sim: &mut Simulator, address: u32, size: u32) {
    println!("\nMemory at 0x{address:08X}:");
    let mut row = 0;
    while row < size {
        print!("0x{:04X}: ", address + row);
        let columns = (size - row).min(16);
        for column in 0..16 {
            if column == 8 {
                print!(" ");
            }
            if column < columns {
                print!("{:02X} ", sim.read_byte(address + row + column));
            } else {
                print!("   ");
            }
        }
        print!(" |");
        for column in 0..columns {
            let byte = sim.read_byte(address + row + column);
            let shown = if (32..127).contains(&byte) {
                byte as char
            } else {
                '.'
            };
            print!("{shown}");
        }
        println!("|");
        row += 16;
    }
}

fn print_help() {
    println!("\nAvailable commands:");
    println!("  run/r           - Run program");
    println!("  step/s          - Execute single instruction");
    println!("  break/b ADDR    - Set breakpoint");
    println!("  registers/reg   - Show registers");
    println!("  memory/mem ADDR [SIZE] - Show memory");
    println!("  disassemble/dis [ADDR [COUNT]] - Disassemble code");
    println!("  quit/q          - Exit debugger");
    println!("  help/?          - This help");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_and_step() {
        assert_eq!(Command::parse("run"), Ok(Command::Run));
        assert_eq!(Command::parse("r"), Ok(Command::Run));
        assert_eq!(Command::parse("step"), Ok(Command::Step));
        assert_eq!(Command::parse("s"), Ok(Command::Step));
    }

    #[test]
    fn test_parse_break() {
        assert_eq!(Command::parse("break 0x100"), Ok(Command::Break(0x100)));
        assert_eq!(Command::parse("b 256"), Ok(Command::Break(256)));
        assert!(Command::parse("break").is_err());
        assert!(Command::parse("break zebra").is_err());
    }

    #[test]
    fn test_parse_memory_with_default_size() {
        assert_eq!(
            Command::parse("mem 0x4000"),
            Ok(Command::Memory {
                address: 0x4000,
                size: 16
            })
        );
        assert_eq!(
            Command::parse("memory 0x4000 32"),
            Ok(Command::Memory {
                address: 0x4000,
                size: 32
            })
        );
    }

    #[test]
    fn test_parse_disassemble_defaults() {
        assert_eq!(
            Command::parse("dis"),
            Ok(Command::Disassemble {
                address: None,
                count: 5
            })
        );
        assert_eq!(
            Command::parse("disassemble 0x10 3"),
            Ok(Command::Disassemble {
                address: Some(0x10),
                count: 3
            })
        );
    }

    #[test]
    fn test_parse_remaining_commands() {
        assert_eq!(Command::parse("registers"), Ok(Command::Registers));
        assert_eq!(Command::parse("reg"), Ok(Command::Registers));
        assert_eq!(Command::parse("quit"), Ok(Command::Quit));
        assert_eq!(Command::parse("q"), Ok(Command::Quit));
        assert_eq!(Command::parse("?"), Ok(Command::Help));
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            Command::parse("frobnicate"),
            Err("Unknown command: frobnicate".to_string())
        );
    }

    #[test]
    fn test_parse_address_formats() {
        assert_eq!(parse_address("0x3FFF"), Ok(0x3FFF));
        assert_eq!(parse_address("4096"), Ok(4096));
        assert!(parse_address("0xZZ").is_err());
    }
}

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

use anyhow::{Context, Result, bail};
use basm::debugger;
use basm::simulator::Simulator;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(version, about = "Simulator and debugger for the basm virtual machine")]
struct Opts {
    /// Flat binary image produced by the assembler
    binary: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let image = fs::read(&opts.binary)
        .with_context(|| format!("Cannot open file '{}'", opts.binary.display()))?;
    if image.len() > basm::MEMORY_SIZE {
        bail!(
            "File too large for memory ({} bytes > {} bytes)",
            image.len(),
            basm::MEMORY_SIZE
        );
    }

    let mut sim = Simulator::from_image(&image);
    println!("Loaded {} bytes from {}", image.len(), opts.binary.display());

    debugger::repl(&mut sim)?;
    Ok(())
}

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
use basm::assemble;
use basm::file_reader::AsmFileReader;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(version, about = "Assembler for the basm 32-register virtual machine")]
struct Opts {
    /// Assembly source file
    input: PathBuf,
    /// Output binary
    #[clap(default_value = "output.bin")]
    output: PathBuf,
    /// Write a JSON symbol listing to this path
    #[clap(long)]
    symbols: Option<PathBuf>,
    /// Strip trailing NOP runs from executable sections
    #[clap(long)]
    optimize: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let reader = AsmFileReader;
    let output = assemble(&opts.input, opts.optimize, &reader)?;

    for diagnostic in output.diagnostics.iter() {
        eprintln!("{diagnostic}");
    }
    if output.diagnostics.has_errors() {
        bail!(
            "assembly failed with {} error(s)",
            output.diagnostics.error_count()
        );
    }

    fs::write(&opts.output, &output.image)
        .with_context(|| format!("Failed to write output file: {}", opts.output.display()))?;

    if let Some(path) = &opts.symbols {
        let listing = serde_json::to_string_pretty(&output.symbols)?;
        fs::write(path, listing)
            .with_context(|| format!("Failed to write symbol listing: {}", path.display()))?;
    }

    println!(
        "Successfully assembled {} to {} ({} bytes)",
        opts.input.display(),
        opts.output.display(),
        output.image.len()
    );

    Ok(())
}

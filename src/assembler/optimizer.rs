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

use crate::assembler::Assembler;
use crate::assembler::sections::ATTR_EXEC;
use crate::opcodes::Opcode;

/// Peephole pass over the emitted image: drops trailing NOP runs from
/// executable sections, shrinking the written binary. Interior NOPs are left
/// alone because branch targets are encoded as absolute addresses and
/// removing bytes would shift them.
pub fn peephole_optimize(assembler: &mut Assembler) -> u32 {
    let mut removed = 0;
    for section in assembler.sections.iter_mut() {
        if section.attributes & ATTR_EXEC == 0 {
            continue;
        }
        while section.size > 0
            && (section.size as usize) <= section.data.len()
            && section.data[section.size as usize - 1] == Opcode::Nop as u8
        {
            section.size -= 1;
            removed += 1;
        }
    }
    if removed > 0 {
        log::info!("peephole: removed {removed} trailing NOP byte(s)");
    }
    removed
}

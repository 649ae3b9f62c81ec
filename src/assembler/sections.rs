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

pub const ATTR_READ: u8 = 0x01;
pub const ATTR_WRITE: u8 = 0x02;
pub const ATTR_EXEC: u8 = 0x04;

pub const MAX_SECTIONS: usize = 16;
const SECTION_BUFFER_SIZE: usize = 65536;

/// A named contiguous byte region of the image. `size` records the highest
/// offset ever written relative to `origin`.
#[derive(Debug)]
pub struct Section {
    pub name: String,
    pub origin: u32,
    pub size: u32,
    pub attributes: u8,
    pub data: Vec<u8>,
}

impl Section {
    fn new(name: &str, origin: u32, attributes: u8) -> Self {
        Self {
            name: name.to_string(),
            origin,
            size: 0,
            attributes,
            data: vec![0; SECTION_BUFFER_SIZE],
        }
    }

    pub fn end(&self) -> u32 {
        self.origin + self.size
    }
}

#[derive(Debug)]
pub struct SectionTable {
    sections: Vec<Section>,
    current: usize,
}

impl SectionTable {
    /// Builds the default layout and leaves `.text` selected.
    pub fn new() -> Self {
        let mut table = Self {
            sections: Vec::new(),
            current: 0,
        };
        table.create(".text", 0x0000, ATTR_READ | ATTR_EXEC);
        table.create(".data", 0x4000, ATTR_READ | ATTR_WRITE);
        table.create(".bss", 0x6000, ATTR_READ | ATTR_WRITE);
        table.create(".stack", 0x8000, ATTR_READ | ATTR_WRITE);
        table
    }

    pub fn create(&mut self, name: &str, origin: u32, attributes: u8) -> Option<usize> {
        if self.sections.len() >= MAX_SECTIONS {
            return None;
        }
        self.sections.push(Section::new(name, origin, attributes));
        Some(self.sections.len() - 1)
    }

    /// Selects a section by name and returns its origin as the new PC.
    /// An unknown name creates a write-only section at `pc`; a full table
    /// returns None and leaves the selection unchanged.
    pub fn switch(&mut self, name: &str, pc: u32) -> Option<u32> {
        if let Some(index) = self.sections.iter().position(|s| s.name == name) {
            self.current = index;
            return Some(self.sections[index].origin);
        }
        let index = self.create(name, pc, ATTR_WRITE)?;
        self.current = index;
        Some(pc)
    }

    pub fn current(&self) -> &Section {
        &self.sections[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Section {
        &mut self.sections[self.current]
    }

    pub fn find(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.sections.iter_mut()
    }

    /// Highest address covered by any section's emitted bytes.
    pub fn max_address(&self) -> u32 {
        self.sections.iter().map(Section::end).max().unwrap_or(0)
    }
}

impl Default for SectionTable {
    fn default() -> Self {
        Self::new()
    }
}

//! Test data builders for creating registry subtrees

use libera_dummy::registry::{NodeBuilder, SharedWord};

/// Builder for an interlock status group with single-bit views
pub struct StatusGroupBuilder {
    name: String,
    word: SharedWord,
    bits: Vec<(String, u32, u32)>,
}

impl StatusGroupBuilder {
    pub fn new(name: &str, word: &SharedWord) -> Self {
        Self {
            name: name.to_string(),
            word: word.clone(),
            bits: Vec::new(),
        }
    }

    pub fn bit(self, name: &str, offset: u32) -> Self {
        self.field(name, offset, 1)
    }

    pub fn field(mut self, name: &str, offset: u32, width: u32) -> Self {
        self.bits.push((name.to_string(), offset, width));
        self
    }

    pub fn build(self) -> NodeBuilder {
        let word = self.word.clone();
        let reset = move || -> anyhow::Result<bool> {
            word.reset();
            Ok(true)
        };
        let mut group = NodeBuilder::group(self.name).child(NodeBuilder::exec("reset", reset));
        for (name, offset, width) in self.bits {
            group = group.child(NodeBuilder::bits(name, &self.word, offset, width));
        }
        group
    }
}

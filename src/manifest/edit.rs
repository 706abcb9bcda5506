//! Deferred text edits.
//!
//! Edits are planned against offsets of the original text and applied in one
//! forward pass, so no edit shifts another's offsets and nothing is mutated
//! until the whole plan exists.

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

#[derive(Debug, Default, Clone)]
pub struct EditPlan {
    edits: Vec<Edit>,
}

impl EditPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `text` at `at`. Insertions at the same offset keep the order
    /// they were planned in.
    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.replace(at, at, text);
    }

    pub fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) {
        let text = text.into();
        if start == end && text.is_empty() {
            return;
        }
        self.edits.push(Edit { start, end, text });
    }

    /// Applies the plan to `original`. Overlapping replacements are a planning
    /// bug; the later one is clamped so the output stays valid UTF-8.
    pub fn apply(mut self, original: &str) -> String {
        self.edits.sort_by_key(|edit| edit.start);
        let added: usize = self.edits.iter().map(|e| e.text.len()).sum();

        let mut out = String::with_capacity(original.len() + added);
        let mut cursor = 0;
        for edit in self.edits {
            let start = edit.start.max(cursor);
            out.push_str(&original[cursor..start]);
            out.push_str(&edit.text);
            cursor = edit.end.max(start);
        }
        out.push_str(&original[cursor..]);
        out
    }
}

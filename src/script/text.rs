// src/script/text.rs

use std::fmt;

use crate::script::wrapper;

/// Lines of a script under construction.
///
/// Multi-line blocks are split on push so that `next_line_number` always
/// matches the line a reader sees in the written file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptText {
    lines: Vec<String>,
}

impl ScriptText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl AsRef<str>) {
        self.push_block(line.as_ref());
    }

    /// Append a (possibly multi-line) block verbatim.
    pub fn push_block(&mut self, block: &str) {
        let block = block.strip_suffix('\n').unwrap_or(block);
        self.lines.extend(block.split('\n').map(str::to_string));
    }

    pub fn push_all<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.push(line);
        }
    }

    /// Append `command` wrapped in `execute`, tagged with its own line number.
    pub fn push_wrapped(&mut self, command: &str) {
        let line_no = self.next_line_number();
        self.lines.push(wrapper::wrap(command, line_no));
    }

    pub fn next_line_number(&self) -> usize {
        self.lines.len() + 1
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Full file contents, newline terminated.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

impl fmt::Display for ScriptText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

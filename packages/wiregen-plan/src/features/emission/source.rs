//! Incremental source text assembly with indentation handling.

/// Builds the emitted artifact line by line. The indent unit comes from
/// `EmitConfig`; nesting is tracked here so section renderers never hand-count
/// leading spaces.
#[derive(Debug, Default, Clone)]
pub struct SourceBuilder {
    content: String,
    indent_level: usize,
    indent: String,
}

impl SourceBuilder {
    pub fn new(indent: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            indent_level: 0,
            indent: indent.into(),
        }
    }

    /// One indented line, newline-terminated.
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.indent_level {
            self.content.push_str(&self.indent);
        }
        self.content.push_str(text);
        self.content.push('\n');
    }

    /// An empty separator line, never indented.
    pub fn blank(&mut self) {
        self.content.push('\n');
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// `line`, with the body rendered one level deeper.
    pub fn block(&mut self, open: &str, close: &str, body: impl FnOnce(&mut Self)) {
        self.line(open);
        self.indent();
        body(self);
        self.dedent();
        self.line(close);
    }

    pub fn build(self) -> String {
        self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

//! Column-tracking output buffer with auto-indentation, wrapping and anchors

/// Output for one render: tracks the current column so expressions can wrap
/// and align their continuation lines.
#[derive(Debug, Default)]
pub(crate) struct OutputWriter {
    buffer: String,
    column: usize,
    /// Start of the current line in `buffer`
    line_start: usize,
    /// A newline was written and the next character must be indented first
    pending_indent: bool,
    indents: Vec<String>,
    anchors: Vec<usize>,
    /// Length of the caller's line copied in by `fork`
    base: usize,
}

/// Layout directives for one expression's elements
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Layout<'a> {
    pub separator: &'a str,
    pub wrap: Option<usize>,
}

impl OutputWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.buffer
    }

    /// Begin an expression at the current position
    ///
    /// When only whitespace precedes the expression on its line, that
    /// whitespace becomes the indentation of every further line it writes.
    /// With `anchor`, continuation lines are padded to the current column.
    pub fn begin_expression(&mut self, anchor: bool) {
        let prefix = &self.buffer[self.line_start..];
        let indent = if self.pending_indent {
            self.indents.last().cloned().unwrap_or_default()
        } else if prefix.chars().all(|c| c == ' ' || c == '\t') {
            prefix.to_string()
        } else {
            self.indents.last().cloned().unwrap_or_default()
        };
        self.indents.push(indent);

        let column = self.effective_column();
        let outer = self.anchors.last().copied().unwrap_or(0);
        self.anchors.push(if anchor { column.max(outer) } else { outer });
    }

    pub fn end_expression(&mut self) {
        self.indents.pop();
        self.anchors.pop();
    }

    /// Write text, indenting every line after the first
    pub fn write(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.newline();
                continue;
            }
            if self.pending_indent {
                self.pending_indent = false;
                self.write_indent();
            }
            self.buffer.push(c);
            self.column += 1;
        }
    }

    /// Write `count` elements joined by the separator, breaking lines so
    /// that no line passes `layout.wrap` unless a single element is wider
    ///
    /// `render` writes element `idx` into a writer positioned where the
    /// element lands, so nested output sees its real column. A break goes
    /// before the element that would overflow, the element is then rendered
    /// again at the start of the new line. The trimmed separator stays at the
    /// end of the broken line and an element is never split.
    pub fn write_elements<E>(
        &mut self,
        count: usize,
        layout: Layout<'_>,
        mut render: impl FnMut(usize, &mut OutputWriter) -> Result<(), E>,
    ) -> Result<(), E> {
        let trimmed = layout.separator.trim_end();
        let trimmed_width = width(trimmed);

        for idx in 0..count {
            let first = idx == 0;
            let last = idx + 1 == count;

            let mut element = self.fork();
            if !first {
                element.write(layout.separator);
            }
            render(idx, &mut element)?;

            if let Some(limit) = layout.wrap {
                let reach = element.first_line_width() + if last { 0 } else { trimmed_width };
                if self.effective_column() > self.continuation_column() && reach > limit {
                    if !first {
                        self.write(trimmed);
                    }
                    self.newline();
                    element = self.fork();
                    render(idx, &mut element)?;
                }
            }
            self.absorb(element);
        }
        Ok(())
    }

    /// A writer continuing from the current position with the same
    /// indentation and anchors; its output is merged back with `absorb`
    pub fn fork(&self) -> OutputWriter {
        let line = self.buffer[self.line_start..].to_string();
        OutputWriter {
            base: line.len(),
            buffer: line,
            column: self.column,
            line_start: 0,
            pending_indent: self.pending_indent,
            indents: self.indents.clone(),
            anchors: self.anchors.clone(),
        }
    }

    /// Append what a forked writer produced, already indented
    pub fn absorb(&mut self, child: OutputWriter) {
        self.buffer.push_str(&child.buffer[child.base..]);
        self.line_start += child.line_start;
        self.column = child.column;
        self.pending_indent = child.pending_indent;
    }

    /// Width of the first line, including text before this writer was forked
    fn first_line_width(&self) -> usize {
        width(self.buffer.split('\n').next().unwrap_or(""))
    }

    fn newline(&mut self) {
        self.buffer.push('\n');
        self.column = 0;
        self.line_start = self.buffer.len();
        self.pending_indent = !self.indents.is_empty();
    }

    fn write_indent(&mut self) {
        if let Some(indent) = self.indents.last() {
            self.buffer.push_str(indent);
            self.column += width(indent);
        }
        if let Some(&anchor) = self.anchors.last() {
            while self.column < anchor {
                self.buffer.push(' ');
                self.column += 1;
            }
        }
    }

    /// Column the next character will land on
    fn effective_column(&self) -> usize {
        if self.pending_indent {
            self.continuation_column()
        } else {
            self.column
        }
    }

    /// Column where an indented or anchored continuation line starts
    fn continuation_column(&self) -> usize {
        let indent = self.indents.last().map(|i| width(i)).unwrap_or(0);
        let anchor = self.anchors.last().copied().unwrap_or(0);
        indent.max(anchor)
    }
}

fn width(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    fn numbers(n: usize) -> Vec<String> {
        (1..=n).map(|i| (i * 7).to_string()).collect()
    }

    fn write_all(out: &mut OutputWriter, elements: &[String], layout: Layout<'_>) {
        out.write_elements(elements.len(), layout, |idx, w| {
            w.write(&elements[idx]);
            Ok::<_, Infallible>(())
        })
        .unwrap();
    }

    #[test]
    fn test_plain_write_tracks_columns() {
        let mut out = OutputWriter::new();
        out.write("ab\ncde");
        assert_eq!(out.column, 3);
        assert_eq!(out.finish(), "ab\ncde");
    }

    #[test]
    fn test_auto_indent() {
        let mut out = OutputWriter::new();
        out.write("{\n    ");
        out.begin_expression(false);
        out.write("a\nb\n\nc");
        out.end_expression();
        out.write("\n}");
        assert_eq!(out.finish(), "{\n    a\n    b\n\n    c\n}");
    }

    #[test]
    fn test_no_indent_after_text() {
        let mut out = OutputWriter::new();
        out.write("x = ");
        out.begin_expression(false);
        out.write("a\nb");
        out.end_expression();
        assert_eq!(out.finish(), "x = a\nb");
    }

    #[test]
    fn test_wrap_with_anchor() {
        let mut out = OutputWriter::new();
        out.write("int a[] = { ");
        out.begin_expression(true);
        write_all(
            &mut out,
            &numbers(8),
            Layout {
                separator: ", ",
                wrap: Some(30),
            },
        );
        out.end_expression();
        let text = out.finish();
        assert_eq!(text, "int a[] = { 7, 14, 21, 28, 35,\n            42, 49, 56");
        for line in text.lines() {
            assert!(line.chars().count() <= 30, "line too long: {:?}", line);
        }
    }

    #[test]
    fn test_wrap_without_anchor_starts_at_indent() {
        let mut out = OutputWriter::new();
        out.write("xs: ");
        out.begin_expression(false);
        write_all(
            &mut out,
            &numbers(6),
            Layout {
                separator: " ",
                wrap: Some(12),
            },
        );
        out.end_expression();
        assert_eq!(out.finish(), "xs: 7 14 21\n28 35 42");
    }

    #[test]
    fn test_forked_writer_keeps_position() {
        let mut out = OutputWriter::new();
        out.write("  x = ");
        out.begin_expression(false);
        let mut child = out.fork();
        child.begin_expression(true);
        write_all(
            &mut child,
            &numbers(4),
            Layout {
                separator: " ",
                wrap: Some(12),
            },
        );
        child.end_expression();
        out.absorb(child);
        out.end_expression();
        out.write(";\nend");
        assert_eq!(out.finish(), "  x = 7 14\n      21 28;\nend");
    }

    #[test]
    fn test_separator_without_wrap() {
        let mut out = OutputWriter::new();
        out.begin_expression(false);
        write_all(
            &mut out,
            &numbers(3),
            Layout {
                separator: "|",
                wrap: None,
            },
        );
        out.end_expression();
        assert_eq!(out.finish(), "7|14|21");
    }
}

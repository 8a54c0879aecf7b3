//! Post-processing passes over finished G-code
//!
//! A pass takes the lines a slicer wrote and returns the lines the machine
//! should see. Line terminators travel with each line, so a pass only ever
//! edits content.

use crate::document::{join_lines, split_lines, RawLine};

pub mod fan;

pub use fan::{process_lines, FanContinuity, Note, NoteKind, RewriterState, Summary};

/// Post-processor trait - implemented for each rewriting pass
pub trait PostProcessor {
    /// Rewrite a document, one line at a time, in order
    fn process(&mut self, lines: Vec<RawLine>) -> Vec<RawLine>;

    /// Pass name, used in logs
    fn name(&self) -> &str;
}

/// Run a pass over decoded document text
pub fn process_text(post: &mut dyn PostProcessor, text: &str) -> String {
    let lines = split_lines(text);
    let read = lines.len();
    let out = post.process(lines);

    tracing::debug!(post = post.name(), read, written = out.len(), "pass finished");

    join_lines(&out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_process_text_through_trait_object() {
        let mut post = FanContinuity::new();
        let out = process_text(&mut post, "M108 T0\r\nM106 S30 T9 ; cool\r\n");

        assert_eq!(out, "M108 T0\r\nM106 S30 T0 ; cool\r\n");
        assert_eq!(post.name(), "fan continuity");
    }

    #[test]
    fn test_process_text_empty_document() {
        let mut post = FanContinuity::new();
        assert_eq!(process_text(&mut post, ""), "");
    }
}

//! Fan continuity pass
//!
//! Controllers that bind fan speed to the active tool drop it on every tool
//! change. This pass tags each `M106 S..` with the tool selected by the most
//! recent `M108 T..` and re-issues the last speed right after each tool change.
//!
//! Speeds and tool numbers are carried as text and written back verbatim.

use std::ops::Range;

use tracing::{debug, info};

use crate::config::InsertEol;
use crate::document::{Eol, RawLine};
use crate::lexer::{self, FanCommand};
use crate::post::PostProcessor;

/// What the pass remembers between lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriterState {
    /// Digits of the active tool, unset until the first tool-select line
    pub current_tool: Option<String>,
    /// Speed text of the last tagged fan command
    pub last_fan_speed: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    /// Fan command with a speed seen before any tool was selected.
    /// It is left untouched and its speed is not remembered.
    NoToolSelected,
    /// Fan command without a speed parameter while a tool is active
    MissingSpeed,
}

impl std::fmt::Display for NoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteKind::NoToolSelected => write!(f, "fan speed set before any tool was selected"),
            NoteKind::MissingSpeed => write!(f, "fan command has no S parameter"),
        }
    }
}

/// A fan-speed line the pass left alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Zero-based index of the input line
    pub line: usize,
    /// Byte range within the line content
    pub span: Range<usize>,
    pub kind: NoteKind,
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub lines_read: usize,
    pub tool_changes: usize,
    pub tagged: usize,
    pub inserted: usize,
    pub untouched_fan: usize,
}

pub struct FanContinuity {
    state: RewriterState,
    insert_eol: InsertEol,
    summary: Summary,
    notes: Vec<Note>,
}

impl Default for FanContinuity {
    fn default() -> Self {
        Self {
            state: RewriterState::default(),
            insert_eol: InsertEol::Match,
            summary: Summary::default(),
            notes: Vec::new(),
        }
    }
}

impl FanContinuity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_insert_eol(mut self, insert_eol: InsertEol) -> Self {
        self.insert_eol = insert_eol;
        self
    }

    pub fn state(&self) -> &RewriterState {
        &self.state
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Rewrite one input line, pushing one or two lines to `out`
    pub fn rewrite_line(&mut self, index: usize, line: RawLine, out: &mut Vec<RawLine>) {
        self.summary.lines_read += 1;

        if let Some(tool) = lexer::parse_tool_select(&line.content) {
            let tool = tool.to_string();
            self.summary.tool_changes += 1;

            let insert = self.state.last_fan_speed.as_ref().map(|speed| {
                let eol = match self.insert_eol {
                    InsertEol::Match => line.eol,
                    InsertEol::Lf => Eol::Lf,
                };
                RawLine::new(format!("{} S{} T{}", lexer::FAN_SPEED, speed, tool), eol)
            });

            out.push(line);
            if let Some(insert) = insert {
                debug!(line = index + 1, tool = %tool, content = %insert.content, "re-issued fan speed");
                self.summary.inserted += 1;
                out.push(insert);
            }

            self.state.current_tool = Some(tool);
            return;
        }

        if lexer::is_fan_command(&line.content) {
            let cmd = FanCommand::parse(&line.content);

            match (self.state.current_tool.clone(), cmd.speed) {
                (Some(tool), Some(speed)) => {
                    let content = cmd.with_tool(&tool);
                    debug!(line = index + 1, tool = %tool, speed, replaced = ?cmd.tools(), "tagged fan command");

                    self.state.last_fan_speed = Some(speed.to_string());
                    self.summary.tagged += 1;
                    out.push(RawLine::new(content, line.eol));
                    return;
                }
                (None, Some(_)) => {
                    let span = cmd.speed_span.clone().unwrap_or_else(|| trimmed_span(&line.content));
                    self.note(index, span, NoteKind::NoToolSelected);
                }
                (Some(_), None) => {
                    self.note(index, trimmed_span(&line.content), NoteKind::MissingSpeed);
                }
                (None, None) => {}
            }
            self.summary.untouched_fan += 1;
        }

        out.push(line);
    }

    fn note(&mut self, line: usize, span: Range<usize>, kind: NoteKind) {
        debug!(line = line + 1, %kind, "fan command left unchanged");
        self.notes.push(Note { line, span, kind });
    }
}

impl PostProcessor for FanContinuity {
    fn process(&mut self, lines: Vec<RawLine>) -> Vec<RawLine> {
        let mut out = Vec::with_capacity(lines.len());

        for (index, line) in lines.into_iter().enumerate() {
            self.rewrite_line(index, line, &mut out);
        }

        info!(
            lines = self.summary.lines_read,
            tool_changes = self.summary.tool_changes,
            tagged = self.summary.tagged,
            inserted = self.summary.inserted,
            untouched = self.summary.untouched_fan,
            "fan continuity done"
        );

        out
    }

    fn name(&self) -> &str {
        "fan continuity"
    }
}

/// Run the pass with default settings
pub fn process_lines(lines: Vec<RawLine>) -> Vec<RawLine> {
    FanContinuity::new().process(lines)
}

fn trimmed_span(content: &str) -> Range<usize> {
    let start = content.len() - content.trim_start().len();
    let end = content.trim_end().len().max(start);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{join_lines, split_lines};
    use pretty_assertions::assert_eq;

    fn run(text: &str) -> String {
        join_lines(&process_lines(split_lines(text)))
    }

    #[test]
    fn test_tool_select_without_saved_speed() {
        assert_eq!(run("M108 T2\n"), "M108 T2\n");
    }

    #[test]
    fn test_speed_carries_across_tool_change() {
        let out = run("M106 S50\nM108 T1\nM106 S75\nM108 T2\n");

        assert_eq!(
            out,
            "M106 S50\n\
             M108 T1\n\
             M106 S75 T1\n\
             M108 T2\n\
             M106 S75 T2\n"
        );
    }

    #[test]
    fn test_old_tool_replaced_and_comment_kept() {
        assert_eq!(
            run("M108 T0\nM106 S30 T9 ; cool\n"),
            "M108 T0\nM106 S30 T0 ; cool\n"
        );
    }

    #[test]
    fn test_fan_without_speed_passes_through() {
        let mut post = FanContinuity::new();
        let out = post.process(split_lines("M108 T1\nM106 S20\nM106\n"));

        assert_eq!(out[2], RawLine::new("M106", Eol::Lf));
        assert_eq!(post.state().last_fan_speed.as_deref(), Some("20"));
        assert_eq!(post.notes()[0].kind, NoteKind::MissingSpeed);
        assert_eq!(post.notes()[0].line, 2);
    }

    #[test]
    fn test_untagged_fan_does_not_remember_speed() {
        let mut post = FanContinuity::new();
        let out = post.process(split_lines("M106 S99\nM108 T3\n"));

        assert_eq!(join_lines(&out), "M106 S99\nM108 T3\n");
        assert_eq!(post.state().last_fan_speed, None);
        assert_eq!(post.state().current_tool.as_deref(), Some("3"));
        assert_eq!(
            post.notes(),
            &[Note {
                line: 0,
                span: 5..8,
                kind: NoteKind::NoToolSelected,
            }]
        );
    }

    #[test]
    fn test_latest_speed_wins() {
        let out = run("M108 T0\nM106 S10\nM106 S20.5\nM108 T1\n");

        assert_eq!(
            out,
            "M108 T0\nM106 S10 T0\nM106 S20.5 T0\nM108 T1\nM106 S20.5 T1\n"
        );
    }

    #[test]
    fn test_speed_text_is_not_reformatted() {
        let out = run("M108 T0\nM106 S038.250\nM108 T1\n");
        assert!(out.ends_with("M106 S038.250 T1\n"));
    }

    #[test]
    fn test_case_and_indentation() {
        let out = run("  m108 t4\n\tm106 s-1 t2 ;x\n");
        assert_eq!(out, "  m108 t4\n\tm106 s-1 T4 ;x\n");
    }

    #[test]
    fn test_terminators_preserved() {
        let out = run("M106 S1\r\nM108 T0\r\nM106 S64 ; on\r\nG1 X1\nM108 T1\r\n");

        assert_eq!(
            out,
            "M106 S1\r\n\
             M108 T0\r\n\
             M106 S64 T0 ; on\r\n\
             G1 X1\n\
             M108 T1\r\n\
             M106 S64 T1\r\n"
        );
    }

    #[test]
    fn test_insert_can_use_lf() {
        let mut post = FanContinuity::new().with_insert_eol(InsertEol::Lf);
        let out = post.process(split_lines("M108 T0\r\nM106 S5\r\nM108 T1\r\n"));

        assert_eq!(out.last(), Some(&RawLine::new("M106 S5 T1", Eol::Lf)));
    }

    #[test]
    fn test_unterminated_tool_select_insert() {
        let out = process_lines(split_lines("M108 T0\nM106 S5\nM108 T1"));

        assert_eq!(out[2], RawLine::new("M108 T1", Eol::None));
        assert_eq!(out[3], RawLine::new("M106 S5 T1", Eol::None));
        assert_eq!(join_lines(&out), "M108 T0\nM106 S5 T0\nM108 T1\nM106 S5 T1\n");
    }

    #[test]
    fn test_idempotent_on_tagged_input() {
        let input = "M108 T0\nM106 S30 T0 ; cool\nG1 X10\nM106 S40 T0\n";
        let once = run(input);

        assert_eq!(once, input);
        assert_eq!(run(&once), once);
    }

    #[test]
    fn test_other_lines_pass_through() {
        let input = "; generated\nG28\nM107\nM104 S200 T1\n\n  \nM106S50\n";
        let mut post = FanContinuity::new();
        let out = post.process(split_lines(input));

        assert_eq!(join_lines(&out), input);
        assert_eq!(post.summary().tagged, 0);
    }

    #[test]
    fn test_never_drops_lines() {
        let input = "M106 S1\nM108 T0\nM106 S2\nM108 T1\nM106\nM108 T2\nG1\n";
        let lines = split_lines(input);
        let read = lines.len();

        let mut post = FanContinuity::new();
        let out = post.process(lines);

        assert_eq!(out.len(), read + post.summary().inserted);
        assert_eq!(post.summary().inserted, 2);
        assert_eq!(post.summary().tool_changes, 3);
        assert_eq!(post.summary().untouched_fan, 2);
    }

    #[test]
    fn test_tool_select_with_trailing_punctuation() {
        for tool_line in ["M108 T1(next)", "M108 T1.", "M108 T1,x", "M108 T1*12"] {
            let out = run(&format!("{}\nM106 S50\n", tool_line));
            assert_eq!(out, format!("{}\nM106 S50 T1\n", tool_line));
        }
    }

    #[test]
    fn test_tool_select_is_not_a_fan_line() {
        let out = run("M108 T0\nM106 S5\nM108 T1 ; M106 S9\n");
        assert_eq!(out, "M108 T0\nM106 S5 T0\nM108 T1 ; M106 S9\nM106 S5 T1\n");
    }
}

//! Warning reports for fan commands the pass could not tag

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use std::io::Write;

use crate::document::line_starts;
use crate::post::{Note, NoteKind};

/// Render `notes` against the document they were collected from.
///
/// Note spans are byte ranges within a line; ariadne wants char offsets into
/// the whole text, so they are converted here.
pub fn write_notes<W: Write>(
    name: &str,
    text: &str,
    notes: &[Note],
    color: bool,
    mut out: W,
) -> std::io::Result<()> {
    let starts = line_starts(text);
    let mut cache = (name, Source::from(text));

    for note in notes {
        let Some(&line_start) = starts.get(note.line) else {
            continue;
        };
        let start = char_offset(text, line_start + note.span.start);
        let end = char_offset(text, line_start + note.span.end);

        let label = match note.kind {
            NoteKind::NoToolSelected => "no M108 T<n> before this line, left as is",
            NoteKind::MissingSpeed => "nothing to carry over, left as is",
        };

        Report::build(ReportKind::Warning, name, start)
            .with_config(Config::default().with_color(color))
            .with_message(note.kind.to_string())
            .with_label(
                Label::new((name, start..end))
                    .with_message(label)
                    .with_color(Color::Yellow),
            )
            .finish()
            .write(&mut cache, &mut out)?;
    }

    Ok(())
}

fn char_offset(text: &str, byte: usize) -> usize {
    text.get(..byte).map_or(0, |prefix| prefix.chars().count())
}

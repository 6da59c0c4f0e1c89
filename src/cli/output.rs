//! User-facing output for the CLI.
//!
//! Trees and keyword lists go to stdout. Status lines go to stderr, colored
//! with termcolor, so stdout stays machine-readable.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::project::{FileReport, FileStatus, ProjectReport};

pub struct Status {
    stream: StandardStream,
}

impl Status {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stream: StandardStream::stderr(choice),
        }
    }

    /// `Parsing: path... ` without a line break; finish with [`Status::done`].
    pub fn begin(&mut self, verb: &str, subject: &str) {
        let _ = self
            .stream
            .set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
        let _ = write!(self.stream, "{verb}:");
        let _ = self.stream.reset();
        let _ = write!(self.stream, " {subject}... ");
        let _ = self.stream.flush();
    }

    pub fn done(&mut self, word: &str) {
        self.outcome(Color::Green, word);
    }

    pub fn failed(&mut self, word: &str) {
        self.outcome(Color::Red, word);
    }

    pub fn file(&mut self, file: &FileReport) {
        let (color, word) = match file.status {
            FileStatus::Cached => (Color::Blue, "cached"),
            FileStatus::Parsed => (Color::Green, "parsed"),
            FileStatus::Failed => (Color::Red, "failed"),
        };
        let _ = self.stream.set_color(ColorSpec::new().set_fg(Some(color)));
        let _ = write!(self.stream, "{word:>7}");
        let _ = self.stream.reset();
        let _ = writeln!(self.stream, " {}", file.source.display());
    }

    pub fn summary(&mut self, report: &ProjectReport) {
        let _ = self.stream.set_color(ColorSpec::new().set_bold(true));
        let _ = writeln!(
            self.stream,
            "{} files: {} parsed, {} cached",
            report.files.len(),
            report.count(FileStatus::Parsed),
            report.count(FileStatus::Cached)
        );
        let _ = self.stream.reset();
    }

    fn outcome(&mut self, color: Color, word: &str) {
        let _ = self
            .stream
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = writeln!(self.stream, "{word}");
        let _ = self.stream.reset();
    }
}

/// Prints one JSON line to stdout.
pub fn print_tree(json: &str) {
    println!("{json}");
}

pub fn print_keywords(words: &[String]) {
    for word in words {
        println!("{word}");
    }
}

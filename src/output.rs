//! Run log for release-on-tag.
//!
//! A `Reporter` wraps the writer the run logs to (stderr in the binary, a
//! buffer in tests) and knows the handful of events a release run produces.
//! Labels are coloured only when the sink is a terminal.

use console::{Color, style};
use std::io::Write;

/// Writes release-run events to a sink.
pub struct Reporter<'w> {
    sink: &'w mut dyn Write,
    colored: bool,
    verbose: bool,
}

impl<'w> Reporter<'w> {
    pub fn new(sink: &'w mut dyn Write, colored: bool, verbose: bool) -> Self {
        Self {
            sink,
            colored,
            verbose,
        }
    }

    /// HEAD is on `tag`; the run continues.
    pub fn tag_detected(&mut self, tag: &str) {
        self.line("Tag", Color::Cyan, tag);
    }

    /// The run ends early without error.
    pub fn stopping(&mut self, reason: &str) {
        self.line("Stopping", Color::Yellow, reason);
    }

    pub fn uploading(&mut self, name: &str, tag: &str) {
        self.line("Uploading", Color::Cyan, &format!("{name} to {tag}"));
    }

    /// GitHub accepted an asset and reported its download URL.
    pub fn uploaded(&mut self, download_url: &str) {
        self.line(
            "Uploaded",
            Color::Green,
            &format!("Successfully uploaded to {download_url}"),
        );
    }

    pub fn skipped(&mut self, name: &str, tag: &str) {
        self.line(
            "Skipped",
            Color::Yellow,
            &format!("File {name} has already been uploaded to {tag}"),
        );
    }

    /// Both assets of `tag` are on GitHub.
    pub fn published(&mut self, tag: &str, assets: &[&str]) {
        self.line(
            "Done",
            Color::Green,
            &format!("release {tag}: {}", assets.join(", ")),
        );
    }

    pub fn warning(&mut self, msg: &str) {
        self.line("Warning", Color::Yellow, msg);
    }

    /// Fatal error; `{:#}` keeps the whole context chain on one line.
    pub fn failure(&mut self, err: &anyhow::Error) {
        self.line("error", Color::Red, &format!("{err:#}"));
    }

    /// Indented detail (URLs, paths, digests), written only when verbose.
    pub fn debug(&mut self, msg: &str) {
        if !self.verbose {
            return;
        }
        let line = if self.colored {
            style(format!("  {msg}"))
                .dim()
                .force_styling(true)
                .to_string()
        } else {
            format!("  {msg}")
        };
        let _ = writeln!(self.sink, "{line}");
    }

    fn line(&mut self, label: &str, color: Color, msg: &str) {
        let label = if self.colored {
            style(label)
                .bold()
                .fg(color)
                .force_styling(true)
                .to_string()
        } else {
            label.to_string()
        };
        let _ = writeln!(self.sink, "{label} {msg}");
    }
}

//! Terminal output helpers for the command-line tool.
//!
//! Results go to stdout untouched; diagnostics go to stderr and are only
//! colored when stderr is a terminal.

use owo_colors::OwoColorize;
use std::fs::File;
use std::io::{IsTerminal, Write};
use std::path::Path;

use crate::models::{Annotations, SemanticGroup};

/// Check if stderr is a terminal.
pub fn stderr_is_terminal() -> bool {
    std::io::stderr().is_terminal()
}

/// Format a one-line error diagnostic.
pub fn format_error(message: &str, colored: bool) -> String {
    if colored {
        format!("{} {}", "error:".red().bold(), message)
    } else {
        format!("error: {}", message)
    }
}

/// Print a one-line error diagnostic to stderr.
pub fn print_error(message: &str) {
    eprintln!("{}", format_error(message, stderr_is_terminal()));
}

/// Print a success note to stderr.
pub fn print_success(message: &str) {
    if stderr_is_terminal() {
        eprintln!("{} {}", "✓".green().bold(), message);
    } else {
        eprintln!("{}", message);
    }
}

/// Help text listing the available semantic groups.
pub fn groups_help() -> String {
    let codes = SemanticGroup::ALL
        .iter()
        .map(|group| group.code())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Semantic groups to use for annotation as a comma separated list \
         (e.g. PRGE,DISO,ANAT). Available groups: ({})",
        codes
    )
}

/// Annotation results ready to be written out
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Annotate result, written as compact JSON
    Annotations(Annotations),
    /// Export result, written verbatim
    Text(String),
}

impl Output {
    pub fn render(&self) -> Result<String, serde_json::Error> {
        match self {
            Output::Annotations(map) => serde_json::to_string(map),
            Output::Text(text) => Ok(text.clone()),
        }
    }
}

/// Write results to `path`, or to stdout when no path is given.
pub fn write_output(output: &Output, path: Option<&Path>) -> std::io::Result<()> {
    let rendered = output.render()?;
    match path {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(rendered.as_bytes())?;
            file.flush()
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_error_plain() {
        assert_eq!(
            format_error("Connection error: refused", false),
            "error: Connection error: refused"
        );
        assert!(format_error("boom", true).contains("boom"));
    }

    #[test]
    fn test_groups_help_lists_all_codes() {
        let help = groups_help();
        for group in SemanticGroup::ALL {
            assert!(help.contains(group.code()));
        }
    }

    #[test]
    fn test_render_annotations_compact() {
        let map = json!({"text": "BRCA1", "entities": []})
            .as_object()
            .cloned()
            .unwrap();
        let output = Output::Annotations(map);
        let rendered = output.render().unwrap();
        assert!(!rendered.contains('\n'));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&rendered).unwrap(),
            json!({"text": "BRCA1", "entities": []})
        );
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");
        let output = Output::Text("<doc/>".to_string());

        write_output(&output, Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<doc/>");
    }
}

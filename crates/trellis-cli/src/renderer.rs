//! Terminal rendering for command output
//!
//! Output is produced as plain text by the core's Display impls. The rich
//! renderer colours headings and step status markers; plan titles, step text
//! and notes are printed as they are. `--no-color` prints everything untouched.

use anyhow::Result;
use termimad::crossterm::style::{Color, Stylize};

/// Marker colours, matching the markers in plan views.
const MARKERS: [(&str, Color); 4] = [
    ("[✓]", Color::Green),
    ("[→]", Color::Yellow),
    ("[!]", Color::Red),
    ("[ ]", Color::DarkGrey),
];

/// Terminal renderer that can switch between rich and plain text output
pub struct TerminalRenderer {
    rich_enabled: bool,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        Self { rich_enabled }
    }

    pub fn render(&self, text: &str) -> Result<()> {
        print!("{}", self.styled(text));
        Ok(())
    }

    fn styled(&self, text: &str) -> String {
        if !self.rich_enabled {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        for line in text.lines() {
            if is_heading(line) {
                out.push_str(&line.with(Color::Blue).to_string());
            } else {
                out.push_str(&style_marker(line));
            }
            out.push('\n');
        }
        out
    }
}

/// Plan headers and section labels get the header colour.
fn is_heading(line: &str) -> bool {
    line.starts_with("Plan: ") || (line.ends_with(':') && !line.starts_with(' '))
}

/// Colours the status marker of a `N. [x] text` step line.
fn style_marker(line: &str) -> String {
    let Some((number, rest)) = line.split_once(". ") else {
        return line.to_string();
    };
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return line.to_string();
    }
    MARKERS
        .iter()
        .find_map(|(marker, color)| {
            rest.strip_prefix(marker)
                .map(|step| format!("{number}. {}{step}", marker.with(*color)))
        })
        .unwrap_or_else(|| line.to_string())
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_renderer() {
        let renderer = TerminalRenderer::new(false);
        assert!(!renderer.rich_enabled);
        let text = "Plan: x (ID: p1)\n0. [ ] *not* bold\n";
        assert_eq!(renderer.styled(text), text);
    }

    #[test]
    fn test_default_is_rich() {
        let renderer = TerminalRenderer::default();
        assert!(renderer.rich_enabled);
    }

    #[test]
    fn test_heading_detection() {
        assert!(is_heading("Plan: Ship it (ID: p1)"));
        assert!(is_heading("Available plans:"));
        assert!(is_heading("Steps:"));
        assert!(!is_heading("  Notes: none:"));
        assert!(!is_heading("0. [ ] build"));
    }

    #[test]
    fn test_rich_output_keeps_user_text_verbatim() {
        let renderer = TerminalRenderer::new(true);
        let output = renderer.styled(
            "Plan: *draft* (ID: p1)\n0. [✓] run `make` for **all**\n   Notes: see *.log\n1. [ ] 2 * 3\n",
        );

        assert!(output.contains("*draft*"));
        assert!(output.contains(" run `make` for **all**\n"));
        assert!(output.contains("   Notes: see *.log\n"));
        assert!(output.contains(" 2 * 3\n"));
    }

    #[test]
    fn test_style_marker() {
        assert_eq!(style_marker("not a step"), "not a step");
        assert_eq!(style_marker("a. [ ] letters"), "a. [ ] letters");
        assert_eq!(style_marker("3. no marker"), "3. no marker");

        let styled = style_marker("3. [!] stuck");
        assert!(styled.starts_with("3. "));
        assert!(styled.contains("[!]"));
        assert!(styled.ends_with(" stuck"));
    }
}

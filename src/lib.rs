#![allow(clippy::module_inception)]

use std::fmt::{self, Display};

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod compiler;
pub mod config;
pub mod driver;
pub mod errors;
pub mod logging;
pub mod resolver;
pub mod type_checker;

/// A line/column pair in the source file, both 1-based.
///
/// Nodes synthesized by the compiler (and nodes built without positions) carry
/// [`Position::null`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    pub fn null() -> Self {
        Position { line: 0, column: 0 }
    }

    pub fn is_null(&self) -> bool {
        self.line == 0
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: column {}", self.line, self.column)
    }
}

/// Returns the line number, the text of the line and the 0-based offset of
/// `position` within that line.
pub fn get_line_at_position(source: &str, position: Position) -> Option<(usize, String, usize)> {
    if position.is_null() {
        return None;
    }

    let line_number = position.line as usize;
    let line = source.split_inclusive('\n').nth(line_number - 1)?;
    let line_pos = (position.column.max(1) - 1) as usize;

    Some((line_number, line.to_string(), line_pos.min(line.len())))
}

#[cfg(test)]
mod tests {
    use super::Position;

    #[test]
    fn test_get_line_at_position() {
        let source = "class A {\n    int x;\n  Testing { }\n}\n";

        let (line_number, line, line_pos) =
            super::get_line_at_position(source, Position::new(1, 7)).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "class A {\n");
        assert_eq!(line_pos, 6);

        let (line_number, line, line_pos) =
            super::get_line_at_position(source, Position::new(3, 11)).unwrap();
        assert_eq!(line_number, 3);
        assert_eq!(line, "  Testing { }\n");
        assert_eq!(line_pos, 10);
    }

    #[test]
    fn test_get_line_at_null_or_missing_position() {
        assert!(super::get_line_at_position("class A {}", Position::null()).is_none());
        assert!(super::get_line_at_position("class A {}", Position::new(4, 1)).is_none());
    }
}

/// Renders `error` against the source it came from.
///
/// ```text
/// Error: UndeclaredIdentifier (Identifier `y` has not been declared)
/// -> Test.java
///    |
/// 20 | int x = y;
///    | --------^
/// ```
///
/// Errors without a usable position (contract violations found by the code
/// generator) render only the headline.
pub fn render_error(error: &Error, source: &str, file_name: &str) -> String {
    let mut out = String::new();

    if let ErrorTip::None = error.get_tip() {
        out.push_str(&format!("Error: {}\n", error.get_error_name()));
    } else {
        out.push_str(&format!(
            "Error: {} ({})\n",
            error.get_error_name(),
            error.get_tip()
        ));
    }

    let Some((line, line_text, line_pos)) = get_line_at_position(source, *error.get_position())
    else {
        return out;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    out.push_str(&format!("-> {}\n", file_name));
    out.push_str(&format!("{:>padding$}\n", "|"));

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    out.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim()));

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;
    out.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));

    out
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}

//! Indentation measurement
//!
//! Block membership is decided purely by leading whitespace, so every line
//! is measured the same way: spaces count one column, tabs count four.

/// Columns a tab is worth
pub const TAB_WIDTH: usize = 4;

/// Measure the leading whitespace of a line in columns
///
/// # Example
/// ```
/// use tideline::plugins::sequence::measure_indent;
///
/// assert_eq!(measure_indent("    A -> B: hi"), 4);
/// assert_eq!(measure_indent("\tA -> B: hi"), 4);
/// assert_eq!(measure_indent("A -> B: hi"), 0);
/// ```
pub fn measure_indent(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

use crate::Result;
use std::io::BufRead;

/// Read every line from `reader`, stripping `\n` and `\r\n` terminators.
pub fn read_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }
    Ok(lines)
}

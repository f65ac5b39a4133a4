//! CSV and TSV: one line per row, cells joined by ` | `.
//!
//! A line break inside a double-quoted cell belongs to the cell; it is
//! flattened to a space so each row still renders on one line.

/// Split `text` into rows of cells on `delimiter`, honoring double quotes.
fn split_rows(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\n' if quoted => cell.push(' '),
            '\r' | '\n' => rows.push(finish_row(&mut row, &mut cell)),
            c if c == delimiter && !quoted => row.push(std::mem::take(&mut cell)),
            c => cell.push(c),
        }
    }
    // An unterminated quote runs to the end of the input.
    rows.push(finish_row(&mut row, &mut cell));
    rows
}

fn finish_row(row: &mut Vec<String>, cell: &mut String) -> Vec<String> {
    row.push(std::mem::take(cell));
    std::mem::take(row)
}

pub fn extract(bytes: &[u8], delimiter: char) -> String {
    split_rows(&String::from_utf8_lossy(bytes), delimiter)
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

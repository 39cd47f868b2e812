//! Append-only CSV row files: a header written once, then one row per event.

use std::{fs, io, path::Path};

// Trait must be in scope for `.write_all()` on `File`.
use io::Write;

use super::{Result, StorageError};

/// Appends one row, writing `header` first if the file is new or empty.
///
/// The header and row go out in a single write.
pub(super) fn append_row(path: &Path, header: &[&str], fields: &[String]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    let mut buf = String::new();
    if file.metadata()?.len() == 0 {
        push_line(&mut buf, header.iter().copied());
    }
    push_line(&mut buf, fields.iter().map(String::as_str));
    file.write_all(buf.as_bytes())
}

/// Reads every data row (header skipped). A missing file has no rows.
pub(super) fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut rows = Vec::new();
    for (n, line) in contents.lines().enumerate().skip(1) {
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(fields) => rows.push(fields),
            None => {
                return Err(StorageError::Corrupt {
                    path: path.to_path_buf(),
                    reason: format!("line {}: unterminated quote", n + 1),
                });
            }
        }
    }
    Ok(rows)
}

fn push_line<'a>(buf: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            buf.push(',');
        }
        buf.push_str(&quote_field(field));
    }
    buf.push('\n');
}

/// Quotes a field if it contains a comma, quote, or line break.
fn quote_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Splits one line into fields. `None` if a quote is left open.
fn parse_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        let mut field = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    field.push(c);
                }
            }
            if !closed {
                return None;
            }
            fields.push(field);
            match chars.next() {
                Some(',') => {}
                None => return Some(fields),
                Some(_) => return None,
            }
        } else {
            loop {
                match chars.next() {
                    Some(',') => break,
                    Some(c) => field.push(c),
                    None => {
                        fields.push(field);
                        return Some(fields);
                    }
                }
            }
            fields.push(field);
        }
    }
}

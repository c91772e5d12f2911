//! Interactive corrections

use std::io::{BufRead, Write};

use crate::error::Result;
use crate::format::{field, Entry};

/// Fields never offered for correction
const FIXED_FIELDS: [&str; 3] = [field::FILE, field::DATE_ADDED, field::CHECKSUM];

/// Show the proposed entry, then ask for a correction of every editable
/// field. A blank answer keeps the current value; end of input keeps all
/// remaining values.
pub fn interactive_corrections<R: BufRead, W: Write>(
    rendered: &str,
    mut entry: Entry,
    input: &mut R,
    out: &mut W,
) -> Result<Entry> {
    tracing::info!("Entering interactive corrections mode. Leave blank for default.");
    writeln!(out, "{}", rendered)?;

    if let Some(answer) = ask(input, out, "type")? {
        entry.entry_type = answer;
    }
    if let Some(answer) = ask(input, out, "key")? {
        entry.key = answer;
    }

    let names: Vec<String> = entry
        .fields
        .keys()
        .filter(|name| !FIXED_FIELDS.contains(&name.as_str()))
        .cloned()
        .collect();

    for name in names {
        if let Some(answer) = ask(input, out, &name)? {
            entry.set(&name, answer);
        }
    }

    writeln!(out)?;
    Ok(entry)
}

fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, name: &str) -> Result<Option<String>> {
    write!(out, "'{}' correction: ", name)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }

    let answer = line.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

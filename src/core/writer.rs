//! Descriptor text serialization.
//!
//! One line per entry, primary entry first:
//!
//! ```text
//! Component impl="com.acme.Impl" provides="com.acme.Api"
//! ServiceDependency service="com.acme.Log" autoConfig="log"
//! ```
//!
//! Values are always double-quoted with JSON string escaping. Type-name
//! lists are comma-joined; property tables embed their canonical JSON
//! encoding.

use std::fmt::{self, Write as _};

use super::entry::{Entry, EntryValue};

fn quote(value: &str) -> String {
    // JSON string escaping of a plain string cannot fail.
    serde_json::to_string(value).unwrap_or_default()
}

fn render_value(value: &EntryValue) -> String {
    match value {
        EntryValue::Text(text) => quote(text),
        EntryValue::List(names) => quote(&names.join(",")),
        EntryValue::Properties(table) => quote(&table.encode()),
    }
}

/// Render one entry as a descriptor line, without the trailing newline.
pub fn render_entry(entry: &Entry) -> String {
    let mut line = entry.entry_type().to_string();
    for (param, value) in entry.params() {
        let _ = write!(line, " {}={}", param, render_value(value));
    }
    line
}

/// Render a class descriptor: `primary`, then `auxiliary` entries in reverse
/// discovery order.
pub fn render_descriptor(primary: &Entry, auxiliary: &[Entry]) -> String {
    std::iter::once(primary)
        .chain(auxiliary.iter().rev())
        .fold(String::new(), |mut out, entry| {
            out.push_str(&render_entry(entry));
            out.push('\n');
            out
        })
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_entry(self))
    }
}

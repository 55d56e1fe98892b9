//! `demo` subcommand: sort two small maps, one by key and one by value.

use std::collections::HashMap;

use crate::error::Result;
use crate::mapsort::{sorted, Entry, SortBy};

fn write_section(out: &mut String, title: &str, entries: &[Entry]) {
    out.push_str(&format!("***** Sorted by {} *****\n", title));
    for e in entries {
        out.push_str(&format!("Key: {}, Value: {}\n", e.key, e.value));
    }
}

/// Build the demo output.
pub fn render_demo() -> Result<String> {
    let flames: HashMap<i32, &str> = (0..10).map(|i| (i, "flame emoji")).collect();
    let scores: HashMap<&str, f64> =
        HashMap::from([("a", 9.0), ("f", 7.5), ("k", 12.2), ("b", 10.4), ("z", 2.9)]);

    let mut out = String::new();
    write_section(&mut out, "Key", &sorted(flames, SortBy::Key)?);
    out.push('\n');
    write_section(&mut out, "Value", &sorted(scores, SortBy::Value)?);
    Ok(out)
}

pub fn run_demo() -> Result<()> {
    print!("{}", render_demo()?);
    Ok(())
}

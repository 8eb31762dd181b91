//! Command-line front end: print every string matched by each pattern
//! argument, one per line.
//!
//! Unbounded patterns enumerate a finite but astronomically large space;
//! expect to interrupt `regex-enumerate '.*'` rather than outlive it.

use std::env;
use std::io::{self, Write};
use std::process;

use regex_enumerate::AllStrings;

fn main() {
    let patterns: Vec<String> = env::args().skip(1).collect();
    if patterns.is_empty() {
        eprintln!("usage: regex-enumerate PATTERN [PATTERN ...]");
        process::exit(2);
    }
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for pattern in &patterns {
        let space = match AllStrings::new(pattern) {
            Ok(space) => space,
            Err(err) => {
                eprintln!("{}: {}", pattern, err);
                process::exit(1);
            }
        };
        for member in &space {
            // A closed pipe (e.g. `| head`) is the normal way out.
            if writeln!(out, "{}", member).is_err() {
                return;
            }
        }
    }
}

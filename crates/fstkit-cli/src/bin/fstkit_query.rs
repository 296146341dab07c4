// fstkit-query: Look up keys in an index.
//
// Reads keys from stdin (one per line) and reports membership. Output:
//   F: key value   (found; value is 0 for plain sets)
//   M: key         (missing)
//
// Usage:
//   fstkit-query -i INDEX
//
// Options:
//   -i, --index PATH   Serialized index to query (required)
//   -h, --help         Print help

use std::io::{self, BufRead, Write};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (index, args) = fstkit_cli::parse_value(&args, "--index", "-i");

    if fstkit_cli::wants_help(&args) {
        println!("fstkit-query: Look up keys in an index.");
        println!();
        println!("Usage: fstkit-query -i INDEX");
        println!();
        println!("Reads keys from stdin (one per line). Prints:");
        println!("  F: key value   (found)");
        println!("  M: key         (missing)");
        println!();
        println!("Options:");
        println!("  -i, --index PATH   Serialized index to query (required)");
        println!("  -h, --help         Print this help");
        return;
    }

    let index = match index {
        Some(p) => p,
        None => fstkit_cli::fatal("missing required -i/--index"),
    };
    let fst = fstkit_cli::load_index(&index).unwrap_or_else(|e| fstkit_cli::fatal(&e));

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error reading stdin: {e}");
                break;
            }
        };
        let key = line.trim_end();
        if key.is_empty() {
            continue;
        }
        match fst.get(key) {
            Some(value) => {
                let _ = writeln!(out, "F: {key} {value}");
            }
            None => {
                let _ = writeln!(out, "M: {key}");
            }
        }
    }
}

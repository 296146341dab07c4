// fstkit-grep: List keys of an index matching an anchored regex.
//
// The pattern must match the whole key; wrap it in `.*` for substring
// behavior.
//
// Usage:
//   fstkit-grep -i INDEX PATTERN
//
// Options:
//   -i, --index PATH   Serialized index to search (required)
//   -h, --help         Print help

use std::io::{self, Write};

use fstkit::Regex;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (index, args) = fstkit_cli::parse_value(&args, "--index", "-i");

    if fstkit_cli::wants_help(&args) || args.len() != 1 {
        println!("fstkit-grep: List keys of an index matching an anchored regex.");
        println!();
        println!("Usage: fstkit-grep -i INDEX PATTERN");
        println!();
        println!("The pattern must match the whole key; wrap it in `.*` for");
        println!("substring behavior.");
        println!();
        println!("Options:");
        println!("  -i, --index PATH   Serialized index to search (required)");
        println!("  -h, --help         Print this help");
        return;
    }

    let index = match index {
        Some(p) => p,
        None => fstkit_cli::fatal("missing required -i/--index"),
    };
    let regex = match Regex::new(&args[0]) {
        Ok(r) => r,
        Err(e) => fstkit_cli::fatal(&format!("bad pattern {:?}: {e}", args[0])),
    };
    let fst = fstkit_cli::load_index(&index).unwrap_or_else(|e| fstkit_cli::fatal(&e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut stream = fst.search(regex).into_stream();
    while let Some((key, _)) = stream.next() {
        let _ = writeln!(out, "{}", fstkit_cli::display_key(&key));
    }
}

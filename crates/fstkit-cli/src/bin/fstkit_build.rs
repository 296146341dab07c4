// fstkit-build: Build an index from sorted lines on stdin.
//
// Reads keys from stdin (one per line, already in byte order) and writes a
// serialized index to the given output path. With --map, each line is
// `key<TAB>value` and the value is stored alongside the key.
//
// Usage:
//   fstkit-build [OPTIONS] -o OUTPUT
//
// Options:
//   -o, --output PATH   Where to write the index (required)
//   --map               Parse lines as key<TAB>value pairs
//   -h, --help          Print help

use std::fs::File;
use std::io::{self, BufRead, BufWriter};

use fstkit::Builder;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (output, args) = fstkit_cli::parse_value(&args, "--output", "-o");

    if fstkit_cli::wants_help(&args) {
        println!("fstkit-build: Build an index from sorted lines on stdin.");
        println!();
        println!("Usage: fstkit-build [OPTIONS] -o OUTPUT");
        println!();
        println!("Keys must arrive one per line, in strictly increasing byte order.");
        println!();
        println!("Options:");
        println!("  -o, --output PATH   Where to write the index (required)");
        println!("  --map               Parse lines as key<TAB>value pairs");
        println!("  -h, --help          Print this help");
        return;
    }

    let as_map = args.iter().any(|a| a == "--map");
    let output = match output {
        Some(p) => p,
        None => fstkit_cli::fatal("missing required -o/--output"),
    };

    let file = File::create(&output)
        .unwrap_or_else(|e| fstkit_cli::fatal(&format!("cannot create {output}: {e}")));
    let mut builder = Builder::new(BufWriter::new(file))
        .unwrap_or_else(|e| fstkit_cli::fatal(&format!("cannot start index: {e}")));

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => fstkit_cli::fatal(&format!("error reading stdin: {e}")),
        };
        if line.is_empty() {
            continue;
        }
        let result = if as_map {
            match line.split_once('\t') {
                Some((key, value)) => match value.parse::<u64>() {
                    Ok(value) => builder.insert(key, value),
                    Err(e) => fstkit_cli::fatal(&format!("bad value in line {line:?}: {e}")),
                },
                None => fstkit_cli::fatal(&format!("missing TAB in line {line:?}")),
            }
        } else {
            builder.add(&line)
        };
        if let Err(e) = result {
            fstkit_cli::fatal(&format!("cannot add {line:?}: {e}"));
        }
    }

    let count = builder.len();
    if let Err(e) = builder.finish() {
        fstkit_cli::fatal(&format!("cannot finish index: {e}"));
    }
    eprintln!("{count} keys written to {output}");
}

// fstkit-range: List keys of an index, optionally range-restricted.
//
// Usage:
//   fstkit-range -i INDEX [OPTIONS]
//
// Options:
//   -i, --index PATH   Serialized index to scan (required)
//   --ge KEY           Keys greater than or equal to KEY
//   --gt KEY           Keys strictly greater than KEY
//   --le KEY           Keys less than or equal to KEY
//   --lt KEY           Keys strictly less than KEY
//   --values           Also print each key's value
//   -h, --help         Print help

use std::io::{self, Write};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (index, args) = fstkit_cli::parse_value(&args, "--index", "-i");
    let (ge, args) = fstkit_cli::parse_value(&args, "--ge", "--ge");
    let (gt, args) = fstkit_cli::parse_value(&args, "--gt", "--gt");
    let (le, args) = fstkit_cli::parse_value(&args, "--le", "--le");
    let (lt, args) = fstkit_cli::parse_value(&args, "--lt", "--lt");

    if fstkit_cli::wants_help(&args) {
        println!("fstkit-range: List keys of an index, optionally range-restricted.");
        println!();
        println!("Usage: fstkit-range -i INDEX [OPTIONS]");
        println!();
        println!("Options:");
        println!("  -i, --index PATH   Serialized index to scan (required)");
        println!("  --ge KEY           Keys greater than or equal to KEY");
        println!("  --gt KEY           Keys strictly greater than KEY");
        println!("  --le KEY           Keys less than or equal to KEY");
        println!("  --lt KEY           Keys strictly less than KEY");
        println!("  --values           Also print each key's value");
        println!("  -h, --help         Print this help");
        return;
    }

    let with_values = args.iter().any(|a| a == "--values");
    let index = match index {
        Some(p) => p,
        None => fstkit_cli::fatal("missing required -i/--index"),
    };
    let fst = fstkit_cli::load_index(&index).unwrap_or_else(|e| fstkit_cli::fatal(&e));

    let mut range = fst.range();
    if let Some(bound) = ge {
        range = range.ge(bound);
    }
    if let Some(bound) = gt {
        range = range.gt(bound);
    }
    if let Some(bound) = le {
        range = range.le(bound);
    }
    if let Some(bound) = lt {
        range = range.lt(bound);
    }

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut stream = range.into_stream();
    while let Some((key, value)) = stream.next() {
        let key = fstkit_cli::display_key(&key);
        if with_values {
            let _ = writeln!(out, "{key}\t{value}");
        } else {
            let _ = writeln!(out, "{key}");
        }
    }
}

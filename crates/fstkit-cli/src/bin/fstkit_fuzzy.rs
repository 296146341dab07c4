// fstkit-fuzzy: Find keys within an edit distance of a query.
//
// Usage:
//   fstkit-fuzzy -i INDEX [-d N] QUERY...
//
// Options:
//   -i, --index PATH      Serialized index to search (required)
//   -d, --distance N      Maximum edit distance (default 1)
//   -h, --help            Print help

use std::io::{self, Write};

use fstkit::Levenshtein;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (index, args) = fstkit_cli::parse_value(&args, "--index", "-i");
    let (distance, args) = fstkit_cli::parse_value(&args, "--distance", "-d");

    if fstkit_cli::wants_help(&args) || args.is_empty() {
        println!("fstkit-fuzzy: Find keys within an edit distance of a query.");
        println!();
        println!("Usage: fstkit-fuzzy -i INDEX [-d N] QUERY...");
        println!();
        println!("Options:");
        println!("  -i, --index PATH      Serialized index to search (required)");
        println!("  -d, --distance N      Maximum edit distance (default 1)");
        println!("  -h, --help            Print this help");
        return;
    }

    let index = match index {
        Some(p) => p,
        None => fstkit_cli::fatal("missing required -i/--index"),
    };
    let distance: u32 = match distance {
        Some(d) => match d.parse() {
            Ok(d) => d,
            Err(e) => fstkit_cli::fatal(&format!("bad distance {d:?}: {e}")),
        },
        None => 1,
    };
    let fst = fstkit_cli::load_index(&index).unwrap_or_else(|e| fstkit_cli::fatal(&e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    for query in &args {
        let mut stream = fst
            .search(Levenshtein::new(query, distance))
            .into_stream();
        while let Some((key, _)) = stream.next() {
            let _ = writeln!(out, "{query}: {}", fstkit_cli::display_key(&key));
        }
    }
}

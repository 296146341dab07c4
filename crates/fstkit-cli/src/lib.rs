// fstkit-cli: shared utilities for CLI tools.

use std::process;

use fstkit::Fst;

/// Open a serialized index from `path`, rendering failures as messages
/// suitable for [`fatal`].
pub fn load_index(path: &str) -> Result<Fst, String> {
    Fst::from_path(path).map_err(|e| format!("failed to open index {path}: {e}"))
}

/// Parse a `--flag=VALUE` or `--flag VALUE` / `-f VALUE` argument.
///
/// Returns `(value, remaining_args)`.
pub fn parse_value(args: &[String], long: &str, short: &str) -> (Option<String>, Vec<String>) {
    let prefix = format!("{long}=");
    let mut value = None;
    let mut remaining = Vec::new();
    let mut skip_next = false;

    for (i, arg) in args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if let Some(v) = arg.strip_prefix(&prefix) {
            value = Some(v.to_string());
        } else if arg == long || arg == short {
            if i + 1 < args.len() {
                value = Some(args[i + 1].clone());
                skip_next = true;
            } else {
                eprintln!("error: {arg} requires a value");
                process::exit(1);
            }
        } else {
            remaining.push(arg.clone());
        }
    }

    (value, remaining)
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

/// Render a key for terminal output: UTF-8 where possible, escaped bytes
/// otherwise.
pub fn display_key(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(s) => s.to_string(),
        Err(_) => key.iter().map(|b| format!("\\x{b:02x}")).collect(),
    }
}

//! Output helpers shared by the subcommands.
//!
//! Global flags are published through environment variables by `main`, so
//! any module can check them without threading a context through.

use serde::Serialize;

pub fn is_json() -> bool {
    flag("REELFEED_JSON")
}

pub fn is_quiet() -> bool {
    flag("REELFEED_QUIET")
}

pub fn is_verbose() -> bool {
    flag("REELFEED_VERBOSE")
}

fn flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}

/// Pretty-print any serializable value to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("  Error: could not encode output: {e}"),
    }
}

/// Status glyphs for human-readable output.
pub struct Styled {
    color: bool,
}

impl Styled {
    pub fn new() -> Self {
        Self {
            color: std::env::var_os("NO_COLOR").is_none() && !flag("REELFEED_NO_COLOR"),
        }
    }

    pub fn ok_sym(&self) -> &'static str {
        if self.color {
            "\x1b[32m[OK]\x1b[0m"
        } else {
            "[OK]"
        }
    }

    pub fn warn_sym(&self) -> &'static str {
        if self.color {
            "\x1b[33m[!!]\x1b[0m"
        } else {
            "[!!]"
        }
    }
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

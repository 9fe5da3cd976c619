//! Package heuristics for symbol names as printed by disassemblers.
//!
//! Symbols in disassembly listings differ from the names stored in the
//! pclntab: they carry a leading underscore, import paths may be
//! URL-escaped, and compiler-generated equality and hash helpers wrap the
//! type they were generated for. These rules undo enough of that to group
//! instruction bytes by package.

use percent_encoding::percent_decode_str;

/// Derives the Go package of a disassembler symbol name, or the empty
/// string when the symbol belongs to no package.
pub fn symbol_package(symbol: &str) -> String {
    let stripped = symbol
        .strip_prefix('_')
        .or_else(|| symbol.strip_prefix('<'));
    let mut name = match stripped {
        Some(name) => name,
        None => return String::new(),
    };
    if name.starts_with("go.") {
        return String::new();
    }
    if let Some(rest) = name.strip_prefix("type..eq.[") {
        // Array equality helpers carry the array length before the type.
        match rest.find(']') {
            Some(close) => name = &rest[close + 1..],
            None => return String::new(),
        }
    }
    let name = name.strip_prefix("type..eq.").unwrap_or(name);

    // First dot after the last slash; a later slash cancels an earlier dot.
    let mut dot = None;
    for (i, b) in name.bytes().enumerate() {
        match b {
            b'/' => dot = None,
            b'.' if dot.is_none() => dot = Some(i),
            _ => {}
        }
    }
    let dot = match dot {
        Some(dot) => dot,
        None => return String::new(),
    };
    let name = &name[..dot];
    if name.starts_with("struct {") || name.starts_with('$') {
        return String::new();
    }
    let name = name.strip_prefix("type..hash.").unwrap_or(name);
    if name.starts_with("_cgoexp_") {
        return "cgo-export".to_owned();
    }
    match percent_decode_str(name).decode_utf8() {
        Ok(path) => path.into_owned(),
        Err(_) => name.to_owned(),
    }
}

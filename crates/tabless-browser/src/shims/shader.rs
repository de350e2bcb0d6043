//! WGSL source fixups applied before shader module creation.
//!
//! Browser shader compilers accept a few constructs native naga rejects or
//! that need features the native device does not enable.

use std::borrow::Cow;

/// Rewrites `source` so it compiles natively. Returns the input untouched
/// (borrowed) when nothing applies.
pub fn rewrite_wgsl(source: &str) -> Cow<'_, str> {
    let casts = rewrite_integer_casts(source);
    if let Cow::Owned(stripped) = strip_subgroups_enable(&casts) {
        return Cow::Owned(stripped);
    }
    casts
}

/// `u32( 3.0 )` / `i32(2.)` become `3` / `2`. Only float literals with an
/// all-zero fraction are touched; `i32` additionally accepts a leading minus.
fn rewrite_integer_casts(source: &str) -> Cow<'_, str> {
    let bytes = source.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut i = 0;

    while i + 4 <= bytes.len() {
        let ctor = &bytes[i..i + 4];
        let signed = ctor == b"i32(";
        if !(signed || ctor == b"u32(") || (i > 0 && is_ident_byte(bytes[i - 1])) {
            i += 1;
            continue;
        }

        match match_zero_fraction_literal(&bytes[i + 4..], signed) {
            Some((integer, consumed)) => {
                let buf = out.get_or_insert_with(|| String::with_capacity(source.len()));
                buf.push_str(&source[copied..i]);
                buf.push_str(integer);
                let end = i + 4 + consumed;
                log::trace!("wgsl: {:?} -> {integer}", &source[i..end]);
                copied = end;
                i = end;
            }
            None => i += 4,
        }
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&source[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(source),
    }
}

/// Matches `<ws>[-]digits.0*[f]<ws>)` at the start of `rest` (the text after
/// the opening parenthesis). Returns the integer text and bytes consumed
/// including the closing parenthesis.
fn match_zero_fraction_literal(rest: &[u8], signed: bool) -> Option<(&str, usize)> {
    let mut j = skip_ws(rest, 0);
    let start = j;
    if signed && rest.get(j) == Some(&b'-') {
        j += 1;
    }
    let digits = j;
    while rest.get(j).is_some_and(u8::is_ascii_digit) {
        j += 1;
    }
    if j == digits {
        return None;
    }
    let end_int = j;

    if rest.get(j) != Some(&b'.') {
        return None;
    }
    j += 1;
    while rest.get(j) == Some(&b'0') {
        j += 1;
    }
    if rest.get(j) == Some(&b'f') {
        j += 1;
    }
    j = skip_ws(rest, j);
    if rest.get(j) != Some(&b')') {
        return None;
    }

    let integer = std::str::from_utf8(&rest[start..end_int]).ok()?;
    Some((integer, j + 1))
}

fn skip_ws(s: &[u8], mut i: usize) -> usize {
    while s.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Drops `subgroups` from `enable` directives. A directive left empty becomes
/// a blank line so diagnostics keep their line numbers.
fn strip_subgroups_enable(source: &str) -> Cow<'_, str> {
    if !source.contains("subgroups") {
        return Cow::Borrowed(source);
    }

    let mut changed = false;
    let mut out = String::with_capacity(source.len());
    for line in source.split_inclusive('\n') {
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        match rewrite_enable_line(body) {
            Some(rewritten) => {
                changed = true;
                out.push_str(&rewritten);
            }
            None => out.push_str(body),
        }
        out.push_str(newline);
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(source)
    }
}

fn rewrite_enable_line(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];
    let list = trimmed.strip_prefix("enable")?;
    if !list.starts_with(char::is_whitespace) {
        return None;
    }
    let (list, tail) = list.split_once(';')?;

    let names: Vec<&str> = list
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();
    if !names.contains(&"subgroups") {
        return None;
    }
    let kept: Vec<&str> = names.into_iter().filter(|n| *n != "subgroups").collect();
    log::debug!("wgsl: dropping `subgroups` from enable directive");

    if kept.is_empty() {
        let tail = tail.trim();
        return Some(if tail.is_empty() {
            String::new()
        } else {
            format!("{indent}{tail}")
        });
    }
    Some(format!("{indent}enable {};{tail}", kept.join(", ")))
}

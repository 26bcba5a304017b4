//! URL-safe path derivation.
//!
//! Input directories and files are named by humans: spaces, punctuation,
//! umlauts, the occasional percent sign. Everything we write under the output
//! root — album directories, copied originals, thumbnail files — goes through
//! [`url_safe_path`] first so the generated site has stable, lowercase,
//! ASCII-safe URLs that need no escaping in hrefs.
//!
//! Each `/`-delimited segment is sanitized independently and the segments are
//! rejoined, so an already-split hierarchy maps component-by-component.
//!
//! The function is pure and infallible: malformed input degrades to an
//! underscored form rather than failing. It is also idempotent — feeding a
//! sanitized path back in yields the same path — which matters because
//! relative paths are sanitized once at discovery time and again when joined
//! into thumbnail paths.

/// Sanitize a `/`-separated path into its URL-safe lowercase equivalent.
///
/// Per segment:
/// 1. percent-encode the segment
/// 2. undo the encoding of commas (kept readable in dates like `jan 1, 2023`)
/// 3. `+` becomes `_`
/// 4. every percent entity (two to four hex digits) collapses to `_`
/// 5. spaces become `_`
/// 6. the sequence `_-_` becomes `-`
/// 7. runs of underscores collapse to one
///
/// The rejoined path is lowercased as the final step.
pub fn url_safe_path(input: &str) -> String {
    let out: Vec<String> = input.split('/').map(sanitize_segment).collect();
    out.join("/").to_lowercase()
}

fn sanitize_segment(segment: &str) -> String {
    let encoded = urlencoding::encode(segment)
        .replace("%2C", ",")
        .replace('+', "_");
    let collapsed = collapse_entities(&encoded)
        .replace(' ', "_")
        .replace("_-_", "-");
    collapse_underscores(&collapsed)
}

/// Replace each percent entity (`%` followed by two to four hex digits) with
/// a single underscore. A `%` with fewer than two hex digits after it is kept
/// verbatim.
fn collapse_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'%' {
            let hex_run = bytes[pos + 1..]
                .iter()
                .take(4)
                .take_while(|b| b.is_ascii_hexdigit())
                .count();
            if hex_run >= 2 {
                out.push('_');
                pos += 1 + hex_run;
                continue;
            }
        }
        out.push(bytes[pos] as char);
        pos += 1;
    }

    out
}

/// Collapse runs of two or more underscores into one.
fn collapse_underscores(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_underscore = false;
    for c in s.chars() {
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }
    out
}

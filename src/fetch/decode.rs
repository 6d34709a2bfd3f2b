//! Body decoding.
//!
//! Resolution order:
//! - charset label declared by the server (`Content-Type`, then `<meta>`)
//! - content-based detection when nothing is declared or the declaration is
//!   the ISO-8859-1 default many servers send for every text response
//! - UTF-8 when detection lands on that same single-byte default

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// How many leading bytes are scanned for a `<meta charset>` declaration.
const META_SNIFF_LIMIT: usize = 2048;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_\-:.]+)"#)
        .unwrap_or_else(|e| unreachable!("static regex must compile: {e}"))
});

/// Extract the `charset` parameter of a `Content-Type` header value.
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|value| !value.is_empty())
}

fn charset_from_meta(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(META_SNIFF_LIMIT)];
    let caps = META_CHARSET.captures(head)?;
    let label = caps.get(1)?.as_bytes();
    Some(String::from_utf8_lossy(label).into_owned())
}

/// Single-byte Western defaults that servers attach when they don't know.
fn is_untrusted_default(encoding: &'static Encoding) -> bool {
    encoding == WINDOWS_1252
}

/// Pick the encoding for a response body.
pub fn resolve_encoding(content_type: Option<&str>, body: &[u8]) -> &'static Encoding {
    let declared = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(body))
        .and_then(|label| Encoding::for_label(label.as_bytes()));

    if let Some(encoding) = declared {
        if !is_untrusted_default(encoding) {
            return encoding;
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let guessed = detector.guess(None, true);
    if is_untrusted_default(guessed) {
        UTF_8
    } else {
        guessed
    }
}

/// Decode a response body to text. Malformed sequences become U+FFFD.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> String {
    let encoding = resolve_encoding(content_type, body);
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

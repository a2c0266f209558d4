//! Content-based MIME detection over the leading bytes of an object.
//!
//! Follows the WHATWG MIME sniffing signatures: markup first, then exact and
//! masked binary signatures, then a plain-text check.

/// Only this many leading bytes are ever considered
pub const SNIFF_LEN: usize = 512;

const TEXT_HTML: &str = "text/html; charset=utf-8";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Tags that mark a document as HTML when they open it (after whitespace)
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

const EXACT: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_PLAIN),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"\x00\x00\x02\x00", "image/x-icon"),
    (b"BM", "image/bmp"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"II*\x00", "image/tiff"),
    (b"MM\x00*", "image/tiff"),
    (b"\x1A\x45\xDF\xA3", "video/webm"),
    (b"OggS\x00", "application/ogg"),
    (b"MThd\x00\x00\x00\x06", "audio/midi"),
    (b"ID3", "audio/mpeg"),
    (b"fLaC", "audio/flac"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"PK\x03\x04", "application/zip"),
    (b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    (b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    (b"7z\xBC\xAF\x27\x1C", "application/x-7z-compressed"),
    (b"\x00asm", "application/wasm"),
];

/// Container formats identified by a 4-byte tag at offset 0 and another at offset 8
const CONTAINERS: &[(&[u8; 4], &[u8], &str)] = &[
    (b"RIFF", b"WEBPVP", "image/webp"),
    (b"RIFF", b"WAVE", "audio/wav"),
    (b"RIFF", b"AVI ", "video/x-msvideo"),
    (b"FORM", b"AIFF", "audio/aiff"),
];

/// Detect a MIME type from the first bytes of some content.
///
/// Returns `None` for empty input and for binary data with no known signature.
pub fn sniff(data: &[u8]) -> Option<&'static str> {
    if data.is_empty() {
        return None;
    }
    let data = &data[..data.len().min(SNIFF_LEN)];

    let first_non_ws = data
        .iter()
        .position(|b| !is_whitespace(*b))
        .unwrap_or(data.len());
    let markup = &data[first_non_ws..];

    if HTML_TAGS.iter().any(|tag| opens_with_tag(markup, tag)) {
        return Some(TEXT_HTML);
    }
    if markup.starts_with(b"<?xml") {
        return Some("text/xml; charset=utf-8");
    }

    if let Some((_, mime)) = EXACT.iter().find(|(sig, _)| data.starts_with(sig)) {
        return Some(*mime);
    }

    for (outer, inner, mime) in CONTAINERS {
        if data.len() >= 8 + inner.len()
            && data.starts_with(*outer)
            && &data[8..8 + inner.len()] == *inner
        {
            return Some(*mime);
        }
    }

    if is_mp4(data) {
        return Some("video/mp4");
    }

    if markup.iter().all(|b| !is_binary(*b)) {
        return Some(TEXT_PLAIN);
    }

    None
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0C | b'\r' | b' ')
}

fn is_binary(b: u8) -> bool {
    b <= 0x08 || b == 0x0B || (0x0E..=0x1A).contains(&b) || (0x1C..=0x1F).contains(&b)
}

/// Case-insensitive tag match that must be followed by a space or `>`
fn opens_with_tag(data: &[u8], tag: &[u8]) -> bool {
    if data.len() <= tag.len() {
        return false;
    }
    let matches = data
        .iter()
        .zip(tag)
        .all(|(d, t)| d.to_ascii_uppercase() == *t);
    matches && matches!(data[tag.len()], b' ' | b'>')
}

/// ISO base media file: `ftyp` box whose brands include `mp4`
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if box_size < 12 || data.len() < box_size || box_size % 4 != 0 {
        return false;
    }
    if &data[4..8] != b"ftyp" {
        return false;
    }
    // Offset 12 holds the minor version, not a brand
    (8..box_size)
        .step_by(4)
        .filter(|offset| *offset != 12)
        .any(|offset| &data[offset..offset + 3] == b"mp4")
}

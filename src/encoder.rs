//! Data URI encoder
//!
//! Turns a binary payload and its content type into a self-describing
//! `data:<content-type>;base64,<payload>` string. The base-64 step works on
//! the raw bytes directly (standard RFC 4648 alphabet, `=` padding, no line
//! wrapping) so arbitrary binary bodies survive unchanged.

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

pub const DATA_URI_SCHEME: &str = "data:";
pub const BASE64_MARKER: &str = ";base64,";

/// Encode `buffer` as a base-64 data URI tagged with `content_type`.
pub fn encode(content_type: &str, buffer: &[u8]) -> String {
    let mut text = String::with_capacity(
        DATA_URI_SCHEME.len() + content_type.len() + BASE64_MARKER.len() + encoded_len(buffer.len()),
    );
    text.push_str(DATA_URI_SCHEME);
    text.push_str(content_type);
    text.push_str(BASE64_MARKER);
    push_base64(&mut text, buffer);
    text
}

/// Standard base-64 of `buffer` without the data URI prefix.
pub fn encode_raw(buffer: &[u8]) -> String {
    let mut text = String::with_capacity(encoded_len(buffer.len()));
    push_base64(&mut text, buffer);
    text
}

/// Length of the base-64 text for `len` input bytes: `ceil(len / 3) * 4`.
pub const fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

fn push_base64(text: &mut String, buffer: &[u8]) {
    let sextet = |v: u32, shift: u32| BASE64_ALPHABET[((v >> shift) & 63) as usize] as char;

    let mut groups = buffer.chunks_exact(3);
    for group in &mut groups {
        let v = (u32::from(group[0]) << 16) | (u32::from(group[1]) << 8) | u32::from(group[2]);
        text.push(sextet(v, 18));
        text.push(sextet(v, 12));
        text.push(sextet(v, 6));
        text.push(sextet(v, 0));
    }

    match *groups.remainder() {
        [a] => {
            let v = u32::from(a) << 16;
            text.push(sextet(v, 18));
            text.push(sextet(v, 12));
            text.push_str("==");
        }
        [a, b] => {
            let v = (u32::from(a) << 16) | (u32::from(b) << 8);
            text.push(sextet(v, 18));
            text.push(sextet(v, 12));
            text.push(sextet(v, 6));
            text.push('=');
        }
        _ => {}
    }
}

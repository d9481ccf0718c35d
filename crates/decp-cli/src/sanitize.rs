//! Streaming repair of downloaded feeds.
//!
//! Some publishers emit `NaN` for missing numbers, which is not JSON. The
//! scrubber rewrites it to `null` outside string literals and leaves string
//! contents alone. Bytes that are not valid UTF-8 are dropped first. It keeps
//! its state between chunks, so a token or a character split across two
//! network reads is still recognized.

use decp_db::import::Utf8Filter;

const NAN: &[u8] = b"NaN";
const NULL: &[u8] = b"null";

#[derive(Debug, Default)]
pub struct NanScrubber {
    in_string: bool,
    escaped: bool,
    /// Bytes of `NaN` matched so far outside a string.
    pending: usize,
    utf8: Utf8Filter,
    decoded: Vec<u8>,
}

impl NanScrubber {
    /// Append the scrubbed form of `input` to `out`.
    pub fn feed(&mut self, input: &[u8], out: &mut Vec<u8>) {
        let mut decoded = std::mem::take(&mut self.decoded);
        decoded.clear();
        self.utf8.feed(input, &mut decoded);
        self.scrub(&decoded, out);
        self.decoded = decoded;
    }

    /// Flush a partial match left at the end of the input.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        self.utf8.finish();
        out.extend_from_slice(&NAN[..self.pending]);
        self.pending = 0;
    }

    /// Bytes dropped for not being valid UTF-8.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.utf8.dropped()
    }

    fn scrub(&mut self, input: &[u8], out: &mut Vec<u8>) {
        out.reserve(input.len());
        for &byte in input {
            if self.in_string {
                out.push(byte);
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            if self.pending > 0 {
                if byte == NAN[self.pending] {
                    self.pending += 1;
                    if self.pending == NAN.len() {
                        out.extend_from_slice(NULL);
                        self.pending = 0;
                    }
                    continue;
                }
                out.extend_from_slice(&NAN[..self.pending]);
                self.pending = 0;
            }

            match byte {
                b'"' => {
                    self.in_string = true;
                    out.push(byte);
                }
                b'N' => self.pending = 1,
                _ => out.push(byte),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scrub_bytes(chunks: &[&[u8]]) -> (String, u64) {
        let mut scrubber = NanScrubber::default();
        let mut out = Vec::new();
        for chunk in chunks {
            scrubber.feed(chunk, &mut out);
        }
        scrubber.finish(&mut out);
        (String::from_utf8(out).unwrap(), scrubber.dropped())
    }

    fn scrub_chunks(chunks: &[&str]) -> String {
        let bytes: Vec<&[u8]> = chunks.iter().map(|c| c.as_bytes()).collect();
        scrub_bytes(&bytes).0
    }

    #[test]
    fn bare_nan_becomes_null() {
        assert_eq!(
            scrub_chunks(&[r#"{"montant": NaN, "tauxAvance":NaN}"#]),
            r#"{"montant": null, "tauxAvance":null}"#
        );
    }

    #[test]
    fn strings_are_untouched() {
        let text = r#"{"objet": "NaN et \"NaN\" restent", "id": "N"}"#;
        assert_eq!(scrub_chunks(&[text]), text);
    }

    #[test]
    fn token_split_across_chunks() {
        assert_eq!(scrub_chunks(&["[1, N", "a", "N, 2]"]), "[1, null, 2]");
        assert_eq!(scrub_chunks(&[r#"{"a": "x\"#, r#"" NaN"}"#]), r#"{"a": "x\" NaN"}"#);
    }

    #[test]
    fn partial_match_is_restored() {
        assert_eq!(scrub_chunks(&["[Na, Nb]"]), "[Na, Nb]");
        assert_eq!(scrub_chunks(&["[1, Na"]), "[1, Na");
    }

    #[test]
    fn nested_nan_prefix() {
        assert_eq!(scrub_chunks(&["NNaN"]), "Nnull");
    }

    #[test]
    fn invalid_utf8_is_dropped_across_chunks() {
        assert_eq!(
            scrub_bytes(&[b"{\"objet\": \"bad\xE9", b"byte\", \"montant\": N", b"aN}"]),
            (r#"{"objet": "badbyte", "montant": null}"#.to_string(), 1)
        );
    }

    #[test]
    fn split_character_survives() {
        assert_eq!(
            scrub_bytes(&[b"{\"objet\": \"caf\xC3", b"\xA9\", \"n\": NaN}"]),
            (r#"{"objet": "café", "n": null}"#.to_string(), 0)
        );
    }
}

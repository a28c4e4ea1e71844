//! Character encoding detection and transcoding to UTF-8.
//!
//! Detection looks at a fixed window at the start of a file: byte order
//! marks first, then a zero-byte heuristic for UTF-16, then UTF-8
//! validity. Anything else is scored against the 8-bit candidates.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use encoding_rs::{Decoder, MACINTOSH, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};

use crate::error::{IngestError, Result};

/// Default number of bytes inspected for detection.
pub const DEFAULT_SNIFF_WINDOW: usize = 8 * 1024;

const UNDEFINED_PENALTY: i64 = 100;

/// Characters common in the checklist corpus, used to reward a candidate.
const COMMON_CHARS: &str = "äåáàæœčéèêëïñøöüßšžÄÅÁÀÆŒČÉÈÊËÏÑØÖÜŠŽ";

/// Supported character encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    Utf8,
    Utf16Be,
    Utf16Le,
    Utf32Be,
    Utf32Le,
    Latin1,
    Windows1252,
    MacRoman,
}

impl Charset {
    /// 8-bit candidates in tie-break order.
    const EIGHT_BIT: [Charset; 3] = [Charset::Latin1, Charset::Windows1252, Charset::MacRoman];

    pub fn as_str(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Utf32Be => "UTF-32BE",
            Charset::Utf32Le => "UTF-32LE",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Windows1252 => "windows-1252",
            Charset::MacRoman => "macintosh",
        }
    }

    fn is_undefined(&self, byte: u8) -> bool {
        match self {
            Charset::Latin1 => (0x80..=0x9F).contains(&byte),
            Charset::Windows1252 => matches!(byte, 0x81 | 0x8D | 0x8F | 0x90 | 0x9D),
            _ => false,
        }
    }

    /// Decodes a single high byte of an 8-bit charset.
    fn decode_high_byte(&self, byte: u8) -> Option<char> {
        let encoding = match self {
            Charset::Latin1 => return Some(char::from(byte)),
            Charset::Windows1252 => WINDOWS_1252,
            Charset::MacRoman => MACINTOSH,
            _ => return None,
        };
        let bytes = [byte];
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes);
        decoded.chars().next()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detects the charset of a file from its first `window` bytes.
pub fn detect_charset(path: &Path, window: usize) -> Result<Charset> {
    let file = File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut buffer = Vec::with_capacity(window);
    file.take(window as u64)
        .read_to_end(&mut buffer)
        .map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(detect_charset_bytes(&buffer))
}

/// Detects the charset of a byte window.
pub fn detect_charset_bytes(bytes: &[u8]) -> Charset {
    if bytes.len() < 2 {
        return Charset::Latin1;
    }
    if let Some(charset) = charset_from_bom(bytes) {
        return charset;
    }
    if let Some(charset) = utf16_by_zero_bytes(bytes) {
        return charset;
    }
    if is_valid_utf8(bytes) {
        return Charset::Utf8;
    }
    best_eight_bit(bytes)
}

fn charset_from_bom(bytes: &[u8]) -> Option<Charset> {
    if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        Some(Charset::Utf32Be)
    } else if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        Some(Charset::Utf32Le)
    } else if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some(Charset::Utf8)
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        Some(Charset::Utf16Be)
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        Some(Charset::Utf16Le)
    } else {
        None
    }
}

/// ASCII text in UTF-16 has a zero byte in every other position.
fn utf16_by_zero_bytes(bytes: &[u8]) -> Option<Charset> {
    let threshold = bytes.len() / 10;
    let (mut even, mut odd) = (0usize, 0usize);
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == 0 {
            if idx % 2 == 0 {
                even += 1;
            } else {
                odd += 1;
            }
        }
    }
    if (even > threshold || odd > threshold) && even.abs_diff(odd) > threshold {
        Some(if even > odd {
            Charset::Utf16Be
        } else {
            Charset::Utf16Le
        })
    } else {
        None
    }
}

/// A multi-byte sequence cut off by the end of the window still counts as valid.
fn is_valid_utf8(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(err) => err.error_len().is_none(),
    }
}

fn best_eight_bit(bytes: &[u8]) -> Charset {
    let mut best = Charset::Latin1;
    let mut best_penalty = i64::MAX;
    for charset in Charset::EIGHT_BIT {
        let penalty = eight_bit_penalty(charset, bytes);
        tracing::trace!(charset = %charset, penalty, "scored 8-bit candidate");
        if penalty < best_penalty {
            best = charset;
            best_penalty = penalty;
        }
    }
    best
}

fn eight_bit_penalty(charset: Charset, bytes: &[u8]) -> i64 {
    let mut penalty = 0i64;
    for byte in bytes.iter().copied().filter(|b| *b >= 0x80) {
        if charset.is_undefined(byte) {
            penalty += UNDEFINED_PENALTY;
        } else if charset
            .decode_high_byte(byte)
            .is_some_and(|c| COMMON_CHARS.contains(c))
        {
            penalty -= 1;
        }
    }
    penalty
}

/// Opens a file and transcodes its content to UTF-8.
pub fn open_decoded(path: &Path, charset: Charset) -> Result<DecodingReader<File>> {
    let file = File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(DecodingReader::new(file, charset))
}

enum TextDecoder {
    Encoding(Decoder),
    Latin1,
    Utf32 { big_endian: bool, bom_checked: bool },
}

/// A reader yielding UTF-8 bytes from input in any supported charset.
///
/// Byte order marks are stripped and malformed input is replaced with
/// U+FFFD, so downstream parsers always see valid UTF-8.
pub struct DecodingReader<R> {
    inner: R,
    decoder: TextDecoder,
    chunk: Box<[u8]>,
    pending: Vec<u8>,
    output: Vec<u8>,
    pos: usize,
    finished: bool,
}

impl<R: Read> DecodingReader<R> {
    pub fn new(inner: R, charset: Charset) -> Self {
        let decoder = match charset {
            Charset::Utf8 => TextDecoder::Encoding(UTF_8.new_decoder_with_bom_removal()),
            Charset::Utf16Be => TextDecoder::Encoding(UTF_16BE.new_decoder_with_bom_removal()),
            Charset::Utf16Le => TextDecoder::Encoding(UTF_16LE.new_decoder_with_bom_removal()),
            Charset::Windows1252 => {
                TextDecoder::Encoding(WINDOWS_1252.new_decoder_without_bom_handling())
            }
            Charset::MacRoman => TextDecoder::Encoding(MACINTOSH.new_decoder_without_bom_handling()),
            Charset::Latin1 => TextDecoder::Latin1,
            Charset::Utf32Be => TextDecoder::Utf32 {
                big_endian: true,
                bom_checked: false,
            },
            Charset::Utf32Le => TextDecoder::Utf32 {
                big_endian: false,
                bom_checked: false,
            },
        };
        Self {
            inner,
            decoder,
            chunk: vec![0u8; DEFAULT_SNIFF_WINDOW].into_boxed_slice(),
            pending: Vec::new(),
            output: Vec::new(),
            pos: 0,
            finished: false,
        }
    }

    fn read_chunk(&mut self) -> io::Result<usize> {
        loop {
            match self.inner.read(&mut self.chunk) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                other => return other,
            }
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        self.output.clear();
        self.pos = 0;
        let read = self.read_chunk()?;
        let last = read == 0;
        let input = &self.chunk[..read];
        match &mut self.decoder {
            TextDecoder::Encoding(decoder) => {
                let needed = decoder
                    .max_utf8_buffer_length(read)
                    .ok_or_else(|| io::Error::other("decode buffer size overflow"))?;
                self.output.resize(needed, 0);
                let (_, consumed, written, _) =
                    decoder.decode_to_utf8(input, &mut self.output, last);
                debug_assert_eq!(consumed, read);
                self.output.truncate(written);
            }
            TextDecoder::Latin1 => {
                let text: String = input.iter().copied().map(char::from).collect();
                self.output = text.into_bytes();
            }
            TextDecoder::Utf32 {
                big_endian,
                bom_checked,
            } => {
                self.pending.extend_from_slice(input);
                if !*bom_checked && (self.pending.len() >= 4 || last) {
                    let bom: [u8; 4] = if *big_endian {
                        [0x00, 0x00, 0xFE, 0xFF]
                    } else {
                        [0xFF, 0xFE, 0x00, 0x00]
                    };
                    if self.pending.starts_with(&bom) {
                        self.pending.drain(..4);
                    }
                    *bom_checked = true;
                }
                if *bom_checked {
                    let whole = self.pending.len() / 4 * 4;
                    let mut text = String::with_capacity(whole / 4);
                    for unit in self.pending[..whole].chunks_exact(4) {
                        let bytes = [unit[0], unit[1], unit[2], unit[3]];
                        let code = if *big_endian {
                            u32::from_be_bytes(bytes)
                        } else {
                            u32::from_le_bytes(bytes)
                        };
                        text.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    self.pending.drain(..whole);
                    if last && !self.pending.is_empty() {
                        text.push(char::REPLACEMENT_CHARACTER);
                        self.pending.clear();
                    }
                    self.output = text.into_bytes();
                }
            }
        }
        if last {
            self.finished = true;
        }
        Ok(())
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.output.len() {
            if self.finished {
                return Ok(0);
            }
            self.fill()?;
        }
        let available = &self.output[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8], charset: Charset) -> String {
        let mut reader = DecodingReader::new(bytes, charset);
        let mut out = String::new();
        reader.read_to_string(&mut out).expect("decode");
        out
    }

    #[test]
    fn test_detect_boms() {
        assert_eq!(detect_charset_bytes(b"\xEF\xBB\xBFID,Genus"), Charset::Utf8);
        assert_eq!(detect_charset_bytes(b"\xFE\xFF\x00I"), Charset::Utf16Be);
        assert_eq!(detect_charset_bytes(b"\xFF\xFEI\x00"), Charset::Utf16Le);
        assert_eq!(
            detect_charset_bytes(b"\xFF\xFE\x00\x00I\x00\x00\x00"),
            Charset::Utf32Le
        );
        assert_eq!(
            detect_charset_bytes(b"\x00\x00\xFE\xFF\x00\x00\x00I"),
            Charset::Utf32Be
        );
    }

    #[test]
    fn test_detect_utf16_without_bom() {
        let bytes: Vec<u8> = "ID\tGenus\n1\tAbies\n"
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        assert_eq!(detect_charset_bytes(&bytes), Charset::Utf16Le);
    }

    #[test]
    fn test_detect_utf8_and_short_input() {
        assert_eq!(detect_charset_bytes("Müller".as_bytes()), Charset::Utf8);
        assert_eq!(detect_charset_bytes(b"a"), Charset::Latin1);
        // truncated two-byte sequence at the end of the window
        assert_eq!(detect_charset_bytes(b"Genus \xC3"), Charset::Utf8);
    }

    #[test]
    fn test_detect_windows_1252_over_latin1() {
        // 0x80 (euro sign) is undefined in Latin-1 but defined in windows-1252
        let bytes = b"price \x80 M\xFCller";
        assert_eq!(detect_charset_bytes(bytes), Charset::Windows1252);
    }

    #[test]
    fn test_detect_latin1_default() {
        let bytes = b"M\xFCller \xE9t\xE9";
        assert_eq!(detect_charset_bytes(bytes), Charset::Latin1);
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode_all(b"M\xFCller", Charset::Latin1), "Müller");
    }

    #[test]
    fn test_decode_utf16_strips_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("Abies".encode_utf16().flat_map(u16::to_le_bytes));
        assert_eq!(decode_all(&bytes, Charset::Utf16Le), "Abies");
    }

    #[test]
    fn test_decode_utf32() {
        let mut bytes = vec![0x00, 0x00, 0xFE, 0xFF];
        bytes.extend("Zö".chars().flat_map(|c| (c as u32).to_be_bytes()));
        assert_eq!(decode_all(&bytes, Charset::Utf32Be), "Zö");
    }

    #[test]
    fn test_decode_utf8_bom_removed() {
        assert_eq!(decode_all(b"\xEF\xBB\xBFID", Charset::Utf8), "ID");
    }
}

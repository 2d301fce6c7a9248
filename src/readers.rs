use encoding_rs::Encoding;
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Read buffer for source files
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Line reader that transcodes a legacy single-byte encoding to UTF-8.
///
/// A UTF-8 or UTF-16 byte-order mark overrides the configured encoding and
/// is stripped. Bytes the encoding cannot map come out as U+FFFD, so reading
/// only fails on I/O errors.
pub struct SourceLineReader<R: Read> {
    inner: BufReader<DecodeReaderBytes<R, Vec<u8>>>,
    line: Vec<u8>,
    line_num: usize,
    /// Previous line ended with `\r`; a `\n` right after it belongs to it
    skip_lf: bool,
}

impl SourceLineReader<File> {
    /// Open a file for sequential reading
    pub fn open(path: &Path, encoding: &'static Encoding) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file, encoding))
    }
}

impl<R: Read> SourceLineReader<R> {
    pub fn new(reader: R, encoding: &'static Encoding) -> Self {
        let decoder = DecodeReaderBytesBuilder::new()
            .encoding(Some(encoding))
            .bom_override(true)
            .strip_bom(true)
            .build(reader);

        Self {
            inner: BufReader::with_capacity(READ_BUFFER_SIZE, decoder),
            line: Vec::new(),
            line_num: 0,
            skip_lf: false,
        }
    }

    /// Number of lines returned so far
    pub fn line_num(&self) -> usize {
        self.line_num
    }

    /// Read the next line into `buf` without its terminator. A line ends at
    /// `\n`, `\r\n` or a lone `\r`. Returns `Ok(false)` at end of input.
    pub fn read_line(&mut self, buf: &mut String) -> io::Result<bool> {
        buf.clear();
        self.line.clear();
        let mut seen = false;

        loop {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }

            if self.skip_lf {
                self.skip_lf = false;
                if available[0] == b'\n' {
                    self.inner.consume(1);
                    continue;
                }
            }

            seen = true;
            // decoded text is UTF-8, so CR and LF never occur inside a char
            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(pos) => {
                    self.skip_lf = available[pos] == b'\r';
                    self.line.extend_from_slice(&available[..pos]);
                    self.inner.consume(pos + 1);
                    break;
                }
                None => {
                    let len = available.len();
                    self.line.extend_from_slice(available);
                    self.inner.consume(len);
                }
            }
        }

        if !seen {
            return Ok(false);
        }

        let text = std::str::from_utf8(&self.line)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        buf.push_str(text);
        self.line_num += 1;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1251;
    use std::io::Cursor;

    fn read_all<R: Read>(mut reader: SourceLineReader<R>) -> Vec<String> {
        let mut lines = Vec::new();
        let mut buf = String::new();
        while reader.read_line(&mut buf).unwrap() {
            lines.push(buf.clone());
        }
        lines
    }

    #[test]
    fn decodes_windows_1251() {
        // "Привет" in windows-1251
        let bytes = b"20240101;0800;\xcf\xf0\xe8\xe2\xe5\xf2\r\nsecond".to_vec();
        let reader = SourceLineReader::new(Cursor::new(bytes), WINDOWS_1251);
        assert_eq!(read_all(reader), vec!["20240101;0800;Привет", "second"]);
    }

    #[test]
    fn utf8_bom_overrides_legacy_encoding() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice("20240101;0800;Привет\n".as_bytes());
        let reader = SourceLineReader::new(Cursor::new(bytes), WINDOWS_1251);
        assert_eq!(read_all(reader), vec!["20240101;0800;Привет"]);
    }

    #[test]
    fn utf16_bom_is_detected() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "20240101;0900;y\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let reader = SourceLineReader::new(Cursor::new(bytes), WINDOWS_1251);
        assert_eq!(read_all(reader), vec!["20240101;0900;y"]);
    }

    #[test]
    fn keeps_control_bytes_and_counts_lines() {
        let bytes = b"a\x01b\n\nc".to_vec();
        let mut reader = SourceLineReader::new(Cursor::new(bytes), WINDOWS_1251);
        let mut buf = String::new();

        assert!(reader.read_line(&mut buf).unwrap());
        assert_eq!(buf, "a\u{1}b");
        assert!(reader.read_line(&mut buf).unwrap());
        assert_eq!(buf, "");
        assert!(reader.read_line(&mut buf).unwrap());
        assert_eq!(buf, "c");
        assert!(!reader.read_line(&mut buf).unwrap());
        assert_eq!(reader.line_num(), 3);
    }

    #[test]
    fn lone_carriage_return_ends_a_line() {
        let bytes = b"20240101;0800;a\r20240102;0900;b\n".to_vec();
        let reader = SourceLineReader::new(Cursor::new(bytes), WINDOWS_1251);
        assert_eq!(read_all(reader), vec!["20240101;0800;a", "20240102;0900;b"]);
    }

    #[test]
    fn mixed_terminators_and_blank_lines() {
        let bytes = b"a\r\nb\rc\n\r\nd\r".to_vec();
        let reader = SourceLineReader::new(Cursor::new(bytes), WINDOWS_1251);
        assert_eq!(read_all(reader), vec!["a", "b", "c", "", "d"]);
    }

    #[test]
    fn crlf_split_across_reads_is_one_terminator() {
        // one byte per read forces the CR and LF into separate buffers
        struct Trickle(Cursor<Vec<u8>>);
        impl Read for Trickle {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                let end = buf.len().min(1);
                self.0.read(&mut buf[..end])
            }
        }

        let bytes = "x;\u{44f}\r\ny\r\n".as_bytes().to_vec();
        let reader = SourceLineReader::new(Trickle(Cursor::new(bytes)), encoding_rs::UTF_8);
        assert_eq!(read_all(reader), vec!["x;\u{44f}", "y"]);
    }
}

//! Packet data files for the injector.
//!
//! Whitespace-separated hex octets; a `#` starts a comment running to the
//! end of the line. Runs of digits are split into pairs, so `8700` and
//! `87 00` read the same.

use crate::error::{NdError, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read packet bytes from `path`, or from stdin when `path` is `-`
pub fn read_path(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        return read_hex_values(io::stdin().lock());
    }
    read_hex_values(BufReader::new(File::open(path)?))
}

/// Parse hex octets from `reader`
pub fn read_hex_values<R: BufRead>(reader: R) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let data = match line.split_once('#') {
            Some((data, _comment)) => data,
            None => line.as_str(),
        };

        for token in data.split_whitespace() {
            let invalid = || NdError::InvalidHex {
                line: lineno + 1,
                token: token.to_string(),
            };
            if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            for pair in token.as_bytes().chunks(2) {
                let digits = std::str::from_utf8(pair).map_err(|_| invalid())?;
                bytes.push(u8::from_str_radix(digits, 16).map_err(|_| invalid())?);
            }
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_pairs_and_comments() {
        let input = "# neighbor solicit\n87 00 0000 # type, code, checksum\n\n00000000\n";
        let bytes = read_hex_values(Cursor::new(input)).unwrap();
        assert_eq!(bytes, vec![0x87, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_odd_digit_run() {
        let bytes = read_hex_values(Cursor::new("abc")).unwrap();
        assert_eq!(bytes, vec![0xab, 0x0c]);
    }

    #[test]
    fn test_invalid_token_reports_line() {
        let err = read_hex_values(Cursor::new("87\nzz\n")).unwrap_err();
        match err {
            NdError::InvalidHex { line, token } => {
                assert_eq!(line, 2);
                assert_eq!(token, "zz");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "87 00 00 00").unwrap();
        let bytes = read_path(file.path()).unwrap();
        assert_eq!(bytes, vec![0x87, 0, 0, 0]);
    }

    #[test]
    fn test_missing_file() {
        let err = read_path(Path::new("/nonexistent/ns.hex")).unwrap_err();
        assert!(matches!(err, NdError::Io(_)));
    }
}

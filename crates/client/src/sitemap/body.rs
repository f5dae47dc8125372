//! Turning fetched bytes into text.

use std::io::Read;

use flate2::read::GzDecoder;
use sitemap_core::Error;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decode a sitemap body: gunzip if the gzip magic bytes are present, strip
/// a UTF-8 BOM and replace invalid UTF-8.
///
/// Decompressed output is bounded by `max_bytes`.
pub fn decode_body(bytes: &[u8], max_bytes: usize) -> Result<String, Error> {
    let raw = if bytes.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(bytes)
            .take(max_bytes as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|e| Error::ParseFailed(format!("gzip decompression failed: {e}")))?;
        if out.len() > max_bytes {
            return Err(Error::FetchTooLarge(format!("decompressed body exceeds {max_bytes} bytes")));
        }
        out
    } else {
        bytes.to_vec()
    };

    let text = String::from_utf8(raw).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_plain_body() {
        assert_eq!(decode_body(b"<urlset/>", 1024).unwrap(), "<urlset/>");
    }

    #[test]
    fn test_gzip_body() {
        let compressed = gzip(b"https://example.com/a\n");
        assert_eq!(decode_body(&compressed, 1024).unwrap(), "https://example.com/a\n");
    }

    #[test]
    fn test_gzip_bomb_is_bounded() {
        let compressed = gzip(&vec![b'a'; 10_000]);
        let result = decode_body(&compressed, 1000);
        assert!(matches!(result, Err(Error::FetchTooLarge(_))));
    }

    #[test]
    fn test_corrupt_gzip() {
        let result = decode_body(&[0x1f, 0x8b, 0x08, 0x00, 0xde, 0xad], 1024);
        assert!(matches!(result, Err(Error::ParseFailed(_))));
    }

    #[test]
    fn test_bom_and_invalid_utf8() {
        assert_eq!(decode_body("\u{feff}<urlset/>".as_bytes(), 1024).unwrap(), "<urlset/>");
        assert_eq!(decode_body(b"caf\xe9", 1024).unwrap(), "caf\u{fffd}");
    }
}

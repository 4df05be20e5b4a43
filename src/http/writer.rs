use crate::http::headers::HeaderMap;
use crate::http::status::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes the status line and header block, including the blank line
/// separating it from the body.
pub fn serialize_head(status: StatusCode, headers: &HeaderMap) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        status.as_u16(),
        status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // One line per value
    for (k, values) in headers {
        for v in values {
            buf.extend_from_slice(k.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(v.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_repeated_header() {
        let mut headers = HeaderMap::new();
        headers.set("Content-Length", "3");
        headers.append("Set-Cookie", "a=1");
        headers.append("Set-Cookie", "b=2");

        let head = serialize_head(StatusCode::NOT_FOUND, &headers);

        assert_eq!(
            String::from_utf8(head).unwrap(),
            "HTTP/1.1 404 Not Found\r\nContent-Length: 3\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n\r\n"
        );
    }
}

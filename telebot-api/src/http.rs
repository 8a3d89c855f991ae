//! HTTP/1.1 framing for single-shot `Connection: close` exchanges. Requests are written
//! directly; response heads and chunk sizes are parsed with `httparse`.

use telebot_core::{BotError, Result};

const HEADER_END: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Serializes one request. `POST` carries `body` as a form-encoded payload; `GET` ignores it.
pub fn encode_request(method: HttpMethod, host: &str, path: &str, body: &str) -> Vec<u8> {
    let mut req = match method {
        HttpMethod::Get => format!("GET {} HTTP/1.1\r\nHost: {}\r\n", path, host),
        HttpMethod::Post => format!(
            "POST {} HTTP/1.1\r\nHost: {}\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: {}\r\n",
            path,
            host,
            body.len()
        ),
    };
    req.push_str("Connection: close\r\n\r\n");
    if method == HttpMethod::Post {
        req.push_str(body);
    }
    req.into_bytes()
}

/// A parsed response: status code and de-framed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

const MAX_HEADERS: usize = 32;

struct Head {
    status: u16,
    content_length: Option<usize>,
    chunked: bool,
    /// Offset of the first body byte.
    len: usize,
}

/// Parses the status line and headers. `Ok(None)` while the header block is still incomplete.
fn parse_head(raw: &[u8]) -> Result<Option<Head>> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut headers);
    let len = match response.parse(raw) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(e) => return Err(BotError::protocol(format!("bad response head: {}", e))),
    };

    let mut content_length = None;
    let mut chunked = false;
    for header in response.headers.iter() {
        let value = String::from_utf8_lossy(header.value);
        if header.name.eq_ignore_ascii_case("content-length") {
            content_length = value.trim().parse().ok();
        } else if header.name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value.to_ascii_lowercase().contains("chunked");
        }
    }

    Ok(Some(Head {
        status: response.code.unwrap_or_default(),
        content_length,
        chunked,
        len,
    }))
}

/// True once `raw` holds a complete response according to its framing headers.
/// Responses without `Content-Length` or chunked framing are complete only at EOF.
/// Malformed framing counts as complete: more bytes cannot repair it.
pub fn is_complete(raw: &[u8]) -> bool {
    let head = match parse_head(raw) {
        Ok(Some(head)) => head,
        Ok(None) => return false,
        Err(_) => return true,
    };
    let body = &raw[head.len..];
    if head.chunked {
        return dechunk(body).map_or(true, |(_, done)| done);
    }
    match head.content_length {
        Some(len) => body.len() >= len,
        None => false,
    }
}

/// Splits headers from body, de-chunks when needed and truncates the body to `max_body`.
pub fn parse_response(raw: &[u8], max_body: usize) -> Result<HttpResponse> {
    let head = parse_head(raw)?.ok_or_else(|| BotError::protocol("incomplete response head"))?;
    let raw_body = &raw[head.len..];
    let mut body = if head.chunked {
        dechunk(raw_body)?.0
    } else {
        match head.content_length {
            Some(len) if len < raw_body.len() => raw_body[..len].to_vec(),
            _ => raw_body.to_vec(),
        }
    };
    body.truncate(max_body);
    Ok(HttpResponse {
        status: head.status,
        body,
    })
}

/// Walks chunked framing. Returns the payload received so far and whether the terminating
/// zero-size chunk and its closing empty line have arrived.
fn dechunk(mut data: &[u8]) -> Result<(Vec<u8>, bool)> {
    let mut out = Vec::with_capacity(data.len());
    loop {
        let (consumed, size) = match httparse::parse_chunk_size(data) {
            Ok(httparse::Status::Complete(parsed)) => parsed,
            Ok(httparse::Status::Partial) => return Ok((out, false)),
            Err(_) => return Err(BotError::protocol("bad chunk size line")),
        };
        data = &data[consumed..];
        if size == 0 {
            let done = data.starts_with(b"\r\n") || find(data, HEADER_END).is_some();
            return Ok((out, done));
        }

        let size = usize::try_from(size).map_err(|_| BotError::protocol("chunk too large"))?;
        if data.len() < size {
            out.extend_from_slice(data);
            return Ok((out, false));
        }
        out.extend_from_slice(&data[..size]);
        data = &data[size..];
        if data.len() < 2 {
            return Ok((out, false));
        }
        data = data
            .strip_prefix(b"\r\n")
            .ok_or_else(|| BotError::protocol("chunk not terminated by CRLF"))?;
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

//! Just enough HTTP/1.1 for the generator endpoints: a request decoder and
//! response encoder for the server, and the matching request writer and
//! response reader for clients.

use std::{fmt, io};

use bytes::{Buf, BytesMut};
use memchr::memmem;
use nom::{
    bytes::complete::{tag, take_till, take_till1, take_while1},
    character::complete::{alpha1, char, digit1},
    combinator::{all_consuming, map, map_res},
    multi::many0,
    sequence::{pair, preceded, separated_pair, terminated, tuple},
    IResult,
};
use tokio_util::codec::{Decoder, Encoder};

const HEAD_END: &[u8] = b"\r\n\r\n";
const MAX_HEAD: usize = 8 * 1024;
const MAX_BODY: usize = 64 * 1024;

#[derive(Debug)]
pub enum HttpError {
    Io(io::Error),
    Malformed(&'static str),
    TooLarge,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Io(e) => write!(f, "i/o error: {e}"),
            HttpError::Malformed(what) => write!(f, "malformed message: {what}"),
            HttpError::TooLarge => f.write_str("message too large"),
        }
    }
}

impl std::error::Error for HttpError {}

impl From<io::Error> for HttpError {
    fn from(e: io::Error) -> Self {
        HttpError::Io(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Options,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Target path without the query string.
    pub path: String,
    pub keep_alive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
    pub close: bool,
}

impl Response {
    pub fn json(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            body,
            close: false,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self::json(status, Vec::new())
    }

    pub fn closing(mut self) -> Self {
        self.close = true;
        self
    }
}

pub fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

type Header<'a> = (&'a str, &'a str);

fn header(input: &str) -> IResult<&str, Header<'_>> {
    preceded(
        tag("\r\n"),
        separated_pair(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            char(':'),
            map(take_till(|c: char| c == '\r'), str::trim),
        ),
    )(input)
}

fn version(input: &str) -> IResult<&str, &str> {
    preceded(
        tag("HTTP/"),
        take_while1(|c: char| c.is_ascii_digit() || c == '.'),
    )(input)
}

fn request_line(input: &str) -> IResult<&str, (&str, &str, &str)> {
    tuple((
        terminated(alpha1, char(' ')),
        terminated(take_till1(|c: char| c == ' '), char(' ')),
        version,
    ))(input)
}

fn status_line(input: &str) -> IResult<&str, u16> {
    preceded(
        pair(version, char(' ')),
        terminated(
            map_res(digit1, str::parse::<u16>),
            take_till(|c: char| c == '\r'),
        ),
    )(input)
}

fn request_head(input: &str) -> IResult<&str, ((&str, &str, &str), Vec<Header<'_>>)> {
    all_consuming(pair(request_line, many0(header)))(input)
}

fn response_head(input: &str) -> IResult<&str, (u16, Vec<Header<'_>>)> {
    all_consuming(pair(status_line, many0(header)))(input)
}

fn find_header<'a>(headers: &[Header<'a>], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| *v)
}

fn content_length(headers: &[Header<'_>]) -> Result<Option<usize>, HttpError> {
    match find_header(headers, "content-length") {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| HttpError::Malformed("bad content-length")),
        None => Ok(None),
    }
}

fn head_str(src: &[u8], end: usize) -> Result<&str, HttpError> {
    std::str::from_utf8(&src[..end]).map_err(|_| HttpError::Malformed("non-utf8 head"))
}

/// Server side: decodes requests, encodes responses.
///
/// Request bodies are skipped; none of the routes read one.
#[derive(Default)]
pub struct HttpCodec;

impl Decoder for HttpCodec {
    type Item = Request;
    type Error = HttpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(end) = memmem::find(&src[..], HEAD_END) else {
            if src.len() > MAX_HEAD {
                return Err(HttpError::TooLarge);
            }
            return Ok(None);
        };

        let (request, body_len) = {
            let head = head_str(src, end)?;
            let (_, ((method, target, version), headers)) =
                request_head(head).map_err(|_| HttpError::Malformed("bad request head"))?;

            let method = match method {
                "GET" => Method::Get,
                "OPTIONS" => Method::Options,
                other => Method::Other(other.to_string()),
            };
            let path = target.split('?').next().unwrap_or(target).to_string();
            let keep_alive = match find_header(&headers, "connection") {
                Some(v) if v.eq_ignore_ascii_case("close") => false,
                Some(v) if v.eq_ignore_ascii_case("keep-alive") => true,
                _ => version != "1.0",
            };
            let body_len = content_length(&headers)?.unwrap_or(0);
            if body_len > MAX_BODY {
                return Err(HttpError::TooLarge);
            }

            (
                Request {
                    method,
                    path,
                    keep_alive,
                },
                body_len,
            )
        };

        let frame_len = end + HEAD_END.len() + body_len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }
        src.advance(frame_len);

        Ok(Some(request))
    }
}

impl Encoder<Response> for HttpCodec {
    type Error = HttpError;

    fn encode(&mut self, response: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut itoa_buf = itoa::Buffer::new();

        dst.reserve(256 + response.body.len());
        dst.extend_from_slice(b"HTTP/1.1 ");
        dst.extend_from_slice(itoa_buf.format(response.status).as_bytes());
        dst.extend_from_slice(b" ");
        dst.extend_from_slice(reason(response.status).as_bytes());
        dst.extend_from_slice(b"\r\n");

        if !response.body.is_empty() {
            dst.extend_from_slice(b"Content-Type: application/json; charset=utf-8\r\n");
        }
        dst.extend_from_slice(b"Content-Length: ");
        dst.extend_from_slice(itoa_buf.format(response.body.len()).as_bytes());
        dst.extend_from_slice(b"\r\n");
        dst.extend_from_slice(b"Access-Control-Allow-Origin: *\r\n");
        dst.extend_from_slice(b"Access-Control-Allow-Methods: GET, OPTIONS\r\n");
        dst.extend_from_slice(b"Access-Control-Allow-Headers: Content-Type\r\n");
        if response.close {
            dst.extend_from_slice(b"Connection: close\r\n");
        } else {
            dst.extend_from_slice(b"Connection: keep-alive\r\n");
        }
        dst.extend_from_slice(b"\r\n");
        dst.extend_from_slice(&response.body);

        Ok(())
    }
}

/// Client side: a one-shot `GET` that asks the server to close afterwards.
pub fn write_request(buf: &mut Vec<u8>, host: &str, path: &str) {
    buf.clear();
    buf.extend_from_slice(b"GET ");
    buf.extend_from_slice(path.as_bytes());
    buf.extend_from_slice(b" HTTP/1.1\r\nHost: ");
    buf.extend_from_slice(host.as_bytes());
    buf.extend_from_slice(b"\r\nAccept: application/json\r\nConnection: close\r\n\r\n");
}

/// Status and body of a complete response read up to end of stream.
pub fn parse_response(src: &[u8]) -> Result<(u16, &[u8]), HttpError> {
    let end = memmem::find(src, HEAD_END).ok_or(HttpError::Malformed("incomplete head"))?;
    let head = head_str(src, end)?;
    let (_, (status, headers)) =
        response_head(head).map_err(|_| HttpError::Malformed("bad status line"))?;

    if find_header(&headers, "transfer-encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    {
        return Err(HttpError::Malformed("chunked body"));
    }

    let body = &src[end + HEAD_END.len()..];
    let body = match content_length(&headers)? {
        Some(len) if len > body.len() => return Err(HttpError::Malformed("truncated body")),
        Some(len) => &body[..len],
        None => body,
    };

    Ok((status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_get() {
        let mut src = BytesMut::from(
            &b"GET /api/generate-lotto?x=1 HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\n"[..],
        );
        let request = HttpCodec.decode(&mut src).unwrap().unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/api/generate-lotto");
        assert!(request.keep_alive);
        assert!(src.is_empty());
    }

    #[test]
    fn waits_for_the_rest_of_the_head() {
        let mut src = BytesMut::from(&b"GET /api/generate-lotto HTTP/1.1\r\nHost: loc"[..]);
        assert!(HttpCodec.decode(&mut src).unwrap().is_none());
        src.extend_from_slice(b"alhost\r\n\r\n");
        assert!(HttpCodec.decode(&mut src).unwrap().is_some());
    }

    #[test]
    fn decodes_pipelined_requests_and_skips_bodies() {
        let mut src = BytesMut::from(
            &b"POST /a HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcGET /b HTTP/1.0\r\n\r\n"[..],
        );
        let first = HttpCodec.decode(&mut src).unwrap().unwrap();
        assert_eq!(first.method, Method::Other(String::from("POST")));
        assert_eq!(first.path, "/a");
        let second = HttpCodec.decode(&mut src).unwrap().unwrap();
        assert_eq!(second.path, "/b");
        assert!(!second.keep_alive);
        assert!(HttpCodec.decode(&mut src).unwrap().is_none());
    }

    #[test]
    fn waits_for_a_declared_body() {
        let mut src = BytesMut::from(&b"POST /a HTTP/1.1\r\nContent-Length: 4\r\n\r\nab"[..]);
        assert!(HttpCodec.decode(&mut src).unwrap().is_none());
        src.extend_from_slice(b"cd");
        assert!(HttpCodec.decode(&mut src).unwrap().is_some());
    }

    #[test]
    fn connection_close_is_honored() {
        let mut src =
            BytesMut::from(&b"GET / HTTP/1.1\r\nConnection: Close\r\n\r\n"[..]);
        assert!(!HttpCodec.decode(&mut src).unwrap().unwrap().keep_alive);
    }

    #[test]
    fn rejects_garbage() {
        let mut src = BytesMut::from(&b"hello there\r\n\r\n"[..]);
        assert!(matches!(
            HttpCodec.decode(&mut src),
            Err(HttpError::Malformed(_))
        ));

        let mut src = BytesMut::from(vec![b'a'; MAX_HEAD + 1].as_slice());
        assert!(matches!(HttpCodec.decode(&mut src), Err(HttpError::TooLarge)));
    }

    #[test]
    fn encoded_response_reads_back() {
        let mut dst = BytesMut::new();
        HttpCodec
            .encode(Response::json(200, br#"{"success":true}"#.to_vec()), &mut dst)
            .unwrap();
        let text = std::str::from_utf8(&dst).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Access-Control-Allow-Origin: *\r\n"));
        assert!(text.contains("Content-Length: 16\r\n"));

        let (status, body) = parse_response(&dst).unwrap();
        assert_eq!(status, 200);
        assert_eq!(body, br#"{"success":true}"#);
    }

    #[test]
    fn response_without_length_takes_the_rest() {
        let (status, body) =
            parse_response(b"HTTP/1.0 500 Internal Server Error\r\nServer: x\r\n\r\noops").unwrap();
        assert_eq!(status, 500);
        assert_eq!(body, b"oops");
        assert!(parse_response(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort").is_err());
    }

    #[test]
    fn chunked_responses_are_rejected() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: Chunked\r\n\r\n10\r\n{\"success\":true}\r\n0\r\n\r\n";
        assert!(matches!(
            parse_response(raw),
            Err(HttpError::Malformed("chunked body"))
        ));
    }

    #[test]
    fn request_writer() {
        let mut buf = Vec::new();
        write_request(&mut buf, "127.0.0.1:5000", "/api/generate-pension");
        assert_eq!(
            buf,
            b"GET /api/generate-pension HTTP/1.1\r\nHost: 127.0.0.1:5000\r\nAccept: application/json\r\nConnection: close\r\n\r\n"
        );
    }
}

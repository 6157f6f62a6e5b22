use httparse::Status;

/// Number of headers to allocate space for when inspecting a request.
const MAX_HEADERS: usize = 64;

/// What the start of a buffer looks like to an HTTP/1.x request parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestHead<'buf> {
    /// The bytes are not an HTTP request.
    NotHttp,
    /// A request line has started but the header block is not terminated yet.
    Partial,
    /// A complete request head of `len` bytes.
    Complete {
        method: &'buf str,
        path: &'buf str,
        len: usize,
    },
    /// Looks like HTTP but cannot be parsed, e.g. too many headers.
    Malformed,
}

/// Inspects the start of `src` for an HTTP request head.
pub fn inspect(src: &[u8]) -> RequestHead<'_> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut request = httparse::Request::new(&mut headers);

    match request.parse(src) {
        Ok(Status::Complete(len)) => match (request.method, request.path) {
            (Some(method), Some(path)) => RequestHead::Complete { method, path, len },
            _ => RequestHead::Malformed,
        },
        Ok(Status::Partial) => RequestHead::Partial,
        Err(httparse::Error::TooManyHeaders) => RequestHead::Malformed,
        Err(_) => RequestHead::NotHttp,
    }
}

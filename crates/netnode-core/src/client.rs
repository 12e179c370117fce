//! Outbound request client (station mode).
//!
//! Issues one blocking GET and streams the response body to an observer
//! chunk by chunk. The transport is abstracted behind [`HttpConnector`] so
//! the same flow runs over reqwest on Linux and `EspHttpConnection` on ESP32.

use thiserror::Error;
use tracing::{debug, info};

/// Non-fatal failure of an outbound request.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("failed to read response body: {0}")]
    Read(String),
}

/// An open response whose body is read incrementally.
///
/// Dropping the body releases the underlying connection.
pub trait ResponseBody {
    fn status(&self) -> u16;

    /// Next chunk of body data, or `None` at end of body.
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ConnectError>;
}

/// Opens GET requests.
pub trait HttpConnector {
    type Body: ResponseBody;

    fn get(&mut self, url: &str) -> Result<Self::Body, ConnectError>;
}

/// What a completed request delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetSummary {
    pub status: u16,
    pub chunks: usize,
    pub bytes: usize,
}

/// Perform one GET, invoking `on_chunk` for every body chunk as it arrives.
///
/// The response is dropped on every path out of this function, so the
/// connection is released whether the body ends, fails, or never opens.
pub fn perform_get<C, F>(
    connector: &mut C,
    url: &str,
    mut on_chunk: F,
) -> Result<GetSummary, ConnectError>
where
    C: HttpConnector,
    F: FnMut(&[u8]),
{
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConnectError::InvalidUrl(url.to_string()));
    }

    debug!("GET {}", url);
    let mut body = connector.get(url)?;
    let mut summary = GetSummary {
        status: body.status(),
        chunks: 0,
        bytes: 0,
    };

    while let Some(chunk) = body.next_chunk()? {
        if chunk.is_empty() {
            continue;
        }
        summary.chunks += 1;
        summary.bytes += chunk.len();
        on_chunk(&chunk);
    }

    info!(
        "GET {} -> {} ({} bytes in {} chunks)",
        url, summary.status, summary.bytes, summary.chunks
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Replays a scripted response and records when it is released.
    struct ScriptedBody {
        status: u16,
        chunks: VecDeque<Result<Vec<u8>, ConnectError>>,
        released: Rc<Cell<bool>>,
    }

    impl ResponseBody for ScriptedBody {
        fn status(&self) -> u16 {
            self.status
        }

        fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ConnectError> {
            self.chunks.pop_front().transpose()
        }
    }

    impl Drop for ScriptedBody {
        fn drop(&mut self) {
            self.released.set(true);
        }
    }

    struct ScriptedConnector {
        response: Option<Result<Vec<Result<Vec<u8>, ConnectError>>, ConnectError>>,
        released: Rc<Cell<bool>>,
        requested: Vec<String>,
    }

    impl ScriptedConnector {
        fn new(response: Result<Vec<Result<Vec<u8>, ConnectError>>, ConnectError>) -> Self {
            Self {
                response: Some(response),
                released: Rc::new(Cell::new(false)),
                requested: Vec::new(),
            }
        }
    }

    impl HttpConnector for ScriptedConnector {
        type Body = ScriptedBody;

        fn get(&mut self, url: &str) -> Result<ScriptedBody, ConnectError> {
            self.requested.push(url.to_string());
            let chunks = self.response.take().expect("single request")?;
            Ok(ScriptedBody {
                status: 200,
                chunks: chunks.into(),
                released: self.released.clone(),
            })
        }
    }

    const URL: &str = "http://192.168.1.111:80/test";

    #[test]
    fn test_each_chunk_delivered_once_in_order() {
        let chunks: Vec<Vec<u8>> = vec![b"hello ".to_vec(), b"from ".to_vec(), b"server".to_vec()];
        let mut connector = ScriptedConnector::new(Ok(chunks.iter().cloned().map(Ok).collect()));

        let mut seen = Vec::new();
        let summary = perform_get(&mut connector, URL, |chunk| seen.push(chunk.to_vec())).unwrap();

        assert_eq!(seen, chunks);
        assert_eq!(
            summary,
            GetSummary {
                status: 200,
                chunks: 3,
                bytes: 17
            }
        );
        assert_eq!(connector.requested, vec![URL.to_string()]);
        assert!(connector.released.get());
    }

    #[test]
    fn test_empty_body() {
        let mut connector = ScriptedConnector::new(Ok(Vec::new()));
        let mut calls = 0;
        let summary = perform_get(&mut connector, URL, |_| calls += 1).unwrap();

        assert_eq!(calls, 0);
        assert_eq!(summary.chunks, 0);
        assert!(connector.released.get());
    }

    #[test]
    fn test_connect_failure_is_reported() {
        let mut connector =
            ScriptedConnector::new(Err(ConnectError::Connect("connection refused".into())));
        let mut calls = 0;
        let err = perform_get(&mut connector, URL, |_| calls += 1).unwrap_err();

        assert!(matches!(err, ConnectError::Connect(_)));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_mid_stream_failure_releases_body() {
        let mut connector = ScriptedConnector::new(Ok(vec![
            Ok(b"partial".to_vec()),
            Err(ConnectError::Timeout),
            Ok(b"never".to_vec()),
        ]));
        let mut seen = Vec::new();
        let err = perform_get(&mut connector, URL, |chunk| seen.push(chunk.to_vec())).unwrap_err();

        assert!(matches!(err, ConnectError::Timeout));
        assert_eq!(seen, vec![b"partial".to_vec()]);
        assert!(connector.released.get());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut connector = ScriptedConnector::new(Ok(Vec::new()));
        let err = perform_get(&mut connector, "ftp://host/test", |_| {}).unwrap_err();

        assert!(matches!(err, ConnectError::InvalidUrl(_)));
        assert!(connector.requested.is_empty());
    }
}

use async_trait::async_trait;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderMap, HeaderName, RANGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::ReadAt;
use crate::error::{Error, Result};

/// Random access to a remote resource through HTTP Range requests.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    max_retry: u32,
}

fn header<'a>(headers: &'a HeaderMap, name: HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

impl HttpRangeReader {
    /// Probe `url` with a HEAD request.
    ///
    /// The server must advertise `Accept-Ranges: bytes` and a
    /// `Content-Length`; a 404 maps to [`Error::NotFound`].
    pub async fn new(client: Client, url: String, max_retry: u32) -> Result<Self> {
        let resp = client.head(&url).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => return Err(Error::NotFound(url)),
            status if !status.is_success() => {
                return Err(Error::Message(format!("{url}: HEAD answered {status}")));
            }
            _ => {}
        }

        let headers = resp.headers();
        if !header(headers, ACCEPT_RANGES).is_some_and(|v| v.contains("bytes")) {
            return Err(Error::Message(format!("{url}: server does not accept Range requests")));
        }
        let size = header(headers, CONTENT_LENGTH)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Error::Message(format!("{url}: no Content-Length")))?;

        Ok(Self {
            client,
            url,
            size,
            max_retry: max_retry.max(1),
        })
    }

    /// GET `bytes=start-end` into `out`, retrying timeouts and refused
    /// connections with a linear backoff. Returns the bytes copied.
    async fn fetch_into(&self, start: u64, end: u64, out: &mut [u8]) -> Result<usize> {
        let mut attempt = 0;
        loop {
            let sent = self
                .client
                .get(&self.url)
                .header(RANGE, format!("bytes={start}-{end}"))
                .send()
                .await;
            match sent {
                Ok(resp) if resp.status() == StatusCode::PARTIAL_CONTENT => {
                    let body = resp.bytes().await?;
                    let n = body.len().min(out.len());
                    out[..n].copy_from_slice(&body[..n]);
                    return Ok(n);
                }
                Ok(resp) => {
                    return Err(Error::Message(format!(
                        "{}: range request answered {}",
                        self.url,
                        resp.status()
                    )));
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    attempt += 1;
                    if attempt >= self.max_retry {
                        return Err(Error::Message(format!(
                            "{}: giving up after {attempt} attempts: {e}",
                            self.url
                        )));
                    }
                    tracing::warn!(
                        url = %self.url,
                        attempt,
                        max = self.max_retry,
                        "range request failed: {e}"
                    );
                    tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }
        let wanted = buf.len().min((self.size - offset) as usize);
        let last = offset + wanted as u64 - 1;

        let mut filled = 0;
        while filled < wanted {
            let n = self
                .fetch_into(offset + filled as u64, last, &mut buf[filled..wanted])
                .await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        tracing::trace!(url = %self.url, offset, bytes = filled, "range read");
        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// A reader whose HEAD probe already happened, pointed at `url`.
    fn probed(url: String, size: u64, max_retry: u32) -> HttpRangeReader {
        HttpRangeReader {
            client: Client::new(),
            url,
            size,
            max_retry,
        }
    }

    #[tokio::test]
    async fn reads_past_the_end_need_no_request() {
        let reader = probed("http://127.0.0.1:9/never".to_string(), 4, 1);
        let mut buf = [0u8; 8];
        assert_eq!(reader.read_at(4, &mut buf).await.unwrap(), 0);
        assert_eq!(reader.read_at(0, &mut []).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn refused_connections_are_retried_then_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let reader = probed(format!("http://{addr}/a.zip"), 100, 2);
        let mut buf = [0u8; 10];
        let err = reader.read_at(0, &mut buf).await.unwrap_err();
        assert!(err.to_string().contains("giving up after 2 attempts"), "{err}");
    }
}

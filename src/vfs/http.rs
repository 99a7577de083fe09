use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::io::Cursor;
use std::sync::Arc;

use super::{FileKind, FileSystem, FsOptions, ReadStream, WriteStream};
use crate::error::{Error, Result};
use crate::io::{HttpRangeReader, ReadAt};

/// Read-only backend for `http://` and `https://` URIs.
///
/// Paths are the full URLs. Every existing resource is a file.
pub struct HttpFileSystem {
    client: Client,
    max_retry: u32,
}

impl HttpFileSystem {
    pub fn new(options: &FsOptions) -> Result<Self> {
        let client = Client::builder().timeout(options.http_timeout).build()?;
        Ok(Self {
            client,
            max_retry: options.http_max_retry,
        })
    }
}

#[async_trait]
impl FileSystem for HttpFileSystem {
    fn scheme(&self) -> &'static str {
        "http"
    }

    fn uri(&self, path: &str) -> String {
        path.to_string()
    }

    async fn kind(&self, path: &str) -> Result<Option<FileKind>> {
        let resp = self.client.head(path).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(None),
            status if status.is_success() => Ok(Some(FileKind::File)),
            status => Err(Error::Message(format!(
                "HTTP request for {path} failed with status: {status}"
            ))),
        }
    }

    async fn list(&self, path: &str) -> Result<Vec<String>> {
        Err(Error::NotAFolder(path.to_string()))
    }

    async fn open_read(&self, path: &str) -> Result<ReadStream> {
        let resp = self.client.get(path).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path.to_string()));
        }
        if !resp.status().is_success() {
            return Err(Error::Message(format!(
                "HTTP request for {path} failed with status: {}",
                resp.status()
            )));
        }
        let body = resp.bytes().await?;
        Ok(Box::new(Cursor::new(body)))
    }

    async fn open_random(&self, path: &str) -> Result<Arc<dyn ReadAt>> {
        let reader =
            HttpRangeReader::new(self.client.clone(), path.to_string(), self.max_retry).await?;
        Ok(Arc::new(reader))
    }

    async fn open_write(&self, path: &str, _append: bool) -> Result<WriteStream> {
        Err(Error::ReadOnly(path.to_string()))
    }

    async fn create_file(&self, path: &str) -> Result<()> {
        Err(Error::ReadOnly(path.to_string()))
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        Err(Error::ReadOnly(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        Err(Error::ReadOnly(path.to_string()))
    }

    async fn rename(&self, from: &str, _to: &str) -> Result<()> {
        Err(Error::ReadOnly(from.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use crate::vfs::{FileObject, RamFileSystem};
    use crate::zip::ZipWriter;
    use std::collections::HashMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    struct Resource {
        body: Vec<u8>,
        /// Advertise `Accept-Ranges: bytes`
        ranges: bool,
        /// Upper bound on the bytes sent per range reply
        max_chunk: usize,
    }

    impl Resource {
        fn ranged(body: Vec<u8>) -> Self {
            Self {
                body,
                ranges: true,
                max_chunk: usize::MAX,
            }
        }
    }

    /// Serve `resources` over HTTP/1.1 on a local port, one request per
    /// connection. Returns the base URL.
    async fn serve(resources: HashMap<&'static str, Resource>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let resources = Arc::new(resources);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let resources = Arc::clone(&resources);
                tokio::spawn(async move {
                    let _ = respond(stream, &resources).await;
                });
            }
        });
        format!("http://{addr}")
    }

    async fn respond(
        mut stream: TcpStream,
        resources: &HashMap<&'static str, Resource>,
    ) -> std::io::Result<()> {
        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            if stream.read(&mut byte).await? == 0 {
                return Ok(());
            }
            head.push(byte[0]);
        }
        let head = String::from_utf8_lossy(&head);
        let mut lines = head.lines();
        let mut request_line = lines.next().unwrap_or_default().split(' ');
        let method = request_line.next().unwrap_or_default();
        let path = request_line.next().unwrap_or_default();
        let range = lines.find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("range")
                .then(|| value.trim().to_string())
        });

        let Some(resource) = resources.get(path) else {
            let not_found = "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
            stream.write_all(not_found.as_bytes()).await?;
            return stream.shutdown().await;
        };

        let total = resource.body.len();
        let accept = if resource.ranges {
            "accept-ranges: bytes\r\n"
        } else {
            ""
        };
        let requested = range
            .as_deref()
            .and_then(|r| r.strip_prefix("bytes="))
            .and_then(|r| r.split_once('-'))
            .and_then(|(start, end)| {
                Some((start.parse::<usize>().ok()?, end.parse::<usize>().ok()?))
            });
        let (status, body, content_range) = match requested {
            Some((start, end)) if resource.ranges && start < total => {
                let end = end.min(total - 1).min(start.saturating_add(resource.max_chunk - 1));
                (
                    "206 Partial Content",
                    &resource.body[start..=end],
                    format!("content-range: bytes {start}-{end}/{total}\r\n"),
                )
            }
            _ => ("200 OK", &resource.body[..], String::new()),
        };

        let header = format!(
            "HTTP/1.1 {status}\r\n{accept}{content_range}\
             content-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(header.as_bytes()).await?;
        if method != "HEAD" {
            stream.write_all(body).await?;
        }
        stream.shutdown().await
    }

    async fn sample_zip() -> Vec<u8> {
        let mut zip = ZipWriter::new(Vec::new());
        for (name, body) in [("x.csv", "id,value\n1,42\n"), ("notes/y.csv", "a,b\n")] {
            zip.start_file(name).await.unwrap();
            zip.write(body.as_bytes()).await.unwrap();
        }
        zip.finish().await.unwrap()
    }

    fn failure<T>(result: Result<T>) -> Error {
        match result {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        }
    }

    fn http() -> Arc<dyn FileSystem> {
        Arc::new(HttpFileSystem::new(&FsOptions::default()).unwrap())
    }

    #[tokio::test]
    async fn kind_follows_head_status() {
        let base = serve(HashMap::from([(
            "/data.bin",
            Resource::ranged(b"0123456789".to_vec()),
        )]))
        .await;
        let fs = http();

        let present = FileObject::new(Arc::clone(&fs), format!("{base}/data.bin"));
        assert_eq!(present.kind().await.unwrap(), Some(FileKind::File));
        let missing = FileObject::new(Arc::clone(&fs), format!("{base}/gone.bin"));
        assert_eq!(missing.kind().await.unwrap(), None);
        assert!(!missing.exists().await.unwrap());

        assert!(failure(missing.reader().await).is_not_found());
        assert!(failure(missing.random_reader().await).is_not_found());

        let mut body = Vec::new();
        present
            .reader()
            .await
            .unwrap()
            .read_to_end(&mut body)
            .await
            .unwrap();
        assert_eq!(body, b"0123456789");
    }

    #[tokio::test]
    async fn list_and_unzip_over_short_range_replies() {
        let base = serve(HashMap::from([(
            "/in.zip",
            Resource {
                max_chunk: 16,
                ..Resource::ranged(sample_zip().await)
            },
        )]))
        .await;
        let remote = FileObject::new(http(), format!("{base}/in.zip"));

        assert_eq!(
            ops::list_zip(&remote).await.unwrap(),
            vec!["x.csv", "notes/y.csv"]
        );

        let ram: Arc<dyn FileSystem> = Arc::new(RamFileSystem::new());
        let out = FileObject::new(ram, "/out");
        ops::unzip(&remote, &out).await.unwrap();
        let mut text = String::new();
        out.child("x.csv")
            .reader()
            .await
            .unwrap()
            .read_to_string(&mut text)
            .await
            .unwrap();
        assert_eq!(text, "id,value\n1,42\n");
    }

    #[tokio::test]
    async fn random_access_needs_range_support() {
        let base = serve(HashMap::from([(
            "/plain.zip",
            Resource {
                ranges: false,
                ..Resource::ranged(sample_zip().await)
            },
        )]))
        .await;
        let remote = FileObject::new(http(), format!("{base}/plain.zip"));

        let err = failure(remote.random_reader().await);
        assert!(err.to_string().contains("Range"), "{err}");
        assert!(ops::list_zip(&remote).await.is_err());
    }

    #[tokio::test]
    async fn writes_are_refused() {
        let fs = http();
        let node = FileObject::new(fs, "http://127.0.0.1:9/x.txt");
        assert!(matches!(node.create_file().await, Err(Error::ReadOnly(_))));
        assert!(matches!(node.writer(false).await, Err(Error::ReadOnly(_))));
        assert!(matches!(node.delete().await, Err(Error::ReadOnly(_))));
        assert!(matches!(node.children().await, Err(Error::NotAFolder(_))));
    }
}

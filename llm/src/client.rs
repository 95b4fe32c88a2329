use anyhow::{Context, anyhow};
use futures::stream::Stream;
use futures::{
    StreamExt, future,
    stream::{self},
};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use std::{fmt::Debug, pin::Pin};
use tracing::{Level, event, instrument};

#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
}

pub type BoxedStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

impl Default for Client {
    fn default() -> Self {
        Client {
            client: reqwest::Client::new(),
        }
    }
}

impl Client {
    #[instrument(level = "trace", skip(self))]
    pub async fn get<U, T>(&self, url: U, timeout: Duration) -> anyhow::Result<T>
    where
        U: reqwest::IntoUrl + std::fmt::Debug,
        T: DeserializeOwned,
    {
        let response = self.client.get(url).timeout(timeout).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Request failed with status: {}", response.status()));
        }
        let text = response.text().await?;
        event!(Level::TRACE, response = text);

        Ok(serde_json::from_str::<T>(&text)?)
    }

    /// Issue a GET and succeed if the server answered at all, whatever the status.
    #[instrument(level = "trace", skip(self))]
    pub async fn ping<U>(&self, url: U, timeout: Duration) -> anyhow::Result<()>
    where
        U: reqwest::IntoUrl + std::fmt::Debug,
    {
        let response = self.client.get(url).timeout(timeout).send().await?;
        event!(Level::TRACE, status = %response.status());
        Ok(())
    }

    /// POST a JSON body and decode the response as newline-delimited JSON.
    ///
    /// Each complete line is yielded as soon as it arrives. A transport error or
    /// an undecodable line is yielded once as `Err` and ends the stream.
    #[instrument(level = "trace", skip(self, request))]
    pub async fn post_ndjson<U, S, T>(
        &self,
        url: U,
        request: &S,
    ) -> anyhow::Result<BoxedStream<anyhow::Result<T>>>
    where
        U: reqwest::IntoUrl + Debug,
        S: Serialize + Sized,
        T: DeserializeOwned + Send + 'static,
    {
        let response = self.client.post(url).json(request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(anyhow!("Request failed with status {}: {}", status, error_body));
        }

        Ok(decode_ndjson(response.bytes_stream()))
    }
}

/// Reassemble byte chunks into lines and decode each line as `T`.
///
/// Lines are split on raw bytes so multi-byte characters cut across chunk
/// boundaries survive. A trailing line without a newline is decoded when the
/// byte stream ends.
pub(crate) fn decode_ndjson<B, E, T>(bytes: B) -> BoxedStream<anyhow::Result<T>>
where
    B: Stream<Item = Result<bytes::Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
{
    let lines = bytes
        .map(Some)
        .chain(stream::once(future::ready(None)))
        .scan((Vec::<u8>::new(), false), |(buffer, failed), chunk| {
            if *failed {
                return future::ready(None);
            }

            let mut items: Vec<anyhow::Result<T>> = vec![];
            match chunk {
                Some(Ok(chunk)) => {
                    buffer.extend_from_slice(&chunk);
                    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = buffer.drain(..=pos).collect();
                        if let Some(item) = decode_line(&line[..line.len() - 1]) {
                            items.push(item);
                        }
                    }
                }
                Some(Err(e)) => {
                    items.push(Err(anyhow::Error::new(e).context("Response stream interrupted")));
                }
                None => {
                    let rest = std::mem::take(buffer);
                    if let Some(item) = decode_line(&rest) {
                        items.push(item);
                    }
                }
            }

            if let Some(pos) = items.iter().position(|item| item.is_err()) {
                items.truncate(pos + 1);
                *failed = true;
            }

            future::ready(Some(items))
        });

    Box::pin(lines.flat_map(stream::iter))
}

fn decode_line<T: DeserializeOwned>(line: &[u8]) -> Option<anyhow::Result<T>> {
    if line.iter().all(|b| b.is_ascii_whitespace()) {
        return None;
    }
    Some(serde_json::from_slice::<T>(line).with_context(|| {
        format!(
            "Failed to parse stream line: {}",
            String::from_utf8_lossy(line)
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::{Router, body::Body, routing::get, routing::post};
    use serde::Deserialize;
    use std::convert::Infallible;

    #[derive(Debug, Deserialize, PartialEq, Clone)]
    struct TestEvent {
        id: u32,
        text: String,
    }

    fn chunks(parts: &[&[u8]]) -> impl Stream<Item = Result<bytes::Bytes, std::io::Error>> + Send + 'static {
        let owned: Vec<Result<bytes::Bytes, std::io::Error>> = parts
            .iter()
            .map(|p| Ok(bytes::Bytes::copy_from_slice(p)))
            .collect();
        stream::iter(owned)
    }

    async fn collect(parts: &[&[u8]]) -> Vec<anyhow::Result<TestEvent>> {
        decode_ndjson::<_, _, TestEvent>(chunks(parts)).collect().await
    }

    #[tokio::test]
    async fn test_decode_complete_lines() {
        let results = collect(&[b"{\"id\":1,\"text\":\"hello\"}\n{\"id\":2,\"text\":\"world\"}\n"]).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().text, "hello");
        assert_eq!(results[1].as_ref().unwrap().text, "world");
    }

    #[tokio::test]
    async fn test_decode_split_across_chunks() {
        let results = collect(&[
            b"{\"id\":1,\"te",
            b"xt\":\"hello\"}\n{\"id\":2",
            b",\"text\":\"world\"}\n",
        ])
        .await;

        let events: Vec<TestEvent> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            events,
            vec![
                TestEvent { id: 1, text: "hello".to_string() },
                TestEvent { id: 2, text: "world".to_string() },
            ]
        );
    }

    #[tokio::test]
    async fn test_decode_multibyte_split() {
        // "₹" is three bytes; cut it in the middle
        let line = "{\"id\":1,\"text\":\"₹100\"}\n".as_bytes();
        let cut = line.iter().position(|b| *b == 0xE2).unwrap() + 1;
        let results = collect(&[&line[..cut], &line[cut..]]).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().text, "₹100");
    }

    #[tokio::test]
    async fn test_decode_trailing_line_without_newline() {
        let results = collect(&[b"{\"id\":1,\"text\":\"a\"}\n{\"id\":2,\"text\":\"b\"}"]).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].as_ref().unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_decode_skips_blank_lines() {
        let results = collect(&[b"\n{\"id\":1,\"text\":\"a\"}\n\n  \n"]).await;

        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_decode_malformed_line_ends_stream() {
        let results = collect(&[
            b"{\"id\":1,\"text\":\"hello\"}\n{malformed json}\n{\"id\":2,\"text\":\"world\"}\n",
        ])
        .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[tokio::test]
    async fn test_decode_transport_error_ends_stream() {
        let parts: Vec<Result<bytes::Bytes, std::io::Error>> = vec![
            Ok(bytes::Bytes::from_static(b"{\"id\":1,\"text\":\"a\"}\n")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(bytes::Bytes::from_static(b"{\"id\":2,\"text\":\"b\"}\n")),
        ];
        let results: Vec<anyhow::Result<TestEvent>> =
            decode_ndjson(stream::iter(parts)).collect().await;

        assert_eq!(results.len(), 2);
        assert!(results[1].is_err());
    }

    #[tokio::test]
    async fn test_post_ndjson_against_server() {
        let router = Router::new().route(
            "/stream",
            post(|| async {
                let body = stream::iter(vec![
                    Ok::<_, Infallible>("{\"id\":1,\"text\":\"x\"}\n{\"id\"".to_string()),
                    Ok(":2,\"text\":\"y\"}\n".to_string()),
                ]);
                Body::from_stream(body)
            }),
        );
        let base = spawn_server(router).await;

        let client = Client::default();
        let stream = client
            .post_ndjson::<_, _, TestEvent>(format!("{}/stream", base), &serde_json::json!({}))
            .await
            .unwrap();
        let events: Vec<TestEvent> = stream.map(|r| r.unwrap()).collect().await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].text, "y");
    }

    #[tokio::test]
    async fn test_post_ndjson_error_status() {
        let router = Router::new().route(
            "/stream",
            post(|| async { (axum::http::StatusCode::NOT_FOUND, "model not found") }),
        );
        let base = spawn_server(router).await;

        let result = Client::default()
            .post_ndjson::<_, _, TestEvent>(format!("{}/stream", base), &serde_json::json!({}))
            .await;

        let err = result.err().expect("expected an error").to_string();
        assert!(err.contains("404"));
        assert!(err.contains("model not found"));
    }

    #[tokio::test]
    async fn test_ping_and_get() {
        let router = Router::new()
            .route("/ok", get(|| async { "{\"id\":7,\"text\":\"t\"}" }))
            .route("/fail", get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }));
        let base = spawn_server(router).await;
        let client = Client::default();
        let timeout = Duration::from_secs(5);

        assert!(client.ping(format!("{}/ok", base), timeout).await.is_ok());
        // An error status still means something is listening
        assert!(client.ping(format!("{}/fail", base), timeout).await.is_ok());
        assert!(client.ping("http://127.0.0.1:1/", timeout).await.is_err());

        let event: TestEvent = client.get(format!("{}/ok", base), timeout).await.unwrap();
        assert_eq!(event.id, 7);
    }
}

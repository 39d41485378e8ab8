use crate::request::{Body, HttpRequest};
use crate::sse::{SseParser, decode_event};
use advisor_core::event::AssistantEvent;
use anyhow::{Context, anyhow};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn build_client(total_timeout: Option<Duration>) -> anyhow::Result<reqwest::Client> {
    // Important: without an explicit timeout, a broken endpoint can hang a
    // whole conversational turn.
    let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
    if let Some(timeout) = total_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("build http client")
}

fn prepare(client: &reqwest::Client, req: &HttpRequest) -> anyhow::Result<reqwest::RequestBuilder> {
    let mut headers = HeaderMap::new();
    for (k, v) in &req.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .with_context(|| format!("invalid header name: {k}"))?;
        let value =
            HeaderValue::from_str(v).with_context(|| format!("invalid header value for {k}"))?;
        headers.insert(name, value);
    }

    let builder = match req.method.as_str() {
        "GET" => client.get(&req.url),
        "POST" => client.post(&req.url),
        other => return Err(anyhow!("unsupported method: {other}")),
    }
    .headers(headers);

    Ok(match &req.body {
        Body::Empty => builder,
        Body::Json(s) => builder.body(s.clone()),
        Body::MultipartFormData { bytes, .. } => builder.body(bytes.clone()),
    })
}

/// Executes a buffered request. Callers inspect `status` themselves.
pub async fn execute(req: &HttpRequest) -> anyhow::Result<HttpResponse> {
    let client = build_client(Some(Duration::from_secs(30)))?;
    let resp = prepare(&client, req)?
        .send()
        .await
        .context("http request failed")?;
    let status = resp.status().as_u16();
    let body = resp
        .bytes()
        .await
        .context("failed reading response body")?
        .to_vec();

    Ok(HttpResponse { status, body })
}

/// Opens a streaming response. No total timeout is applied; how long the
/// stream may stall is the consumer's decision, not the transport's.
pub async fn open_stream(req: &HttpRequest) -> anyhow::Result<reqwest::Response> {
    let client = build_client(None)?;
    let resp = prepare(&client, req)?
        .send()
        .await
        .context("failed opening event stream")?;

    let status = resp.status();
    if !status.is_success() {
        let detail = resp.text().await.unwrap_or_default();
        return Err(anyhow!("upstream returned {status}: {detail}"));
    }
    Ok(resp)
}

/// Opens a stream and decodes it into assistant events as chunks arrive.
pub async fn stream_events(
    req: &HttpRequest,
) -> anyhow::Result<BoxStream<'static, anyhow::Result<AssistantEvent>>> {
    let resp = open_stream(req).await?;
    let mut parser = SseParser::new();

    Ok(resp
        .bytes_stream()
        .map(move |chunk| match chunk {
            Ok(bytes) => parser
                .feed(&bytes)
                .iter()
                .map(|frame| Ok(decode_event(frame)))
                .collect::<Vec<_>>(),
            Err(e) => vec![Err(anyhow::Error::new(e).context("reading event stream"))],
        })
        .flat_map(futures_util::stream::iter)
        .boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistants;
    use advisor_core::config::AdvisorConfig;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cfg(base: String) -> AdvisorConfig {
        AdvisorConfig {
            assistant_id: "asst_1".into(),
            api_key: "k".into(),
            api_base: base,
            starters: vec![],
            welcome_blurb: String::new(),
            welcome_audio_url: None,
        }
    }

    #[tokio::test]
    async fn execute_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads"))
            .and(header("authorization", "Bearer k"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"id":"thread_abc"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let req = assistants::build_create_thread(&cfg(server.uri()));
        let resp = execute(&req).await.unwrap();
        assert!(resp.is_success());
        assert_eq!(
            crate::parse::parse_thread_created(&resp.body).unwrap(),
            "thread_abc"
        );
    }

    #[tokio::test]
    async fn stream_events_decodes_a_full_run() {
        let server = MockServer::start().await;
        let sse = concat!(
            "event: thread.run.created\ndata: {\"id\":\"run_1\"}\n\n",
            "event: thread.message.created\ndata: {\"id\":\"msg_1\"}\n\n",
            "event: thread.message.delta\ndata: {\"delta\":{\"content\":[{\"index\":0,\"type\":\"text\",\"text\":{\"value\":\"Hi\"}}]}}\n\n",
            "event: thread.run.completed\ndata: {\"id\":\"run_1\"}\n\n",
            "event: done\ndata: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/threads/thread_abc/runs"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .mount(&server)
            .await;

        let req = assistants::build_stream_run(&cfg(server.uri()), "thread_abc");
        let stream = stream_events(&req).await.unwrap();
        let events: Vec<AssistantEvent> = stream.map(|e| e.unwrap()).collect().await;

        assert_eq!(
            events,
            vec![
                AssistantEvent::Other("thread.run.created".into()),
                AssistantEvent::TextCreated,
                AssistantEvent::TextDelta {
                    value: Some("Hi".into())
                },
                AssistantEvent::RunCompleted,
                AssistantEvent::Other("done".into()),
            ]
        );
    }

    #[tokio::test]
    async fn open_stream_surfaces_upstream_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/thread_abc/runs"))
            .respond_with(ResponseTemplate::new(401).set_body_raw(
                r#"{"error":{"message":"bad key"}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let req = assistants::build_stream_run(&cfg(server.uri()), "thread_abc");
        let err = open_stream(&req).await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}

// src/sweep/http.rs
// =============================================================================
// Executes one ProbeTask as one HTTP request.
//
// Key behavior:
// - One attempt per task, no retries
// - Fixed per-request timeout, a timeout is just another failed result
// - Only the status code and headers are kept, the body is never read
// - Every failure (bad URL, refused connection, DNS, timeout) becomes a
//   ProbeResult instead of an error, so one bad request can't stop the sweep
//
// Probers are called from many spawned workers at once, so they must not
// keep any per-call mutable state.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;

use super::task::{Headers, ProbeResult, ProbeTask};
use crate::error::{ProbeError, SweepResult};

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs a single task to completion. Must never panic; failures are results.
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    async fn probe(&self, task: &ProbeTask) -> ProbeResult;
}

/// The real prober, backed by one shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> SweepResult<Self> {
        // Redirects are followed, the final response is what gets reported
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, task: &ProbeTask) -> ProbeResult {
        let url = task.url();

        let request = match self.client.request(task.method.clone(), url.as_str()).build() {
            Ok(request) => request,
            Err(e) => return ProbeResult::failed(task, ProbeError::from(e)),
        };

        match self.client.execute(request).await {
            // Dropping the response here closes the body without reading it
            Ok(response) => {
                let status_code = response.status().as_u16();
                let headers = collect_headers(response.headers());
                ProbeResult::response(task, status_code, headers)
            }
            Err(e) => ProbeResult::failed(task, ProbeError::from(e)),
        }
    }
}

fn collect_headers(map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        headers
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    headers
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a trait for something with one real implementation?
//    - The dispatcher only needs "turn a task into a result"
//    - Tests plug in stub probers that block, fail or count on demand,
//      with no network involved
//
// 2. Why #[async_trait]?
//    - The dispatcher spawns probes onto the runtime, so the returned future
//      must be Send; async_trait boxes it as Pin<Box<dyn Future + Send>>
//
// 3. Why build() then execute()?
//    - Errors from building the request (bad URL) and from sending it
//      (network) both become results, but they are classified separately
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::task::ProbeOutcome;
    use reqwest::Method;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Minimal HTTP server: answers every connection with `response`,
    // or never answers at all when `response` is None
    async fn serve(response: Option<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    match response {
                        Some(response) => {
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        }
                        None => tokio::time::sleep(Duration::from_secs(30)).await,
                    }
                });
            }
        });

        format!("http://{}", addr)
    }

    fn task(target: &str, path: &str, method: Method) -> ProbeTask {
        ProbeTask {
            id: 7,
            target: Arc::from(target),
            path: Arc::from(path),
            method,
        }
    }

    #[tokio::test]
    async fn test_probe_captures_status_and_headers() {
        let target = serve(Some(
            "HTTP/1.1 403 Forbidden\r\n\
             X-Probe: one\r\n\
             X-Probe: two\r\n\
             Content-Length: 5\r\n\
             Connection: close\r\n\r\n\
             nope!",
        ))
        .await;

        let prober = HttpProber::new(DEFAULT_TIMEOUT).unwrap();
        let result = prober.probe(&task(&target, "admin", Method::POST)).await;

        assert_eq!(result.id, 7);
        assert_eq!(result.method, Method::POST);
        assert_eq!(result.url, format!("{}/admin", target));
        match result.outcome {
            ProbeOutcome::Response {
                status_code,
                headers,
            } => {
                assert_eq!(status_code, 403);
                assert_eq!(headers["x-probe"], vec!["one", "two"]);
                assert_eq!(headers["content-length"], vec!["5"]);
            }
            other => panic!("expected a response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_timeout_is_a_result() {
        let target = serve(None).await;

        let prober = HttpProber::new(Duration::from_millis(200)).unwrap();
        let result = prober.probe(&task(&target, "slow", Method::GET)).await;

        assert!(matches!(
            result.outcome,
            ProbeOutcome::Failed {
                error: ProbeError::Timeout(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_probe_connection_refused_is_a_result() {
        // Grab a free port, then close it so nothing is listening there
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober = HttpProber::new(DEFAULT_TIMEOUT).unwrap();
        let result = prober
            .probe(&task(&format!("http://{}", addr), "x", Method::DELETE))
            .await;

        assert!(result.is_failure());
        assert_eq!(result.url, format!("http://{}/x", addr));
        assert!(matches!(
            result.outcome,
            ProbeOutcome::Failed {
                error: ProbeError::Connect(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_probe_malformed_url_is_a_result() {
        let prober = HttpProber::new(DEFAULT_TIMEOUT).unwrap();
        let result = prober.probe(&task("not a url", "admin", Method::GET)).await;

        assert_eq!(result.url, "not a url/admin");
        assert!(matches!(
            result.outcome,
            ProbeOutcome::Failed {
                error: ProbeError::RequestConstruction(_)
            }
        ));
    }

    #[test]
    fn test_collect_headers_lossy() {
        let mut map = HeaderMap::new();
        map.append("x-raw", reqwest::header::HeaderValue::from_bytes(b"caf\xe9").unwrap());
        let headers = collect_headers(&map);
        assert_eq!(headers["x-raw"].len(), 1);
        assert!(headers["x-raw"][0].starts_with("caf"));
    }
}

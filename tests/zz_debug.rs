use starplan::crawler::{FetchPolicy, Fetcher, BROWSER_USER_AGENT};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn debug_capture_ua() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let policy = FetchPolicy {
        max_attempts: 1,
        backoff_unit: Duration::from_secs(0),
        timeout: Duration::from_secs(5),
    };
    let f = Fetcher::new(policy, Arc::new(AtomicBool::new(false))).unwrap();
    let _ = f.fetch(&format!("{}/page", server.uri()), None).await;

    let reqs = server.received_requests().await.unwrap();
    for r in reqs {
        let ua: Vec<_> = r.headers.iter().filter(|(k,_)| k.as_str().eq_ignore_ascii_case("user-agent")).collect();
        println!("UA_RECEIVED={:?}", ua);
        println!("EXPECTED={:?}", BROWSER_USER_AGENT);
    }
}

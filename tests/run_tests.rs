//! End-to-end run tests against a mock catalog site
//!
//! A wiremock server plays the catalog: an entry page listing two
//! institutions, an institution page per school, and a detail page per
//! department. Pacing and backoff run at zero so the suite stays fast.

use starplan::crawler::Runner;
use starplan::progress::{Phase, ProgressSink, RunProgress};
use starplan::{Config, DepartmentRecord, JobRegistry, JobStatus, RunRequest};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Progress sink that records every emitted snapshot
#[derive(Default)]
struct CollectSink(Mutex<Vec<RunProgress>>);

impl ProgressSink for CollectSink {
    fn emit(&self, progress: RunProgress) {
        self.0.lock().unwrap().push(progress);
    }
}

impl CollectSink {
    fn events(&self) -> Vec<RunProgress> {
        self.0.lock().unwrap().clone()
    }
}

fn test_config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.fetch.max_attempts = 2;
    config.fetch.backoff_unit_secs = 0;
    config.fetch.timeout_secs = 5;
    config.pacing.min_delay_secs = 0.0;
    config.pacing.max_delay_secs = 0.0;
    config.output.directory = output_dir.display().to_string();
    config
}

fn detail_page(code: &str, name: &str, quota: &str) -> String {
    format!(
        r#"<html><body>
        <span class="colname">甲大學</span>
        <span class="gsdname">({code}){name}</span>
        <table border="1">
            <tr><td>學群類別</td><td>第二類學群</td></tr>
            <tr><td>招生名額</td><td>{quota}</td></tr>
            <tr><td>可填志願數</td><td>4</td></tr>
            <tr><td>國文</td><td>均標</td></tr>
            <tr><td>分發比序項目</td><td>1.在校學業成績<br>2.面試</td></tr>
        </table>
        </body></html>"#
    )
}

/// Mounts the full mock catalog: two institutions, three departments
async fn mount_catalog(server: &MockServer) -> String {
    let base = server.uri();
    let entry_url = format!("{base}/main.php");

    Mock::given(method("GET"))
        .and(path("/main.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><table>
            <tr><td><a href="ShowSchGsd.php?colno=001">甲大學</a></td></tr>
            <tr><td><a href="ShowSchGsd.php?colno=002">乙大學</a></td></tr>
            </table></body></html>"#,
        ))
        .mount(server)
        .await;

    // Institution pages must be fetched with the entry page as referer.
    Mock::given(method("GET"))
        .and(path("/ShowSchGsd.php"))
        .and(query_param("colno", "001"))
        .and(header("Referer", entry_url.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
            <a href="./html/115_00101.htm">資訊工程學系</a>
            <a href="./html/115_00102.htm">電機工程學系</a>
            </body></html>"#,
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ShowSchGsd.php"))
        .and(query_param("colno", "002"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
            <a href="./html/115_00201.htm">外國語文學系</a>
            </body></html>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/html/115_00101.htm"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("00101", "資訊工程學系", "12")),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/html/115_00102.htm"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("00102", "電機工程學系", "8")),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/html/115_00201.htm"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("00201", "外國語文學系", "5")),
        )
        .mount(server)
        .await;

    entry_url
}

async fn run_to_records(
    config: &Config,
    entry_url: &str,
    targets: Option<&[String]>,
    sink: &CollectSink,
) -> Vec<DepartmentRecord> {
    let stop = Arc::new(AtomicBool::new(false));
    let results = Arc::new(Mutex::new(Vec::new()));
    let runner = Runner::new(config, stop, results.clone()).expect("runner builds");
    runner.run(entry_url, targets, sink).await;
    let records = results.lock().unwrap().clone();
    records
}

async fn wait_terminal(registry: &JobRegistry, id: &uuid::Uuid) -> JobStatus {
    let handle = registry.get(id).expect("job exists");
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if handle.status().is_terminal() {
                return handle.status();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("job reaches a terminal state")
}

#[tokio::test]
async fn test_full_run_extracts_all_departments_in_discovery_order() {
    let server = MockServer::start().await;
    let entry_url = mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let sink = CollectSink::default();
    let records = run_to_records(&test_config(dir.path()), &entry_url, None, &sink).await;

    assert_eq!(records.len(), 3);
    let codes: Vec<&str> = records.iter().map(|r| r.department_code.as_str()).collect();
    assert_eq!(codes, vec!["00101", "00102", "00201"]);

    assert_eq!(records[0].department_name, "資訊工程學系");
    assert_eq!(records[0].base_quota, "12");
    assert_eq!(records[0].base_quota_choices, "4");
    assert_eq!(records[0].thresholds[0], "均標");
    assert_eq!(records[0].ranking[0], "在校學業成績");
    assert!(records[0].source_url.ends_with("/html/115_00101.htm"));
}

#[tokio::test]
async fn test_progress_phases_are_ordered() {
    let server = MockServer::start().await;
    let entry_url = mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let sink = CollectSink::default();
    run_to_records(&test_config(dir.path()), &entry_url, None, &sink).await;

    let steps: Vec<(Phase, usize, usize)> = sink
        .events()
        .iter()
        .map(|p| (p.phase, p.current, p.total))
        .collect();
    assert_eq!(
        steps,
        vec![
            (Phase::Scanning, 0, 2),
            (Phase::Scanning, 1, 2),
            (Phase::Details, 0, 3),
            (Phase::Details, 1, 3),
            (Phase::Details, 2, 3),
            (Phase::Done, 3, 3),
        ]
    );

    // The final snapshot reads as fully done.
    assert_eq!(sink.events().last().unwrap().percent(), 100);
}

#[tokio::test]
async fn test_target_filter_restricts_to_named_institution() {
    let server = MockServer::start().await;
    let entry_url = mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let sink = CollectSink::default();
    let targets = vec!["乙大學".to_string()];
    let records =
        run_to_records(&test_config(dir.path()), &entry_url, Some(&targets), &sink).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].department_code, "00201");
    assert!(records
        .iter()
        .all(|r| r.source_url.contains("115_00201")));
}

#[tokio::test]
async fn test_unobtainable_department_page_is_skipped() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // Mounted first, so it shadows the catalog's page for this department.
    Mock::given(method("GET"))
        .and(path("/html/115_00102.htm"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let entry_url = mount_catalog(&server).await;

    let sink = CollectSink::default();
    let records = run_to_records(&test_config(dir.path()), &entry_url, None, &sink).await;

    // The failing department is skipped; the run continues.
    let codes: Vec<&str> = records.iter().map(|r| r.department_code.as_str()).collect();
    assert_eq!(codes, vec!["00101", "00201"]);
}

#[tokio::test]
async fn test_empty_catalog_completes_with_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/main.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>本年度尚未公告</body></html>"))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let registry = JobRegistry::new(test_config(dir.path()));
    let id = registry
        .start(RunRequest::new(format!("{}/main.php", server.uri())))
        .unwrap();

    let status = wait_terminal(&registry, &id).await;
    assert_eq!(status, JobStatus::Completed);

    let handle = registry.get(&id).unwrap();
    assert!(handle.results().is_empty());
    assert!(handle.error().is_none());
}

#[tokio::test]
async fn test_registry_lifecycle_and_csv_export() {
    let server = MockServer::start().await;
    let entry_url = mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let registry = JobRegistry::new(test_config(dir.path()));
    let export_path = dir.path().join("records.csv");
    let id = registry
        .start(RunRequest {
            entry_url,
            targets: None,
            export_path: Some(export_path.clone()),
        })
        .unwrap();

    let status = wait_terminal(&registry, &id).await;
    assert_eq!(status, JobStatus::Completed);

    let handle = registry.get(&id).unwrap();
    assert_eq!(handle.results().len(), 3);
    assert_eq!(handle.export_path(), Some(export_path.clone()));
    assert!(handle.finished_at().is_some());

    let content = std::fs::read_to_string(&export_path).unwrap();
    let mut lines = content.lines();
    assert!(lines.next().unwrap().starts_with("學校名稱,學系名稱,校系代碼"));
    assert_eq!(lines.count(), 3);
}

#[tokio::test]
async fn test_default_export_filename_carries_job_id() {
    let server = MockServer::start().await;
    let entry_url = mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let registry = JobRegistry::new(test_config(dir.path()));
    let id = registry.start(RunRequest::new(entry_url)).unwrap();

    let status = wait_terminal(&registry, &id).await;
    assert_eq!(status, JobStatus::Completed);

    let handle = registry.get(&id).unwrap();
    let path = handle.export_path().unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        format!("star_plan_{id}.csv")
    );
    assert!(path.exists());
}

#[tokio::test]
async fn test_export_failure_marks_job_errored_but_keeps_results() {
    let server = MockServer::start().await;
    let entry_url = mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let registry = JobRegistry::new(test_config(dir.path()));
    let id = registry
        .start(RunRequest {
            entry_url,
            targets: None,
            export_path: Some(dir.path().join("missing_dir").join("out.csv")),
        })
        .unwrap();

    let status = wait_terminal(&registry, &id).await;
    assert_eq!(status, JobStatus::Error);

    let handle = registry.get(&id).unwrap();
    assert!(handle.error().is_some());
    // Partial results survive an errored run.
    assert_eq!(handle.results().len(), 3);
}

#[tokio::test]
async fn test_stop_before_work_completes_with_no_records() {
    let server = MockServer::start().await;
    let entry_url = mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let registry = JobRegistry::new(test_config(dir.path()));
    let id = registry.start(RunRequest::new(entry_url)).unwrap();
    registry.stop(&id).unwrap();

    let status = wait_terminal(&registry, &id).await;
    assert_eq!(status, JobStatus::Completed);
    assert!(registry.get(&id).unwrap().results().is_empty());
}

//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full chunk, fetch, extract and checkpoint cycle end-to-end.

use reel_sweep::config::{
    load_config, Config, CrawlerConfig, OutputConfig, ShowcaseConfig, TargetConfig,
    UserAgentConfig,
};
use reel_sweep::crawler::Coordinator;
use reel_sweep::output::{list_checkpoints, load_checkpoint, CheckpointWriter};
use reel_sweep::record::REACTIONS;
use reel_sweep::{Record, SweepError};
use std::io::Write;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FULL_PAGE: &str = r#"<html><body>
    <h1 class="title__main-text">Солярис</h1>
    <div class="MovieDetails__original">Solaris</div>
    <table>
        <tr><td class="info-row__title">Страна</td><td class="info-row__value">СССР</td></tr>
        <tr><td class="info-row__title">Год</td><td class="info-row__value">1972</td></tr>
    </table>
    <div class="ShowRating-value"><div>8.1</div><span class="Counter">(4 210)</span></div>
    <div class="movie-poster__picture"><img src="https://img.example/solaris.jpg"></div>
    <div class="Reactions">
        <button class="ReactionButton"><span class="ReactionButton__emoji">🤯</span><span class="ReactionButton__counter">31</span></button>
    </div>
    <div class="Characters__list">
        <a class="Character"><div class="Character__name">Донатас Банионис</div></a>
        <a class="Character"><div class="Character__name">Наталья Бондарчук</div></a>
    </div>
    <div class="SlidingTabs__descriptioncontent"><div class="HtmlContent">Психолог прибывает на станцию.</div></div>
</body></html>"#;

const NO_RATING_PAGE: &str = r#"<html><body>
    <h1 class="title__main-text">Неизвестный фильм</h1>
</body></html>"#;

/// Creates a test configuration pointed at the mock server
fn create_test_config(
    server: &MockServer,
    dir: &TempDir,
    last_id: u64,
    chunk_size: u64,
    max_concurrent_requests: u32,
) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_concurrent_requests,
            chunk_size,
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
            min_delay_ms: 0,
            max_delay_ms: 0,
        },
        target: TargetConfig {
            base_url: format!("{}/movie/", server.uri()),
            first_id: 1,
            last_id,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: Some("https://example.com/contact".to_string()),
        },
        output: OutputConfig {
            checkpoint_dir: checkpoint_dir(dir),
        },
        showcase: ShowcaseConfig::default(),
    }
}

fn checkpoint_dir(dir: &TempDir) -> String {
    dir.path().join("checkpoints").display().to_string()
}

async fn mount_page(server: &MockServer, id: u64, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/movie/{}", id)))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

fn find<'a>(records: &'a [Record], server: &MockServer, id: u64) -> Option<&'a Record> {
    let url = format!("{}/movie/{}", server.uri(), id);
    records.iter().find(|r| r.url == url)
}

#[tokio::test]
async fn test_three_identifier_scenario() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 404, "<html>not found</html>").await;
    mount_page(&server, 2, 200, NO_RATING_PAGE).await;
    mount_page(&server, 3, 200, FULL_PAGE).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 3, 3, 5);
    let mut coordinator = Coordinator::new(config, true).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.chunks_processed, 1);
    assert_eq!(report.records_added, 2);
    assert_eq!(report.absent.get("not_found"), Some(&1));

    let checkpoint = dir.path().join("checkpoints").join("checkpoint_3.csv");
    let records = load_checkpoint(&checkpoint).unwrap();
    assert_eq!(records.len(), 2);
    assert!(find(&records, &server, 1).is_none());

    let sparse = find(&records, &server, 2).unwrap();
    assert_eq!(sparse.title.as_deref(), Some("Неизвестный фильм"));
    assert_eq!(sparse.rating, None);
    assert_eq!(sparse.top, None);
    for (_, label) in REACTIONS {
        assert_eq!(sparse.reaction(label), Some(0), "reaction {}", label);
    }

    let full = find(&records, &server, 3).unwrap();
    assert_eq!(full.title_en.as_deref(), Some("Solaris"));
    assert_eq!(full.rating, Some(8.1));
    assert_eq!(full.top, Some(4210));
    assert_eq!(full.info_value("Год"), Some("1972"));
    assert_eq!(full.reaction("mindblown"), Some(31));
    assert_eq!(full.actors, "Донатас Банионис, Наталья Бондарчук");
}

#[tokio::test]
async fn test_checkpoints_are_cumulative() {
    let server = MockServer::start().await;
    for id in 1..=10 {
        if id % 2 == 0 {
            mount_page(&server, id, 200, FULL_PAGE).await;
        } else {
            mount_page(&server, id, 404, "").await;
        }
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 10, 3, 4);
    let mut coordinator = Coordinator::new(config, true).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.chunks_processed, 4);
    assert_eq!(report.ids_covered, 10);

    let checkpoints = list_checkpoints(&dir.path().join("checkpoints")).unwrap();
    assert_eq!(
        checkpoints.iter().map(|c| c.processed).collect::<Vec<_>>(),
        vec![3, 6, 9, 10]
    );

    let counts: Vec<usize> = checkpoints
        .iter()
        .map(|c| load_checkpoint(&c.path).unwrap().len())
        .collect();
    assert_eq!(counts, vec![1, 3, 4, 5]);
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_concurrency_bound_holds_across_chunks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(NO_RATING_PAGE)
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 24, 8, 3);
    let mut coordinator = Coordinator::new(config, true).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.records_added, 24);
    assert!(report.peak_in_flight >= 1);
    assert!(
        report.peak_in_flight <= 3,
        "peak {} exceeded the limit",
        report.peak_in_flight
    );
    assert_eq!(coordinator.permits().in_flight(), 0);
}

#[tokio::test]
async fn test_resume_skips_covered_identifiers() {
    let server = MockServer::start().await;
    for id in 1..=4 {
        Mock::given(method("GET"))
            .and(path(format!("/movie/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(FULL_PAGE))
            .expect(0)
            .mount(&server)
            .await;
    }
    for id in 5..=8 {
        mount_page(&server, id, 200, NO_RATING_PAGE).await;
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 8, 4, 4);

    let writer = CheckpointWriter::new(&config.output.checkpoint_dir);
    writer.ensure_dir().unwrap();
    let earlier = vec![
        Record::new(format!("{}/movie/2", server.uri())),
        Record::new(format!("{}/movie/4", server.uri())),
    ];
    writer.write(&earlier, 4).unwrap();

    let mut coordinator = Coordinator::new(config, false).unwrap();
    assert_eq!(coordinator.resume_offset(), 4);
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.ids_processed, 4);
    assert_eq!(report.records_added, 4);
    assert_eq!(report.records_total, 6);

    let records = load_checkpoint(&dir.path().join("checkpoints").join("checkpoint_8.csv")).unwrap();
    assert_eq!(records.len(), 6);
    assert!(find(&records, &server, 2).is_some());
    assert!(find(&records, &server, 7).is_some());
}

#[tokio::test]
async fn test_fresh_refuses_non_empty_checkpoint_dir() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 4, 4, 2);

    let writer = CheckpointWriter::new(&config.output.checkpoint_dir);
    writer.ensure_dir().unwrap();
    writer.write(&[], 4).unwrap();

    let result = Coordinator::new(config.clone(), true);
    assert!(matches!(
        result,
        Err(SweepError::CheckpointDirNotEmpty { .. })
    ));

    // Without --fresh the same directory is resumed
    let coordinator = Coordinator::new(config, false).unwrap();
    assert_eq!(coordinator.resume_offset(), 4);
}

#[tokio::test]
async fn test_crawl_from_toml_config() {
    let server = MockServer::start().await;
    mount_page(&server, 7, 200, FULL_PAGE).await;
    mount_page(&server, 8, 404, "").await;

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    write!(
        file,
        r#"
[crawler]
max-concurrent-requests = 2
chunk-size = 5
request-timeout-secs = 5

[target]
base-url = "{}/movie/"
first-id = 7
last-id = 8

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"

[output]
checkpoint-dir = "{}"
"#,
        server.uri(),
        checkpoint_dir(&dir)
    )
    .unwrap();
    drop(file);

    let config = load_config(&config_path).unwrap();
    let mut coordinator = Coordinator::new(config, true).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.records_total, 1);
    let path = report.last_checkpoint.unwrap();
    assert!(path.ends_with("checkpoint_2.csv"));
}

#[tokio::test]
async fn test_failed_checkpoint_write_stops_the_run() {
    let server = MockServer::start().await;
    for id in 1..=4 {
        mount_page(&server, id, 200, NO_RATING_PAGE).await;
    }
    for id in 5..=6 {
        Mock::given(method("GET"))
            .and(path(format!("/movie/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(FULL_PAGE))
            .expect(0)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, 6, 2, 2);
    let checkpoints = dir.path().join("checkpoints");

    // A directory in place of the second chunk's partial file makes that write fail
    std::fs::create_dir_all(checkpoints.join("checkpoint_4.csv.partial")).unwrap();

    let mut coordinator = Coordinator::new(config, true).unwrap();
    let result = coordinator.run().await;

    assert!(matches!(result, Err(SweepError::Io(_))));
    assert_eq!(
        list_checkpoints(&checkpoints)
            .unwrap()
            .iter()
            .map(|c| c.processed)
            .collect::<Vec<_>>(),
        vec![2]
    );
}

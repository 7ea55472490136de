//! Account resolution, pagination, and CSV output

use crate::common::*;
use mp_harvest::config::{Config, DelayConfig};
use mp_harvest::crawler::{harvest_pages, resolve_token, AccountOutcome, FixedSelector, Pacer};
use mp_harvest::output::{output_path_for, MemorySink};
use mp_harvest::{Harvester, JsonFileStore, LiveSession, MpClient, SessionStore};
use serde_json::json;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Server with a valid stored session and two matching accounts
async fn setup(server: &MockServer, dir: &TempDir, budget: usize) -> Config {
    let mut config = test_config(server, dir.path());
    config.crawl.accounts = vec!["geek time".to_string()];
    config.crawl.max_articles = budget;

    JsonFileStore::new(config.paths.cookie_file.clone())
        .save(&full_cookies())
        .unwrap();

    mount_valid_home(server).await;
    mount_search(server, &[("Geek Time", "MzA1"), ("Geek Time Fans", "MzB2")]).await;
    config
}

fn harvester(config: Config) -> Harvester<ScriptedLauncher> {
    Harvester::new(config, ScriptedLauncher::new(vec![])).unwrap()
}

#[tokio::test]
async fn test_geek_time_stops_mid_second_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = setup(&server, &dir, 7).await;
    let output = output_path_for(&config.paths.output_dir, "geek time");

    mount_listing(
        &server,
        "MzB2",
        0,
        ResponseTemplate::new(200).set_body_json(listing_body(&server, 12, 0, 5)),
    )
    .await;
    mount_listing(
        &server,
        "MzB2",
        5,
        ResponseTemplate::new(200).set_body_json(listing_body(&server, 12, 5, 5)),
    )
    .await;
    mount_articles(&server).await;

    let harvester = harvester(config);
    let summary = harvester.run(&mut FixedSelector::new(2)).await.unwrap();

    assert_eq!(
        summary.outcome("geek time"),
        Some(&AccountOutcome::Completed { saved: 7 })
    );
    assert_eq!(harvester.launcher().launches.get(), 0);
    assert_eq!(listing_offsets(&server).await, vec![0, 5]);

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 7);
    for (n, (title, link, content)) in rows.iter().enumerate() {
        assert_eq!(title, &format!("Article {}", n));
        assert_eq!(link, &article_link(&server, n));
        assert_eq!(content, "Article body.");
    }
}

#[tokio::test]
async fn test_failed_article_is_written_empty() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = setup(&server, &dir, 10).await;
    let output = output_path_for(&config.paths.output_dir, "geek time");

    mount_listing(
        &server,
        "MzB2",
        0,
        ResponseTemplate::new(200).set_body_json(listing_body(&server, 5, 0, 5)),
    )
    .await;
    mount_listing(
        &server,
        "MzB2",
        5,
        ResponseTemplate::new(200).set_body_json(listing_body(&server, 5, 5, 0)),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/s/article-2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_articles(&server).await;

    let summary = harvester(config)
        .run(&mut FixedSelector::new(2))
        .await
        .unwrap();

    assert_eq!(
        summary.outcome("geek time"),
        Some(&AccountOutcome::Completed { saved: 5 })
    );

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 5);
    for (n, (_, _, content)) in rows.iter().enumerate() {
        if n == 2 {
            assert!(content.is_empty());
        } else {
            assert_eq!(content, "Article body.");
        }
    }
}

#[tokio::test]
async fn test_no_candidates_creates_no_file() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, dir.path());
    config.crawl.accounts = vec!["nobody".to_string()];
    JsonFileStore::new(config.paths.cookie_file.clone())
        .save(&full_cookies())
        .unwrap();
    mount_valid_home(&server).await;
    mount_search(&server, &[]).await;

    let output = output_path_for(&config.paths.output_dir, "nobody");
    let summary = harvester(config)
        .run(&mut FixedSelector::new(1))
        .await
        .unwrap();

    assert_eq!(summary.outcome("nobody"), Some(&AccountOutcome::NoMatch));
    assert!(!output.exists());
    assert!(listing_offsets(&server).await.is_empty());
}

#[tokio::test]
async fn test_declined_selection_creates_no_file() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = setup(&server, &dir, 5).await;
    let output = output_path_for(&config.paths.output_dir, "geek time");

    let summary = harvester(config)
        .run(&mut FixedSelector::new(9))
        .await
        .unwrap();

    assert_eq!(summary.outcome("geek time"), Some(&AccountOutcome::Cancelled));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_error_status_keeps_written_rows() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = setup(&server, &dir, 10).await;
    let output = output_path_for(&config.paths.output_dir, "geek time");

    mount_listing(
        &server,
        "MzA1",
        0,
        ResponseTemplate::new(200).set_body_json(listing_body(&server, 20, 0, 5)),
    )
    .await;
    mount_listing(
        &server,
        "MzA1",
        5,
        ResponseTemplate::new(200).set_body_json(json!({
            "base_resp": { "ret": 200003, "err_msg": "invalid session" },
        })),
    )
    .await;
    mount_articles(&server).await;

    let summary = harvester(config)
        .run(&mut FixedSelector::new(1))
        .await
        .unwrap();

    match summary.outcome("geek time") {
        Some(AccountOutcome::Failed { saved, reason }) => {
            assert_eq!(*saved, 5);
            assert!(reason.contains("200003"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(listing_offsets(&server).await, vec![0, 5]);
    assert_eq!(read_rows(&output).len(), 5);
}

#[tokio::test]
async fn test_one_failed_account_does_not_stop_the_next() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = setup(&server, &dir, 3).await;
    config.crawl.accounts = vec!["broken".to_string(), "geek time".to_string()];

    // First account's listing is malformed, second one is fine
    Mock::given(method("GET"))
        .and(path("/cgi-bin/appmsgpublish"))
        .and(wiremock::matchers::query_param("fakeid", "MzA1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "base_resp": { "ret": 0 }, "publish_page": "{oops" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_listing(
        &server,
        "MzA1",
        0,
        ResponseTemplate::new(200).set_body_json(listing_body(&server, 3, 0, 3)),
    )
    .await;
    mount_articles(&server).await;

    let summary = harvester(config)
        .run(&mut FixedSelector::new(1))
        .await
        .unwrap();

    assert!(matches!(
        summary.outcome("broken"),
        Some(AccountOutcome::Failed { saved: 0, .. })
    ));
    assert_eq!(
        summary.outcome("geek time"),
        Some(&AccountOutcome::Completed { saved: 3 })
    );
    assert_eq!(summary.total_saved(), 3);
}

#[tokio::test]
async fn test_offsets_advance_by_page_size_and_stop_at_budget() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, dir.path());

    for offset in (0..=20).step_by(5) {
        mount_listing(
            &server,
            "MzA1",
            offset,
            ResponseTemplate::new(200).set_body_json(listing_body(&server, 100, offset, 5)),
        )
        .await;
    }
    mount_articles(&server).await;

    let client = MpClient::new(&config.http).unwrap();
    let store = JsonFileStore::new(config.paths.cookie_file.clone());
    let mut session = LiveSession::new(full_cookies(), &store);
    let mut sink = MemorySink::default();

    harvest_pages(
        &client,
        "MzA1",
        TOKEN,
        15,
        &Pacer::immediate(),
        &mut session,
        &mut sink,
    )
    .await
    .unwrap();

    assert_eq!(sink.records.len(), 15);
    assert_eq!(listing_offsets(&server).await, vec![0, 5, 10]);
}

#[tokio::test]
async fn test_empty_last_page_ends_pagination() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, dir.path());

    mount_listing(
        &server,
        "MzA1",
        0,
        ResponseTemplate::new(200).set_body_json(listing_body(&server, 3, 0, 3)),
    )
    .await;
    mount_listing(
        &server,
        "MzA1",
        5,
        ResponseTemplate::new(200).set_body_json(listing_body(&server, 3, 5, 0)),
    )
    .await;
    mount_articles(&server).await;

    let client = MpClient::new(&config.http).unwrap();
    let store = JsonFileStore::new(config.paths.cookie_file.clone());
    let mut session = LiveSession::new(full_cookies(), &store);
    let mut sink = MemorySink::default();

    harvest_pages(
        &client,
        "MzA1",
        TOKEN,
        10,
        &Pacer::immediate(),
        &mut session,
        &mut sink,
    )
    .await
    .unwrap();

    assert_eq!(sink.records.len(), 3);
    assert_eq!(listing_offsets(&server).await, vec![0, 5]);
}

#[tokio::test]
async fn test_rotated_cookies_are_persisted() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, dir.path());

    mount_listing(
        &server,
        "MzA1",
        0,
        ResponseTemplate::new(200)
            .insert_header("set-cookie", "slave_sid=rotated; Path=/")
            .set_body_json(listing_body(&server, 1, 0, 1)),
    )
    .await;
    mount_articles(&server).await;

    let client = MpClient::new(&config.http).unwrap();
    let store = JsonFileStore::new(config.paths.cookie_file.clone());
    let mut session = LiveSession::new(full_cookies(), &store);
    let mut sink = MemorySink::default();

    harvest_pages(
        &client,
        "MzA1",
        TOKEN,
        1,
        &Pacer::immediate(),
        &mut session,
        &mut sink,
    )
    .await
    .unwrap();

    let stored = store.load().unwrap().unwrap();
    assert_eq!(stored.get("slave_sid"), Some("rotated"));
    assert_eq!(stored.get("uuid"), Some("uu"));
    assert_eq!(session.credentials().get("slave_sid"), Some("rotated"));
}

#[tokio::test]
async fn test_home_rotation_reaches_store_and_next_request() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, dir.path());
    config.crawl.accounts = vec!["geek time".to_string()];
    config.crawl.max_articles = 1;

    let store = JsonFileStore::new(config.paths.cookie_file.clone());
    store.save(&full_cookies()).unwrap();
    mount_rotating_home(&server, "slave_sid=rotated; Path=/").await;

    let rotated = credentials(&[
        ("ua_id", "ua"),
        ("uuid", "uu"),
        ("_clck", "ck"),
        ("slave_sid", "rotated"),
        ("slave_user", "gh_1"),
    ]);

    // Search only answers when the rotated cookie is sent
    Mock::given(method("GET"))
        .and(path("/cgi-bin/searchbiz"))
        .and(header("cookie", rotated.cookie_header().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base_resp": { "ret": 0 },
            "list": [{ "nickname": "Geek Time", "fakeid": "MzA1" }],
        })))
        .mount(&server)
        .await;
    mount_listing(
        &server,
        "MzA1",
        0,
        ResponseTemplate::new(200).set_body_json(listing_body(&server, 1, 0, 1)),
    )
    .await;
    mount_articles(&server).await;

    let summary = harvester(config)
        .run(&mut FixedSelector::new(1))
        .await
        .unwrap();

    assert_eq!(
        summary.outcome("geek time"),
        Some(&AccountOutcome::Completed { saved: 1 })
    );
    assert_eq!(store.load().unwrap(), Some(rotated));
}

#[tokio::test]
async fn test_resolve_token_absorbs_rotated_cookies() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, dir.path());
    mount_rotating_home(&server, "slave_sid=fresh; Path=/").await;

    let client = MpClient::new(&config.http).unwrap();
    let store = JsonFileStore::new(config.paths.cookie_file.clone());
    let mut session = LiveSession::new(full_cookies(), &store);

    let token = resolve_token(&client, &mut session).await.unwrap();

    assert_eq!(token, TOKEN);
    assert_eq!(session.credentials().get("slave_sid"), Some("fresh"));
    let stored = store.load().unwrap().unwrap();
    assert_eq!(stored.get("slave_sid"), Some("fresh"));
    assert_eq!(stored.get("slave_user"), Some("gh_1"));
}

#[tokio::test]
async fn test_slow_article_is_written_empty() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, dir.path());
    config.http.article_timeout_secs = 1;

    mount_listing(
        &server,
        "MzA1",
        0,
        ResponseTemplate::new(200).set_body_json(listing_body(&server, 2, 0, 2)),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/s/article-0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<div class="rich_media_content">late</div>"#)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_articles(&server).await;

    let client = MpClient::new(&config.http).unwrap();
    let store = JsonFileStore::new(config.paths.cookie_file.clone());
    let mut session = LiveSession::new(full_cookies(), &store);
    let mut sink = MemorySink::default();

    harvest_pages(
        &client,
        "MzA1",
        TOKEN,
        2,
        &Pacer::immediate(),
        &mut session,
        &mut sink,
    )
    .await
    .unwrap();

    assert_eq!(sink.records.len(), 2);
    assert_eq!(sink.records[0].title, "Article 0");
    assert!(sink.records[0].content.is_empty());
    assert_eq!(sink.records[1].content, "Article body.");
}

#[tokio::test]
async fn test_no_pause_after_last_budgeted_article() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, dir.path());

    mount_listing(
        &server,
        "MzA1",
        0,
        ResponseTemplate::new(200).set_body_json(listing_body(&server, 10, 0, 5)),
    )
    .await;
    mount_articles(&server).await;

    let client = MpClient::new(&config.http).unwrap();
    let store = JsonFileStore::new(config.paths.cookie_file.clone());
    let mut session = LiveSession::new(full_cookies(), &store);
    let mut sink = MemorySink::default();
    let pacer = Pacer::new(&DelayConfig {
        article_min_ms: 10_000,
        article_max_ms: 10_000,
        page_ms: 10_000,
    });

    let started = Instant::now();
    harvest_pages(&client, "MzA1", TOKEN, 1, &pacer, &mut session, &mut sink)
        .await
        .unwrap();

    assert_eq!(sink.records.len(), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(listing_offsets(&server).await, vec![0]);
}

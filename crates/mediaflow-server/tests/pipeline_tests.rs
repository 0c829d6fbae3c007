//! End-to-end pipeline tests against in-memory collaborators
//!
//! Coverage includes:
//! - Item counts through every stage, in both link modes
//! - Source order and permutation behaviour
//! - Abort on the first failure at each stage
//! - Screenshot signing flowing into the download stage

mod common;

use common::{FakeObjectStore, FakeRecordStore, TestEnvironment};
use mediaflow_server::config::LinkMode;
use mediaflow_server::pipeline::{PipelineError, Stage};
use wiremock::matchers::{method, path_regex, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_two_sources_per_child_mode() {
    let env = TestEnvironment::start(LinkMode::PerChild).await;
    let a = env.serve_image("/a.jpg").await;
    let b = env.serve_image("/b.jpg").await;

    let outcome = env
        .pipeline()
        .ingest_attachments("rec1", &format!("{},{}", a, b), &env.cancel)
        .await
        .unwrap();

    assert_eq!(outcome.parent_id, "rec1");
    assert_eq!(outcome.children.len(), 2);
    assert_eq!(outcome.patches_issued, 2);
    assert_eq!(env.store.put_count(), 2);
    assert_eq!(env.records.create_count(), 2);
    assert_eq!(env.records.patch_count(), 2);

    // Every patch carries exactly one child and targets the parent
    for (parent, ids) in env.records.patches.lock().unwrap().iter() {
        assert_eq!(parent, "rec1");
        assert_eq!(ids.len(), 1);
    }

    let mut expected = outcome.record_ids();
    expected.sort();
    assert_eq!(env.records.linked_ids("rec1"), expected);
    assert_eq!(env.leftover_files(), 0);
}

#[tokio::test]
async fn test_batch_mode_links_all_children_at_once() {
    let env = TestEnvironment::start(LinkMode::Batch).await;
    let mut urls = Vec::new();
    for n in 0..5 {
        urls.push(env.serve_image(&format!("/img{}.jpg", n)).await);
    }

    let outcome = env
        .pipeline()
        .ingest_attachments("recParent", &urls.join(","), &env.cancel)
        .await
        .unwrap();

    assert_eq!(outcome.children.len(), 5);
    assert_eq!(outcome.patches_issued, 1);

    let patches = env.records.patches.lock().unwrap();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].1, outcome.record_ids());
}

#[tokio::test]
async fn test_children_follow_source_order() {
    let env = TestEnvironment::start(LinkMode::Batch).await;
    let first = env.serve_bytes("/first.jpg", vec![1u8; 10]).await;
    let second = env.serve_bytes("/second.jpg", vec![2u8; 20]).await;
    let third = env.serve_bytes("/third.jpg", vec![3u8; 30]).await;

    let outcome = env
        .pipeline()
        .ingest_attachments("rec1", &format!("{},{},{}", first, second, third), &env.cancel)
        .await
        .unwrap();

    let indexes: Vec<usize> = outcome.children.iter().map(|c| c.source_index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);

    // Child i is backed by the bytes of source i
    let puts = env.store.puts.lock().unwrap();
    for (index, child) in outcome.children.iter().enumerate() {
        let put = puts
            .iter()
            .find(|p| p.key == child.backing_address.key)
            .unwrap();
        assert_eq!(put.size, ((index + 1) * 10) as u64);
        assert!(put.bytes.iter().all(|b| *b == (index + 1) as u8));
        assert!(child.backing_address.url.ends_with(&child.backing_address.key));
    }
}

#[tokio::test]
async fn test_permuted_sources_give_same_sizes() {
    let env = TestEnvironment::start(LinkMode::Batch).await;
    let a = env.serve_bytes("/a.jpg", vec![0u8; 3]).await;
    let b = env.serve_bytes("/b.jpg", vec![0u8; 7]).await;

    let pipeline = env.pipeline();
    pipeline
        .ingest_attachments("rec1", &format!("{},{}", a, b), &env.cancel)
        .await
        .unwrap();
    pipeline
        .ingest_attachments("rec1", &format!("{},{}", b, a), &env.cancel)
        .await
        .unwrap();

    let puts = env.store.puts.lock().unwrap();
    let mut first: Vec<u64> = puts[..2].iter().map(|p| p.size).collect();
    let mut second: Vec<u64> = puts[2..].iter().map(|p| p.size).collect();
    first.sort();
    second.sort();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_resubmission_creates_new_objects_and_records() {
    let env = TestEnvironment::start(LinkMode::Batch).await;
    let url = env.serve_image("/same.jpg").await;
    let pipeline = env.pipeline();

    let first = pipeline.ingest_attachments("rec1", &url, &env.cancel).await.unwrap();
    let second = pipeline.ingest_attachments("rec1", &url, &env.cancel).await.unwrap();

    assert_ne!(first.record_ids(), second.record_ids());
    assert_ne!(first.addresses(), second.addresses());
    assert_eq!(env.store.put_count(), 2);
    assert_eq!(env.records.create_count(), 2);
}

#[tokio::test]
async fn test_failed_download_aborts_before_upload() {
    let env = TestEnvironment::start(LinkMode::PerChild).await;
    let good = env.serve_image("/good.jpg").await;
    let bad = env.serve_status("/bad.jpg", 500).await;

    let err = env
        .pipeline()
        .ingest_attachments("rec1", &format!("{},{}", good, bad), &env.cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Stage { stage: Stage::Download, index: 1, .. }));
    assert!(err.is_upstream());
    assert_eq!(env.store.put_count(), 0);
    assert_eq!(env.records.create_count(), 0);
    assert_eq!(env.records.patch_count(), 0);
    assert_eq!(env.leftover_files(), 0);
}

#[tokio::test]
async fn test_failed_upload_aborts_before_records() {
    let env = TestEnvironment::with_fakes(
        LinkMode::PerChild,
        FakeObjectStore::failing(),
        FakeRecordStore::default(),
    )
    .await;
    let url = env.serve_image("/a.jpg").await;

    let err = env
        .pipeline()
        .ingest_attachments("rec1", &url, &env.cancel)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Upload));
    assert_eq!(env.records.create_count(), 0);
    assert_eq!(env.records.patch_count(), 0);
    assert_eq!(env.leftover_files(), 0);
}

#[tokio::test]
async fn test_failed_create_never_patches_parent() {
    let env = TestEnvironment::with_fakes(
        LinkMode::Batch,
        FakeObjectStore::default(),
        FakeRecordStore::failing_create(),
    )
    .await;
    let url = env.serve_image("/a.jpg").await;

    let err = env
        .pipeline()
        .ingest_attachments("rec1", &url, &env.cancel)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::CreateRecords));
    assert_eq!(env.store.put_count(), 1);
    assert_eq!(env.records.patch_count(), 0);
}

#[tokio::test]
async fn test_failed_link_fails_request() {
    let env = TestEnvironment::with_fakes(
        LinkMode::PerChild,
        FakeObjectStore::default(),
        FakeRecordStore::failing_link(),
    )
    .await;
    let url = env.serve_image("/a.jpg").await;

    let err = env
        .pipeline()
        .ingest_attachments("rec1", &url, &env.cancel)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Link));
    assert_eq!(env.records.create_count(), 1);
}

#[tokio::test]
async fn test_invalid_locator_runs_no_stage() {
    let env = TestEnvironment::start(LinkMode::Batch).await;
    let url = env.serve_image("/a.jpg").await;

    for locator in [format!("{},", url), format!("{},,{}", url, url), "ftp://x.test/a".to_string()] {
        let err = env
            .pipeline()
            .ingest_attachments("rec1", &locator, &env.cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    assert_eq!(env.store.put_count(), 0);
    assert!(env.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_request_stops_pipeline() {
    let env = TestEnvironment::start(LinkMode::Batch).await;
    let url = env.serve_image("/a.jpg").await;
    env.cancel.cancel();

    let err = env
        .pipeline()
        .ingest_attachments("rec1", &url, &env.cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Cancelled { stage: Stage::Download }));
    assert_eq!(env.records.create_count(), 0);
}

#[tokio::test]
async fn test_screenshot_fetches_signed_url() {
    let env = TestEnvironment::start(LinkMode::PerChild).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/render/testkey/[0-9a-f]{32}/image$"))
        .and(query_param("url", "https://listing.test/42"))
        .and(query_param("delay", "5"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .expect(1)
        .mount(&env.server)
        .await;

    let outcome = env
        .pipeline()
        .ingest_screenshot("rec1", "https://listing.test/42", &env.cancel)
        .await
        .unwrap();

    assert_eq!(outcome.children.len(), 1);
    assert_eq!(outcome.patches_issued, 1);
    assert!(outcome.children[0].backing_address.key.starts_with("screenshots/"));
    assert!(outcome.children[0].backing_address.key.ends_with(".png"));
}

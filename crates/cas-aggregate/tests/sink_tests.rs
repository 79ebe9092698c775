//! HTTP client contract tests against wiremock servers.

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cas_aggregate::concordances::BOOKMARK_HEADER;
use cas_aggregate::sinks::REQUEST_ID_HEADER;
use cas_aggregate::{
    AggregateError, CachePurger, ConcordanceResolver, GraphWriter, HttpConcordanceResolver,
    SearchOutcome, SearchWriter,
};
use cas_common::CanonicalConcept;

fn concept(uuid: &str, concept_type: &str, label: &str) -> CanonicalConcept {
    CanonicalConcept {
        pref_uuid: uuid.to_string(),
        pref_label: label.to_string(),
        concept_type: concept_type.to_string(),
        ..Default::default()
    }
}

// ============================================================================
// Concordance resolver
// ============================================================================

#[tokio::test]
async fn resolver_decodes_concordance_arrays() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/concordances/abc"))
        .and(header(BOOKMARK_HEADER, "bm-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"uuid": "abc", "authority": "Editorial", "authorityValue": "abc"},
            {"uuid": "def", "authority": "Wikidata", "authorityValue": "Q42"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = HttpConcordanceResolver::new(reqwest::Client::new(), &server.uri(), "Editorial");
    let records = resolver.resolve("abc", "bm-7").await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].authority, "Editorial");
    assert_eq!(records[1].authority_value, "Q42");
}

#[tokio::test]
async fn resolver_synthesizes_a_solo_record_on_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/concordances/abc"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let resolver = HttpConcordanceResolver::new(reqwest::Client::new(), &server.uri(), "Editorial");
    let records = resolver.resolve("abc", "").await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].uuid, "abc");
    assert_eq!(records[0].authority, "Editorial");
}

#[tokio::test]
async fn resolver_propagates_other_statuses_as_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let resolver = HttpConcordanceResolver::new(reqwest::Client::new(), &server.uri(), "Editorial");
    let err = resolver.resolve("abc", "").await.unwrap_err();
    assert!(matches!(err, AggregateError::Resolver(_)));
}

// ============================================================================
// Graph writer
// ============================================================================

#[tokio::test]
async fn graph_writer_puts_to_the_slugged_path_and_decodes_changes() {
    let server = MockServer::start().await;
    let concept = concept("abc", "Person", "Jane");

    Mock::given(method("PUT"))
        .and(path("/people/abc"))
        .and(header(REQUEST_ID_HEADER, "tid_9"))
        .and(body_json(&concept))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "updatedIds": ["abc"],
            "changedRecords": [{"event": "CONCEPT_UPDATED"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let writer = GraphWriter::new(reqwest::Client::new(), &server.uri());
    let change = writer.put(&concept, "people", "tid_9").await.unwrap();

    assert_eq!(change.updated_ids, vec!["abc"]);
    assert_eq!(change.changed_records.len(), 1);
}

#[tokio::test]
async fn graph_writer_treats_304_as_no_change() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let writer = GraphWriter::new(reqwest::Client::new(), &server.uri());
    let change = writer
        .put(&concept("abc", "Person", "Jane"), "people", "tid_9")
        .await
        .unwrap();
    assert!(change.updated_ids.is_empty());
}

#[tokio::test]
async fn graph_writer_tolerates_empty_2xx_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let writer = GraphWriter::new(reqwest::Client::new(), &server.uri());
    let change = writer
        .put(&concept("abc", "Person", "Jane"), "people", "tid_9")
        .await
        .unwrap();
    assert!(change.updated_ids.is_empty());
}

#[tokio::test]
async fn graph_writer_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503).set_body_string("graph down"))
        .mount(&server)
        .await;

    let writer = GraphWriter::new(reqwest::Client::new(), &server.uri());
    let err = writer
        .put(&concept("abc", "Person", "Jane"), "people", "tid_9")
        .await
        .unwrap_err();

    match err {
        AggregateError::Writer { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "graph down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Search writer
// ============================================================================

#[tokio::test]
async fn search_writer_soft_skips_unknown_types() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let writer = SearchWriter::new(reqwest::Client::new(), &server.uri());
    let outcome = writer
        .put(&concept("abc", "Brand", "Acme"), "brands", "tid_9")
        .await
        .unwrap();
    assert_eq!(outcome, SearchOutcome::SkippedNotFound);
}

#[tokio::test]
async fn search_writer_other_failures_are_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let writer = SearchWriter::new(reqwest::Client::new(), &server.uri());
    let err = writer
        .put(&concept("abc", "Brand", "Acme"), "brands", "tid_9")
        .await
        .unwrap_err();
    assert!(matches!(err, AggregateError::Search { status: 500 }));
}

#[tokio::test]
async fn search_writer_success() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/brands/abc"))
        .and(header(REQUEST_ID_HEADER, "tid_9"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let writer = SearchWriter::new(reqwest::Client::new(), &server.uri());
    let outcome = writer
        .put(&concept("abc", "Brand", "Acme"), "brands", "tid_9")
        .await
        .unwrap();
    assert_eq!(outcome, SearchOutcome::Written);
}

// ============================================================================
// Cache purger
// ============================================================================

#[tokio::test]
async fn purger_sends_every_target_as_a_query_param() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/purge"))
        .and(query_param("target", "/things/abc"))
        .and(query_param("target", "/concepts/abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let purger = CachePurger::new(reqwest::Client::new(), &server.uri());
    purger
        .purge(
            &["/things/abc".to_string(), "/concepts/abc".to_string()],
            "tid_9",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn purger_reports_failures_for_the_caller_to_swallow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let purger = CachePurger::new(reqwest::Client::new(), &server.uri());
    let err = purger.purge(&["/things/abc".to_string()], "tid_9").await.unwrap_err();
    assert!(matches!(err, AggregateError::Purger { status: 502 }));
}

#[tokio::test]
async fn purger_skips_the_request_when_there_is_nothing_to_purge() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let purger = CachePurger::new(reqwest::Client::new(), &server.uri());
    purger.purge(&[], "tid_9").await.unwrap();
}

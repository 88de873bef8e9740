use crate::services::stats_service::StatsService;
use crate::tests::common::{MockServer, result_row, vm_entity};
use chrono::Duration;
use std::sync::Arc;

async fn service(server: Arc<MockServer>) -> StatsService {
    StatsService::init(server, &vm_entity(), 4 * 3600).await.unwrap()
}

#[tokio::test]
async fn test_realtime_query_caps_at_one_sample() {
    let server = Arc::new(MockServer::new());
    let stats = service(server.clone()).await;

    stats
        .realtime_stats(&vm_entity(), Some(vec![6]), Some(vec!["*".to_string()]))
        .await
        .unwrap();

    let specs = server.submitted_specs();
    assert_eq!(specs.len(), 1);
    let spec = &specs[0];
    assert_eq!(spec.max_samples, Some(1));
    // Interval defaulted to the provider refresh rate.
    assert_eq!(spec.interval, 20);
    assert_eq!(spec.metrics.len(), 1);
    assert_eq!(spec.metrics[0].counter_id, 6);
    assert_eq!(spec.metrics[0].instance, "*");
}

#[tokio::test]
async fn test_historical_query_time_range() {
    let server = Arc::new(MockServer::new());
    let stats = service(server.clone()).await;

    stats.historical_stats(&vm_entity(), Some(vec![6]), None, 7200, None).await.unwrap();

    let specs = server.submitted_specs();
    let spec = &specs[0];
    assert_eq!(spec.interval, 7200);
    assert_eq!(spec.end, Some(server.now));
    // start = now - (interval + default delay)
    assert_eq!(spec.start, Some(server.now - Duration::seconds(7200 + 4 * 3600)));
    assert_eq!(spec.max_samples, None);
}

#[tokio::test]
async fn test_historical_delay_is_caller_tunable() {
    let server = Arc::new(MockServer::new());
    let stats = service(server.clone()).await;

    stats.historical_stats(&vm_entity(), Some(vec![6]), None, 300, Some(60)).await.unwrap();

    let spec = &server.submitted_specs()[0];
    assert_eq!(spec.start, Some(server.now - Duration::seconds(300 + 60)));
}

#[tokio::test]
async fn test_reshape_flattens_and_sorts() {
    let server = Arc::new(MockServer::new());
    let stats = service(server.clone()).await;

    let times: Vec<_> =
        (0..3).map(|i| server.now + Duration::seconds(20 * i)).collect();
    // 2 counters x 2 instances x 3 timestamps, deliberately out of key
    // order.
    let rows = vec![result_row(
        vm_entity(),
        times.clone(),
        vec![
            (6, "*", vec![10, 11, 12]),
            (6, "", vec![20, 21, 22]),
            (2, "*", vec![30, 31, 32]),
            (2, "", vec![40, 41, 42]),
        ],
    )];

    let records = stats.reshape(&rows, "web-01");
    assert_eq!(records.len(), 12);
    // Sorted by counter id; instance order preserved within a counter.
    assert!(records.iter().take(6).all(|r| r.key == 2));
    assert!(records.iter().skip(6).all(|r| r.key == 6));
    assert_eq!(records[0].instance, "*");
    assert_eq!(records[0].value, 30);
    assert_eq!(records[0].unit, "%");
    assert_eq!(records[0].name, "web-01");
    assert_eq!(records[0].timestamp, times[0]);
    assert_eq!(records[3].instance, "");
}

#[tokio::test]
async fn test_no_rows_is_empty_not_error() {
    let server = Arc::new(MockServer::new());
    let stats = service(server.clone()).await;

    let records = stats.latest_stats(&vm_entity(), Some(vec![6]), None).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_latest_stats_all_queries_available_counters() {
    let server = Arc::new(MockServer::new());
    let stats = service(server.clone()).await;

    stats.latest_stats_all(&vm_entity()).await.unwrap();

    let spec = &server.submitted_specs()[0];
    // One selector per available counter, wildcard instance.
    assert_eq!(spec.metrics.len(), 2);
    assert!(spec.metrics.iter().all(|m| m.instance == "*"));
}

#[tokio::test]
async fn test_counter_export_sorted_by_key() {
    let server = Arc::new(MockServer::new());
    let stats = service(server.clone()).await;

    let dir = std::env::temp_dir().join("vigil-export-test");
    let path = stats.export_available_counters(None, &dir, None).await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "key,label,summary,type");
    assert!(lines[1].starts_with("2,mem.usage"));
    assert!(lines[2].starts_with("6,cpu.usage"));
    std::fs::remove_file(path).ok();
}

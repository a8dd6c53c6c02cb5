//! End-to-end tests: exposition text → store → pipeline → views.

use std::sync::Arc;
use std::time::Duration;

use mview_core::parser::parse;
use mview_core::pipeline::{self, View};
use mview_core::{MetricStore, SortColumn, SortSpec};
use tokio::sync::{mpsc, watch};

const TRACKED: &[&str] = &[
    "apiserver_flowcontrol_current_inqueue_requests",
    "apiserver_flowcontrol_request_wait_duration_seconds",
];

fn scrape_text(inqueue_a: u32, inqueue_b: u32) -> String {
    format!(
        r#"# HELP apiserver_flowcontrol_current_inqueue_requests [BETA] Number of requests currently pending in queues.
# TYPE apiserver_flowcontrol_current_inqueue_requests gauge
apiserver_flowcontrol_current_inqueue_requests{{flow_schema="global-default",priority_level="global-default"}} {inqueue_a}
apiserver_flowcontrol_current_inqueue_requests{{flow_schema="system-nodes",priority_level="system"}} {inqueue_b}
# HELP apiserver_flowcontrol_request_wait_duration_seconds [BETA] Length of time a request spent waiting in its queue
# TYPE apiserver_flowcontrol_request_wait_duration_seconds histogram
apiserver_flowcontrol_request_wait_duration_seconds_bucket{{execute="true",flow_schema="exempt",priority_level="exempt",le="0.005"}} 120
apiserver_flowcontrol_request_wait_duration_seconds_bucket{{execute="true",flow_schema="exempt",priority_level="exempt",le="+Inf"}} 121
apiserver_flowcontrol_request_wait_duration_seconds_sum{{execute="true",flow_schema="exempt",priority_level="exempt"}} 0.0123
apiserver_flowcontrol_request_wait_duration_seconds_count{{execute="true",flow_schema="exempt",priority_level="exempt"}} 121
# HELP apiserver_request_total Counter of apiserver requests.
# TYPE apiserver_request_total counter
apiserver_request_total{{code="200",verb="GET"}} 5
"#
    )
}

async fn next(rx: &mut mpsc::Receiver<View>) -> View {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("view within timeout")
        .expect("sink open")
}

#[test]
fn repeated_scrapes_update_in_place() {
    let mut store = MetricStore::new();
    let first = store.apply(parse(&scrape_text(1, 2), TRACKED).events);
    let second = store.apply(parse(&scrape_text(7, 8), TRACKED).events);

    assert_eq!(first.value_count(), 3);
    assert_eq!(second.value_count(), 3);

    let inqueue = second
        .metric("apiserver_flowcontrol_current_inqueue_requests")
        .unwrap();
    assert_eq!(inqueue.metric_type.as_deref(), Some("gauge"));
    assert_eq!(inqueue.values[0].value, "7");
    assert_eq!(
        inqueue.values[0].identity,
        first.metrics[0].values[0].identity
    );

    let wait = second
        .metric("apiserver_flowcontrol_request_wait_duration_seconds")
        .unwrap();
    assert_eq!(wait.values.len(), 1, "only the histogram sum is kept");
    assert_eq!(wait.values[0].value, "0.0123");
    assert_eq!(wait.values[0].label("flow_schema"), Some("exempt"));
}

#[test]
fn malformed_line_among_ten() {
    let mut text = String::from("# TYPE apiserver_flowcontrol_current_inqueue_requests gauge\n");
    for i in 0..10 {
        if i == 6 {
            text.push_str("apiserver_flowcontrol_current_inqueue_requests{flow_schema=\"broken\"}\n");
        } else {
            text.push_str(&format!(
                "apiserver_flowcontrol_current_inqueue_requests{{flow_schema=\"fs{i}\"}} {i}\n"
            ));
        }
    }

    let parsed = parse(&text, TRACKED);
    assert_eq!(parsed.warnings.len(), 1);

    let mut store = MetricStore::new();
    let snapshot = store.apply(parsed.events);
    assert_eq!(snapshot.value_count(), 9);
}

#[tokio::test]
async fn scrapes_and_intents_combine_latest() {
    let (handle, coordinator, mut views) = pipeline::channel(16);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(coordinator.run(shutdown_rx));

    let startup = next(&mut views).await;
    assert!(startup.rows.is_empty());

    let mut store = MetricStore::new();
    handle.publish_snapshot(Arc::new(store.apply(parse(&scrape_text(3, 4), TRACKED).events)));
    let view = next(&mut views).await;
    assert_eq!(view.rows.len(), 3);
    assert_eq!(view.metric_count(), 2);
    assert_eq!(
        view.columns,
        vec!["execute", "flow_schema", "priority_level"]
    );

    handle.on_filter_changed("system");
    let filtered = next(&mut views).await;
    assert_eq!(filtered.rows.len(), 1);
    assert_eq!(filtered.rows[0].value, "4");

    // A new scrape keeps the filter that was last submitted.
    handle.publish_snapshot(Arc::new(store.apply(parse(&scrape_text(30, 40), TRACKED).events)));
    let refreshed = next(&mut views).await;
    assert_eq!(refreshed.filter, "system");
    assert_eq!(refreshed.rows.len(), 1);
    assert_eq!(refreshed.rows[0].value, "40");

    handle.on_filter_changed("");
    handle.set_sort(SortSpec::new(SortColumn::Value, false));
    next(&mut views).await;
    let sorted = next(&mut views).await;
    let inqueue: Vec<_> = sorted
        .rows
        .iter()
        .filter(|r| r.metric_name == "apiserver_flowcontrol_current_inqueue_requests")
        .map(|r| r.value.as_str())
        .collect();
    assert_eq!(inqueue, vec!["40", "30"]);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
}

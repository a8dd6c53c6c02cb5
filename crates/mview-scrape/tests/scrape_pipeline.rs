//! Scraper + coordinator running as tasks, fed by a scripted source.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use mview_core::pipeline::{self, View};
use mview_core::{SortColumn, SortSpec};
use mview_scrape::{ScrapeError, ScrapeResult, Scraper, Source};
use tokio::sync::{mpsc, watch};

struct Script(Mutex<VecDeque<&'static str>>);

impl Source for Script {
    async fn scrape(&self) -> ScrapeResult<String> {
        match self.0.lock().unwrap().pop_front() {
            Some(body) => Ok(body.to_string()),
            None => Err(ScrapeError::Status {
                url: "http://script/metrics".into(),
                status: 503,
            }),
        }
    }
}

const FIRST: &str = r#"# HELP apiserver_flowcontrol_current_executing_seats Concurrency (number of seats) occupied by the currently executing requests
# TYPE apiserver_flowcontrol_current_executing_seats gauge
apiserver_flowcontrol_current_executing_seats{flow_schema="exempt",priority_level="exempt"} 2
apiserver_flowcontrol_current_executing_seats{flow_schema="service-accounts",priority_level="workload-low"} 10
apiserver_flowcontrol_current_executing_seats{flow_schema="global-default",priority_level="global-default"} 0
"#;

const SECOND: &str = r#"# TYPE apiserver_flowcontrol_current_executing_seats gauge
apiserver_flowcontrol_current_executing_seats{flow_schema="exempt",priority_level="exempt"} 3
apiserver_flowcontrol_current_executing_seats{flow_schema="service-accounts",priority_level="workload-low"} 1
apiserver_flowcontrol_current_executing_seats{flow_schema="global-default",priority_level="global-default"} 0
apiserver_flowcontrol_current_executing_seats{flow_schema="probes",priority_level="exempt"} 4
"#;

async fn next(rx: &mut mpsc::Receiver<View>) -> View {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("view within timeout")
        .expect("sink open")
}

fn values(view: &View) -> Vec<(&str, &str)> {
    view.rows
        .iter()
        .map(|r| (r.labels["flow_schema"].as_str(), r.value.as_str()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn live_view_follows_scrapes_and_intents() {
    let source = Script(Mutex::new(VecDeque::from([FIRST, SECOND])));
    let scraper = Scraper::new(
        source,
        vec!["apiserver_flowcontrol_current_executing_seats".into()],
        Duration::from_secs(1),
    );

    let (handle, coordinator, mut views) = pipeline::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let coordinator_task = tokio::spawn(coordinator.run(shutdown_rx.clone()));

    // Intents submitted before any scrape still apply to the first snapshot.
    handle.set_sort(SortSpec::new(SortColumn::Value, false));
    handle.on_filter_changed("exempt|service");
    assert_eq!(next(&mut views).await.sequence, 1);
    next(&mut views).await;
    next(&mut views).await;

    let scraper_task = tokio::spawn(scraper.run(handle.clone(), shutdown_rx));

    let first = next(&mut views).await;
    assert_eq!(first.filter, "exempt|service");
    assert_eq!(first.sort, SortSpec::new(SortColumn::Value, false));
    assert_eq!(values(&first), vec![("exempt", "2"), ("service-accounts", "10")]);
    assert_eq!(
        first.rows[0].description.as_deref(),
        Some("Concurrency (number of seats) occupied by the currently executing requests")
    );

    let second = next(&mut views).await;
    assert_eq!(
        values(&second),
        vec![("probes", "4"), ("exempt", "3"), ("service-accounts", "1")]
    );
    // HELP from the first scrape is remembered.
    assert!(second.rows[0].description.is_some());

    shutdown_tx.send(true).unwrap();
    scraper_task.await.unwrap();
    coordinator_task.await.unwrap();
}

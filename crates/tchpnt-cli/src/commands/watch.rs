//! Long-running view that re-ranks whenever the local date changes.

use chrono::Local;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use tchpnt_core::{
    Config, DayBoundaryScheduler, Event, RefreshListener, SystemClock, TouchpointDb,
    TouchpointService, TouchpointStore,
};

use super::touchpoint::print_ranking;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(watch(config, json))
}

async fn watch(config: Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = TouchpointService::open(TouchpointDb::open()?)?;
    render(&service, json)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener: Arc<dyn RefreshListener> = Arc::new(move |event: &Event| {
        let _ = tx.send(event.clone());
    });
    let mut scheduler =
        DayBoundaryScheduler::new(Arc::new(SystemClock), config.scheduler.clone(), listener);
    scheduler.start();

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            Some(event) = rx.recv() => {
                info!(?event, "refresh");
                if let Err(e) = service.refresh() {
                    break Err(e.into());
                }
                render(&service, json)?;
            }
        }
    };

    scheduler.stop().await;
    result
}

fn render<S: TouchpointStore>(
    service: &TouchpointService<S>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ranked = service.ranked(&Local::now(), None);
    if json {
        println!("{}", serde_json::to_string(&ranked)?);
    } else {
        println!("--- {} ---", Local::now().format("%Y-%m-%d"));
        print_ranking(&ranked);
    }
    Ok(())
}

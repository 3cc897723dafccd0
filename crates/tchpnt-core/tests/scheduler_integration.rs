//! Integration tests for day rollover: the scheduler signals, the consumer
//! re-ranks, and statuses move by one day without any record changing.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use tchpnt_core::{
    Clock, DayBoundaryScheduler, Event, ManualClock, MemoryStore, PreferredAction,
    RefreshListener, SchedulerConfig, Status, TouchpointDraft, TouchpointService,
};

fn tz() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

fn local(day: u32, h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
    tz().with_ymd_and_hms(2025, 6, day, h, m, s).unwrap()
}

fn forwarding_listener() -> (Arc<dyn RefreshListener>, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener: Arc<dyn RefreshListener> = Arc::new(move |e: &Event| {
        let _ = tx.send(e.clone());
    });
    (listener, rx)
}

#[tokio::test(start_paused = true)]
async fn test_midnight_rollover_moves_due_today_to_overdue() {
    let clock = Arc::new(ManualClock::new(local(10, 23, 59, 30)));
    let mut service = TouchpointService::open(MemoryStore::new()).unwrap();
    // Contacted a week ago at noon, weekly cadence: due today.
    let last = local(3, 12, 0, 0).with_timezone(&Utc);
    let record = service
        .create(
            TouchpointDraft::new("Sarah Miller", "+15550104", 7, PreferredAction::Message)
                .with_last_contact_at(last),
            last,
        )
        .unwrap();

    let now = clock.now().with_timezone(&tz());
    assert_eq!(service.ranked(&now, None)[0].status, Status::DueToday);

    let (listener, mut rx) = forwarding_listener();
    let mut scheduler =
        DayBoundaryScheduler::new(clock.clone(), SchedulerConfig::default(), listener);
    assert_eq!(scheduler.next_wake(), Duration::from_secs(31));
    scheduler.start();

    clock.set(local(11, 0, 0, 2));
    let event = rx.recv().await.unwrap();
    assert!(matches!(event, Event::DayChanged { .. }));

    service.refresh().unwrap();
    let now = clock.now().with_timezone(&tz());
    let ranked = service.ranked(&now, None);
    assert_eq!(ranked[0].record.id, record.id);
    assert_eq!(ranked[0].status, Status::Overdue { by_days: 1 });
    assert_eq!(ranked[0].label, "Overdue by 1 day");

    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_resume_after_long_suspend_fires_once() {
    let clock = Arc::new(ManualClock::new(local(1, 20, 0, 0)));
    let (listener, mut rx) = forwarding_listener();
    let config = SchedulerConfig {
        poll_interval_secs: 3600,
        align_to_midnight: true,
    };
    let mut scheduler = DayBoundaryScheduler::new(clock.clone(), config, listener);
    scheduler.start();

    // Device slept through four midnights.
    clock.set(local(5, 7, 30, 0));
    let transition = scheduler.resume().unwrap();
    assert_eq!(transition.days(), 4);
    assert!(scheduler.resume().is_none());

    match rx.recv().await {
        Some(Event::DayChanged { from, to, .. }) => {
            assert_eq!((to - from).num_days(), 4);
        }
        other => panic!("expected DayChanged, got {other:?}"),
    }
    let quiet = tokio::time::timeout(Duration::from_secs(2 * 3600), rx.recv()).await;
    assert!(quiet.is_err());

    scheduler.stop().await;
    assert!(!scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_drop_without_stop_does_not_fire() {
    let clock = Arc::new(ManualClock::new(local(1, 23, 59, 59)));
    let (listener, mut rx) = forwarding_listener();
    {
        let mut scheduler =
            DayBoundaryScheduler::new(clock.clone(), SchedulerConfig::default(), listener);
        scheduler.start();
    }
    clock.set(local(2, 0, 0, 5));
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(rx.try_recv().is_err());
}

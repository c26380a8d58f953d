use framefill_scheduler::{QueueId, StopReason};

use crate::helpers::{make_config, manual_scheduler, Recorder};

#[test]
fn higher_priority_queue_drains_first() {
    let (scheduler, clock) = manual_scheduler(make_config(0, 0, 0, 100));
    let rec = Recorder::new();

    let low = scheduler.create_queue(1, true);
    let high = scheduler.create_queue(5, true);
    scheduler
        .add_task(rec.job("default", "work", &clock, 10), QueueId::DEFAULT, false)
        .unwrap();
    for i in 0..3 {
        scheduler.add_task(rec.job(&format!("low{i}"), "work", &clock, 10), low, false).unwrap();
        scheduler.add_task(rec.job(&format!("high{i}"), "work", &clock, 10), high, false).unwrap();
    }

    let report = scheduler.process_frame();
    assert_eq!(report.stop, StopReason::Idle);
    assert_eq!(report.executed, 7);
    assert_eq!(report.queues_completed, 3);
    assert_eq!(
        rec.entries(),
        vec!["high0", "high1", "high2", "low0", "low1", "low2", "default"]
    );
}

#[test]
fn priority_change_applies_to_next_selection() {
    let (scheduler, clock) = manual_scheduler(make_config(0, 0, 0, 100));
    let rec = Recorder::new();

    let a = scheduler.create_queue(5, true);
    let b = scheduler.create_queue(1, true);
    scheduler.add_task(rec.job("a", "work", &clock, 10), a, false).unwrap();
    scheduler.add_task(rec.job("b", "work", &clock, 10), b, false).unwrap();

    scheduler.set_priority(b, 10).unwrap();
    assert_eq!(scheduler.get_priority(b), Ok(10));

    scheduler.process_frame();
    assert_eq!(rec.entries(), vec!["b", "a"]);
}

#[test]
fn equal_priorities_drain_oldest_queue_first() {
    let (scheduler, clock) = manual_scheduler(make_config(0, 0, 0, 100));
    let rec = Recorder::new();

    let first = scheduler.create_queue(2, true);
    let second = scheduler.create_queue(2, true);
    scheduler.add_task(rec.job("second", "work", &clock, 10), second, false).unwrap();
    scheduler.add_task(rec.job("first", "work", &clock, 10), first, false).unwrap();

    scheduler.process_frame();
    assert_eq!(rec.entries(), vec!["first", "second"]);
}

#[test]
fn paused_high_priority_queue_yields() {
    let (scheduler, clock) = manual_scheduler(make_config(0, 0, 0, 100));
    let rec = Recorder::new();

    let high = scheduler.create_queue(9, false);
    scheduler.add_task(rec.job("high", "work", &clock, 10), high, false).unwrap();
    scheduler
        .add_task(rec.job("default", "work", &clock, 10), QueueId::DEFAULT, false)
        .unwrap();

    scheduler.process_frame();
    assert_eq!(rec.entries(), vec!["default"]);

    scheduler.resume(high).unwrap();
    scheduler.process_frame();
    assert_eq!(rec.entries(), vec!["default", "high"]);
}

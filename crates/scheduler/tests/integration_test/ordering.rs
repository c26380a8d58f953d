use framefill_scheduler::{QueueId, StopReason};

use crate::helpers::{make_config, manual_scheduler, Recorder};

#[test]
fn ordered_tasks_run_one_per_frame_in_order() {
    // 1 ms frames; each task takes 60% of the budget.
    let (scheduler, clock) = manual_scheduler(make_config(1000, 0, 0, 100));
    let rec = Recorder::new();
    for label in ["one", "two", "three"] {
        scheduler
            .add_task(rec.job(label, "step", &clock, 600), QueueId::DEFAULT, true)
            .unwrap();
    }

    let first = scheduler.process_frame();
    assert_eq!(first.executed, 1);
    assert_eq!(first.stop, StopReason::NoCheaperTask);
    assert_eq!(rec.entries(), vec!["one"]);

    let second = scheduler.process_frame();
    assert_eq!(second.executed, 1);
    assert_eq!(rec.entries(), vec!["one", "two"]);

    let third = scheduler.process_frame();
    assert_eq!(third.executed, 1);
    assert_eq!(third.stop, StopReason::Idle);
    assert_eq!(rec.entries(), vec!["one", "two", "three"]);
}

#[test]
fn cheap_unordered_tasks_run_ahead_of_expensive_ordered_ones() {
    let (scheduler, clock) = manual_scheduler(make_config(1000, 0, 0, 100));
    let rec = Recorder::new();

    // Teach the scheduler what a slow task costs.
    scheduler
        .add_task(rec.job("warmup", "slow", &clock, 800), QueueId::DEFAULT, true)
        .unwrap();
    scheduler.process_frame();

    let q = QueueId::DEFAULT;
    scheduler.add_task(rec.job("a", "fast", &clock, 100), q, false).unwrap();
    scheduler.add_task(rec.job("b", "slow", &clock, 800), q, true).unwrap();
    scheduler.add_task(rec.job("c", "fast", &clock, 100), q, false).unwrap();
    scheduler.add_task(rec.job("d", "slow", &clock, 800), q, true).unwrap();
    scheduler.add_task(rec.job("e", "fast", &clock, 100), q, false).unwrap();

    let report = scheduler.process_frame();
    assert_eq!(report.executed, 3);
    assert_eq!(report.skipped_ahead, 1);
    assert_eq!(report.stop, StopReason::EndOfReachable);

    let second = scheduler.process_frame();
    assert_eq!(second.executed, 1);
    assert_eq!(second.stop, StopReason::NoCheaperTask);

    scheduler.process_frame();
    assert_eq!(rec.entries(), vec!["warmup", "a", "c", "e", "b", "d"]);
    assert_eq!(scheduler.pending_tasks(), 0);
    assert!(scheduler.metrics().skip_aheads >= 1);
}

#[test]
fn first_task_of_a_frame_always_runs() {
    let (scheduler, clock) = manual_scheduler(make_config(1000, 0, 0, 100));
    let rec = Recorder::new();

    scheduler
        .add_task(rec.job("warmup", "huge", &clock, 5000), QueueId::DEFAULT, false)
        .unwrap();
    scheduler.process_frame();

    // Estimated far beyond the budget, yet still the first call of the frame.
    scheduler
        .add_task(rec.job("huge", "huge", &clock, 5000), QueueId::DEFAULT, true)
        .unwrap();
    let report = scheduler.process_frame();
    assert_eq!(report.executed, 1);
    assert_eq!(rec.entries(), vec!["warmup", "huge"]);
}

#[test]
fn unordered_tasks_keep_submission_order_when_cheap() {
    let (scheduler, clock) = manual_scheduler(make_config(0, 0, 0, 100));
    let rec = Recorder::new();
    let q = scheduler.create_queue(0, true);

    let jobs: Vec<_> = (0..5)
        .map(|i| rec.job(&format!("t{i}"), "fast", &clock, 10))
        .collect();
    assert_eq!(scheduler.add_task_batch(jobs, q, false), Ok(5));

    scheduler.process_frame();
    assert_eq!(rec.entries(), vec!["t0", "t1", "t2", "t3", "t4"]);
}

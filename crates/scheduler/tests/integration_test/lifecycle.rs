use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use framefill_scheduler::{CancelOutcome, Job, QueueId, Scheduler, SchedulerConfig};

use crate::helpers::{counting_callback, make_config, manual_scheduler, Recorder};

#[test]
fn locked_queue_is_removed_once_drained() {
    let (scheduler, clock) = manual_scheduler(make_config(0, 0, 0, 100));
    let rec = Recorder::new();
    let q = scheduler.create_queue(0, true);
    let (completed, on_completion) = counting_callback();
    scheduler.set_on_completion(q, Some(on_completion)).unwrap();

    for i in 0..3 {
        scheduler.add_task(rec.job(&format!("t{i}"), "work", &clock, 10), q, false).unwrap();
    }
    scheduler.lock(q).unwrap();
    assert!(scheduler.queue_exists(q));

    let report = scheduler.process_frame();
    assert_eq!(report.executed, 3);
    assert_eq!(completed.load(Ordering::SeqCst), 1);
    assert!(!scheduler.queue_exists(q));
    assert!(scheduler.is_locked(q));
}

#[test]
fn completion_fires_every_time_the_queue_empties() {
    let (scheduler, clock) = manual_scheduler(make_config(0, 0, 0, 100));
    let rec = Recorder::new();
    let q = scheduler.create_queue(0, true);
    let (completed, on_completion) = counting_callback();
    let (canceled, on_cancel) = counting_callback();
    scheduler.set_on_completion(q, Some(on_completion)).unwrap();
    scheduler.set_on_cancel(q, Some(on_cancel)).unwrap();

    for round in 0..2 {
        scheduler.add_task(rec.job(&format!("r{round}"), "work", &clock, 10), q, false).unwrap();
        scheduler.process_frame();
    }
    assert_eq!(completed.load(Ordering::SeqCst), 2);
    assert_eq!(canceled.load(Ordering::SeqCst), 0);
    assert!(scheduler.queue_exists(q));
}

#[test]
fn canceled_queue_never_completes() {
    let (scheduler, clock) = manual_scheduler(make_config(0, 0, 0, 100));
    let rec = Recorder::new();
    let q = scheduler.create_queue(0, true);
    let (completed, on_completion) = counting_callback();
    let (canceled, on_cancel) = counting_callback();
    scheduler.set_on_completion(q, Some(on_completion)).unwrap();
    scheduler.set_on_cancel(q, Some(on_cancel)).unwrap();
    scheduler.add_task(rec.job("never", "work", &clock, 10), q, false).unwrap();

    assert_eq!(scheduler.cancel(q, true), Ok(CancelOutcome::Deleted));
    scheduler.process_frame();

    assert_eq!(canceled.load(Ordering::SeqCst), 1);
    assert_eq!(completed.load(Ordering::SeqCst), 0);
    assert!(rec.entries().is_empty());
}

#[test]
fn task_can_enqueue_follow_up_work() {
    let (scheduler, _clock) = manual_scheduler(make_config(0, 0, 0, 100));
    let scheduler = Arc::new(scheduler);
    let ran = Arc::new(AtomicUsize::new(0));

    let weak: Weak<Scheduler> = Arc::downgrade(&scheduler);
    let counter = Arc::clone(&ran);
    scheduler
        .add_task(
            Job::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                if let Some(s) = weak.upgrade() {
                    let inner = Arc::clone(&counter);
                    s.add_task(
                        Job::new(move || {
                            inner.fetch_add(1, Ordering::SeqCst);
                        }),
                        QueueId::DEFAULT,
                        false,
                    )
                    .unwrap();
                }
            }),
            QueueId::DEFAULT,
            false,
        )
        .unwrap();

    let report = scheduler.process_frame();
    assert_eq!(report.executed, 2);
    assert_eq!(ran.load(Ordering::SeqCst), 2);
}

#[test]
fn task_can_cancel_its_own_queue() {
    let (scheduler, clock) = manual_scheduler(make_config(0, 0, 0, 100));
    let scheduler = Arc::new(scheduler);
    let rec = Recorder::new();
    let q = scheduler.create_queue(0, true);
    let (completed, on_completion) = counting_callback();
    let (canceled, on_cancel) = counting_callback();
    scheduler.set_on_completion(q, Some(on_completion)).unwrap();
    scheduler.set_on_cancel(q, Some(on_cancel)).unwrap();

    let weak = Arc::downgrade(&scheduler);
    let seen = Arc::clone(&canceled);
    scheduler
        .add_task(
            Job::new(move || {
                if let Some(s) = weak.upgrade() {
                    s.cancel(q, false).unwrap();
                }
                // Deferred until the scheduler flushes.
                assert_eq!(seen.load(Ordering::SeqCst), 0);
            }),
            q,
            false,
        )
        .unwrap();
    scheduler.add_task(rec.job("after", "work", &clock, 10), q, false).unwrap();

    scheduler.process_frame();
    assert_eq!(canceled.load(Ordering::SeqCst), 1);
    assert_eq!(completed.load(Ordering::SeqCst), 0);
    assert!(rec.entries().is_empty());
    assert_eq!(scheduler.queue_len(q), Ok(0));
}

#[test]
fn bound_jobs_with_dropped_targets_are_discarded() {
    let (scheduler, _clock) = manual_scheduler(make_config(0, 0, 0, 100));
    let target = Arc::new(AtomicUsize::new(0));
    let keep = Arc::new(AtomicUsize::new(0));

    scheduler
        .add_task(Job::bound(&target, |t| {
            t.fetch_add(1, Ordering::SeqCst);
        }), QueueId::DEFAULT, false)
        .unwrap();
    scheduler
        .add_task(Job::bound(&keep, |t| {
            t.fetch_add(1, Ordering::SeqCst);
        }), QueueId::DEFAULT, false)
        .unwrap();
    drop(target);

    let report = scheduler.process_frame();
    assert_eq!(report.discarded, 1);
    assert_eq!(report.executed, 1);
    assert_eq!(keep.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_producers_lose_no_tasks() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 250;

    let config = SchedulerConfig {
        target_fps: 0,
        ..SchedulerConfig::default()
    };
    let scheduler = Arc::new(Scheduler::new(&config));
    let done = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let scheduler = Arc::clone(&scheduler);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let q = scheduler.create_queue(1, true);
                for _ in 0..PER_PRODUCER {
                    let done = Arc::clone(&done);
                    scheduler
                        .add_task(
                            Job::new(move || {
                                done.fetch_add(1, Ordering::SeqCst);
                            }),
                            q,
                            false,
                        )
                        .unwrap();
                }
                scheduler.lock(q).unwrap();
            })
        })
        .collect();

    loop {
        scheduler.process_frame();
        if handles.iter().all(|h| h.is_finished()) && scheduler.pending_tasks() == 0 {
            break;
        }
        thread::yield_now();
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(done.load(Ordering::SeqCst), PRODUCERS * PER_PRODUCER);
    assert_eq!(scheduler.metrics().total_executed(), (PRODUCERS * PER_PRODUCER) as u64);
    assert_eq!(scheduler.queue_ids(), vec![QueueId::DEFAULT]);
}

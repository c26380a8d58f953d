use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use framefill_scheduler::{ConfigError, ManualClock, Scheduler, SchedulerConfig};

#[test]
fn scheduler_follows_file_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "target_fps = 30\nframe_padding_us = 500\nmin_process_time_us = 250\nskip_ahead_factor = 3"
    )
    .unwrap();

    let config = SchedulerConfig::from_file(file.path()).unwrap();
    let scheduler = Scheduler::with_clock(&config, Arc::new(ManualClock::new()));

    assert_eq!(scheduler.target_fps(), 30);
    assert_eq!(scheduler.frame_budget(), Duration::from_micros(33_333));
    assert_eq!(scheduler.frame_padding(), Duration::from_micros(500));
    assert_eq!(scheduler.min_process_time(), Duration::from_micros(250));
    assert_eq!(scheduler.baseline_estimate(), Duration::from_millis(1));
    assert_eq!(scheduler.skip_ahead_factor(), 3);
}

#[test]
fn invalid_file_config_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "target_fps = 1000\nframe_padding_us = 5000").unwrap();

    let err = SchedulerConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

// Unit tests for business rules

use super::*;

fn preferences() -> Vec<String> {
    DEFAULT_VIDEO_MIME_PREFERENCES.iter().map(|m| m.to_string()).collect()
}

#[test]
fn test_ten_seconds_at_25fps_yields_251_samples() {
    let schedule = SampleSchedule::new(10.0, 25.0).unwrap();
    assert_eq!(schedule.sample_count(), 251);

    let ticks: Vec<FrameTick> = schedule.collect();
    assert_eq!(ticks.len(), 251);
    assert_eq!(ticks[0].timestamp, 0.0);
    assert_eq!(ticks[1].timestamp, 0.04);
    assert_eq!(ticks[250].timestamp, 10.0);
    assert_eq!(ticks[250].index, 250);
}

#[test]
fn test_last_sample_is_exactly_duration() {
    let cases = [
        (1.01, 10.0),
        (7.3, 29.97),
        (0.5, 30.0),
        (12.345, 23.976),
        (3.0, 59.94),
        (0.0333, 30.0),
    ];
    for (duration, fps) in cases {
        let schedule = SampleSchedule::new(duration, fps).unwrap();
        let expected = (duration * fps - 1e-6).ceil() as usize + 1;
        let ticks: Vec<FrameTick> = schedule.collect();
        assert_eq!(ticks.len(), expected, "count for {}s @ {}fps", duration, fps);
        let last = ticks.last().unwrap();
        assert_eq!(last.timestamp, duration, "last for {}s @ {}fps", duration, fps);
        assert!(ticks.iter().all(|t| t.timestamp <= duration));
    }
}

#[test]
fn test_timestamps_strictly_increase() {
    let ticks: Vec<FrameTick> = SampleSchedule::new(7.3, 29.97).unwrap().collect();
    for pair in ticks.windows(2) {
        assert!(pair[1].timestamp > pair[0].timestamp);
        assert_eq!(pair[1].index, pair[0].index + 1);
    }
}

#[test]
fn test_timestamps_do_not_drift_on_long_videos() {
    let fps = 59.94;
    let schedule = SampleSchedule::new(3600.0, fps).unwrap();
    let interval = schedule.interval();
    let count = schedule.sample_count();
    for tick in schedule.take(count - 1) {
        assert_eq!(tick.timestamp, tick.index as f64 * interval);
    }

    // Accumulating the interval instead would have drifted measurably by now
    let mut accumulated = 0.0_f64;
    for _ in 0..(count - 2) {
        accumulated += interval;
    }
    let indexed = (count - 2) as f64 * interval;
    assert_ne!(accumulated, indexed);
}

#[test]
fn test_zero_duration_has_single_sample() {
    let ticks: Vec<FrameTick> = SampleSchedule::new(0.0, 30.0).unwrap().collect();
    assert_eq!(ticks, vec![FrameTick { index: 0, timestamp: 0.0 }]);
}

#[test]
fn test_schedule_rejects_invalid_input() {
    assert!(SampleSchedule::new(-1.0, 30.0).is_err());
    assert!(SampleSchedule::new(f64::INFINITY, 30.0).is_err());
    assert!(SampleSchedule::new(10.0, 0.0).is_err());
    assert!(SampleSchedule::new(10.0, f64::NAN).is_err());
}

#[test]
fn test_schedule_size_hint_tracks_remaining() {
    let mut schedule = SampleSchedule::new(1.0, 10.0).unwrap();
    assert_eq!(schedule.len(), 11);
    schedule.next();
    schedule.next();
    assert_eq!(schedule.len(), 9);
}

#[test]
fn test_progress_percent() {
    assert_eq!(progress_percent(0.0, 10.0), 0);
    assert_eq!(progress_percent(0.04, 10.0), 0);
    assert_eq!(progress_percent(3.339, 10.0), 33);
    assert_eq!(progress_percent(10.0, 10.0), 100);
    assert_eq!(progress_percent(11.0, 10.0), 100);
    assert_eq!(progress_percent(0.0, 0.0), 100);
}

#[test]
fn test_negotiation_prefers_first_supported() {
    let prefs = preferences();
    let all = negotiate_video_mime(&prefs, |_| true).unwrap();
    assert_eq!(all, "video/webm;codecs=vp9");

    let no_vp9 = negotiate_video_mime(&prefs, |m| !m.contains("vp9")).unwrap();
    assert_eq!(no_vp9, "video/webm;codecs=vp8");

    let mp4_only = negotiate_video_mime(&prefs, |m| m == "video/mp4").unwrap();
    assert_eq!(mp4_only, "video/mp4");
}

#[test]
fn test_negotiation_fails_without_support() {
    let prefs = preferences();
    let err = negotiate_video_mime(&prefs, |_| false).unwrap_err();
    assert!(matches!(err, DomainError::UnsupportedCapability(_)));
}

#[test]
fn test_output_entry_name() {
    assert_eq!(output_entry_name("unmarked", "cat", JobKind::Image), "unmarked_cat.png");
    assert_eq!(output_entry_name("unmarked", "clip", JobKind::Video), "unmarked_clip.webm");
}

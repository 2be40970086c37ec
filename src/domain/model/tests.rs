// Unit tests for domain models

use super::*;

fn pending_image() -> Job {
    Job::new(JobKind::Image, "holiday.photo.jpg", MediaSource::from_bytes(vec![1, 2, 3]))
}

#[test]
fn test_job_ids_are_monotonic() {
    let first = JobId::next();
    let second = JobId::next();
    assert!(second > first);
    assert!(second.sequence() > first.sequence());
    assert_ne!(first.to_string(), second.to_string());
}

#[test]
fn test_classify_by_mime() {
    assert_eq!(JobKind::classify("blob", Some("image/webp")), Some(JobKind::Image));
    assert_eq!(JobKind::classify("blob", Some("video/quicktime")), Some(JobKind::Video));
    assert_eq!(
        JobKind::classify("clip.bin", Some("video/webm; codecs=vp9")),
        Some(JobKind::Video)
    );
}

#[test]
fn test_classify_by_extension() {
    assert_eq!(JobKind::classify("a.JPG", None), Some(JobKind::Image));
    assert_eq!(JobKind::classify("a.png", None), Some(JobKind::Image));
    assert_eq!(JobKind::classify("a.mov", None), Some(JobKind::Video));
    assert_eq!(JobKind::classify("a.mp4", Some("application/octet-stream")), Some(JobKind::Video));
    assert_eq!(JobKind::classify("notes.txt", None), None);
    assert_eq!(JobKind::classify("no_extension", None), None);
}

#[test]
fn test_output_extension_by_kind() {
    assert_eq!(JobKind::Image.output_extension(), "png");
    assert_eq!(JobKind::Video.output_extension(), "webm");
}

#[test]
fn test_status_transition_rules() {
    assert!(JobStatus::Pending.can_transition_to(JobStatus::Processing));
    assert!(JobStatus::Processing.can_transition_to(JobStatus::Completed));
    assert!(JobStatus::Processing.can_transition_to(JobStatus::Failed));

    assert!(!JobStatus::Pending.can_transition_to(JobStatus::Completed));
    assert!(!JobStatus::Completed.can_transition_to(JobStatus::Processing));
    assert!(!JobStatus::Failed.can_transition_to(JobStatus::Processing));
    assert!(!JobStatus::Processing.can_transition_to(JobStatus::Processing));
}

#[test]
fn test_job_success_lifecycle() {
    let mut job = pending_image();
    assert_eq!(job.status(), JobStatus::Pending);

    job.begin().unwrap();
    assert_eq!(job.status(), JobStatus::Processing);

    job.complete(JobOutput::new(IMAGE_OUTPUT_MIME, vec![9; 4])).unwrap();
    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.output().map(JobOutput::len), Some(4));
    assert!(job.error().is_none());
    assert_eq!(job.progress_percent(), 100);
}

#[test]
fn test_job_failure_lifecycle() {
    let mut job = pending_image();
    job.begin().unwrap();
    job.fail(&DomainError::Decode("bad header".to_string())).unwrap();

    assert_eq!(job.status(), JobStatus::Failed);
    assert!(job.output().is_none());
    let error = job.error().unwrap();
    assert_eq!(error.kind, crate::domain::errors::ErrorKind::Decode);
    assert!(error.message.contains("bad header"));
}

#[test]
fn test_job_rejects_revisiting_states() {
    let mut job = pending_image();
    assert!(job.complete(JobOutput::new(IMAGE_OUTPUT_MIME, vec![])).is_err());

    job.begin().unwrap();
    assert!(job.begin().is_err());

    job.fail(&DomainError::Transform("boom".to_string())).unwrap();
    assert_eq!(
        job.begin(),
        Err(DomainError::InvalidTransition {
            from: JobStatus::Failed,
            to: JobStatus::Processing,
        })
    );
    assert!(job.complete(JobOutput::new(IMAGE_OUTPUT_MIME, vec![])).is_err());
}

#[test]
fn test_progress_only_moves_forward_while_processing() {
    let mut job = pending_image();
    job.set_progress(40);
    assert_eq!(job.progress_percent(), 0);

    job.begin().unwrap();
    job.set_progress(40);
    job.set_progress(20);
    assert_eq!(job.progress_percent(), 40);
    job.set_progress(250);
    assert_eq!(job.progress_percent(), 100);
}

#[test]
fn test_base_name_strips_last_extension() {
    assert_eq!(pending_image().base_name(), "holiday.photo");
}

#[test]
fn test_release_drops_output() {
    let mut job = pending_image();
    job.begin().unwrap();
    job.complete(JobOutput::new(IMAGE_OUTPUT_MIME, vec![1])).unwrap();
    job.release();
    assert!(job.output().is_none());
    assert_eq!(job.status(), JobStatus::Completed);
}

#[test]
fn test_batch_progress_percent() {
    assert_eq!(BatchProgress { processed: 0, total: 0 }.percent(), 100);
    assert_eq!(BatchProgress { processed: 1, total: 3 }.percent(), 33);
    assert!(BatchProgress { processed: 5, total: 5 }.is_finished());
}

#[test]
fn test_video_metadata_validation() {
    assert!(VideoMetadata::new(10.0, 640, 480).is_ok());
    assert!(VideoMetadata::new(-1.0, 640, 480).is_err());
    assert!(VideoMetadata::new(f64::NAN, 640, 480).is_err());
    assert!(VideoMetadata::new(10.0, 0, 480).is_err());

    let meta = VideoMetadata::new(10.0, 640, 480).unwrap().with_declared_frame_rate(0.0);
    assert_eq!(meta.declared_frame_rate, None);
    let meta = VideoMetadata::new(10.0, 640, 480).unwrap().with_declared_frame_rate(24.0);
    assert_eq!(meta.declared_frame_rate, Some(24.0));
}

#[tokio::test]
async fn test_media_source_reads_memory_and_files() {
    let memory = MediaSource::from_bytes(vec![7, 8]);
    assert_eq!(memory.read_all().await.unwrap().as_slice(), &[7, 8]);

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("input.png");
    std::fs::write(&path, b"abc").unwrap();
    let file = MediaSource::File(path);
    assert_eq!(file.read_all().await.unwrap().as_slice(), b"abc");

    let missing = MediaSource::File(dir.path().join("missing.png"));
    assert!(matches!(missing.read_all().await, Err(DomainError::Decode(_))));
}

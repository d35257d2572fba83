use super::*;
use crate::foundation::core::AlphaSide;

fn opaque_frame(width: u32, height: u32) -> Vec<u8> {
    vec![255; (width * height * 4) as usize]
}

fn sequential_pool(workers: usize) -> WorkerPool {
    WorkerPool::new(WorkerPoolOpts {
        workers: Some(workers),
        engine: EngineOpts::sequential(),
    })
    .unwrap()
}

#[test]
fn opts_parse_from_json() {
    let o = WorkerPoolOpts::from_json_str(
        r#"{"workers": 3, "engine": {"block_size": 32, "parallel": false}}"#,
    )
    .unwrap();
    assert_eq!(o.workers, Some(3));
    assert_eq!(o.engine.block_size, 32);
    assert!(!o.engine.parallel);
    assert_eq!(o.engine.batch_size, 10);
}

#[test]
fn opts_reject_zero_workers_and_bad_json() {
    assert!(matches!(
        WorkerPoolOpts::from_json_str(r#"{"workers": 0}"#),
        Err(DualAlphaError::Validation(_))
    ));
    assert!(matches!(
        WorkerPoolOpts::from_json_str("{"),
        Err(DualAlphaError::Serde(_))
    ));
}

#[test]
fn submit_rejects_malformed_input_without_queueing() {
    let pool = sequential_pool(1);
    let params = ReconstructParams::native(4, 2, AlphaSide::Right);
    assert!(
        pool.submit_frame(Vec::new(), params.clone(), JobOptions::default())
            .is_err()
    );
    assert!(
        pool.submit_batch(Vec::new(), params, JobOptions::default())
            .is_err()
    );
    assert_eq!(pool.stats().jobs_submitted, 0);
}

#[test]
fn status_reports_workers() {
    let pool = sequential_pool(2);
    let st = pool.status();
    assert_eq!(st.workers, 2);
    assert_eq!(st.queued_jobs, 0);
    assert!(!st.shutting_down);
}

#[test]
fn stats_count_completed_frames_and_reset() {
    let pool = sequential_pool(1);
    let params = ReconstructParams::native(4, 2, AlphaSide::Right);
    pool.submit_frame(opaque_frame(4, 2), params.clone(), JobOptions::default())
        .unwrap()
        .wait()
        .unwrap();
    pool.submit_batch(
        vec![opaque_frame(4, 2), opaque_frame(4, 2)],
        params,
        JobOptions::default(),
    )
    .unwrap()
    .wait()
    .unwrap();

    let st = pool.stats();
    assert_eq!(st.jobs_submitted, 2);
    assert_eq!(st.jobs_completed, 2);
    assert_eq!(st.frames_reconstructed, 3);

    pool.reset_stats();
    assert_eq!(pool.stats(), WorkerPoolStats::default());
}

#[test]
fn stop_joins_workers_and_releases_their_pools() {
    let mut pool = sequential_pool(2);
    let params = ReconstructParams::native(4, 2, AlphaSide::Right);
    pool.submit_frame(opaque_frame(4, 2), params, JobOptions::default())
        .unwrap()
        .wait()
        .unwrap();
    assert!(pool.status().retained_buffers > 0);

    pool.stop();
    let st = pool.status();
    assert!(st.shutting_down);
    assert_eq!(st.workers, 0);
    assert_eq!(st.retained_buffers, 0);
    assert!(pool.threads.is_empty());
}

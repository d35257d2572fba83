use super::*;
use std::sync::Mutex;

fn collect(total: usize, step: u8, advances: &[usize]) -> Vec<u8> {
    let seen = Mutex::new(Vec::new());
    let cb = |p: u8| seen.lock().unwrap().push(p);
    let t = ProgressTracker::new(total, step, Some(&cb));
    for &n in advances {
        t.advance(n);
    }
    seen.into_inner().unwrap()
}

#[test]
fn reports_each_decile_once() {
    let got = collect(20, 10, &[1; 20]);
    assert_eq!(got, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
}

#[test]
fn coarse_steps_skip_intermediate_marks() {
    let got = collect(25, 20, &[10, 10, 5]);
    assert_eq!(got, vec![40, 80, 100]);
}

#[test]
fn few_units_still_end_at_100() {
    assert_eq!(collect(3, 10, &[1, 1, 1]), vec![30, 60, 100]);
    assert_eq!(collect(1, 20, &[1]), vec![100]);
}

#[test]
fn no_sink_is_a_noop() {
    let t = ProgressTracker::new(4, 10, None);
    t.advance(4);
}

#[test]
fn concurrent_advances_report_monotonic_marks() {
    let seen = Mutex::new(Vec::new());
    let cb = |p: u8| seen.lock().unwrap().push(p);
    let t = ProgressTracker::new(1000, 10, Some(&cb));
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..250 {
                    t.advance(1);
                }
            });
        }
    });
    let got = seen.into_inner().unwrap();
    assert!(got.contains(&100));
    let mut dedup = got.clone();
    dedup.sort();
    dedup.dedup();
    assert_eq!(dedup.len(), got.len());
}

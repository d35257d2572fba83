use super::*;

fn frame(v: u8) -> ReconstructedFrame {
    ReconstructedFrame {
        width: 1,
        height: 1,
        data: vec![v; 4],
    }
}

#[test]
fn in_memory_sink_collects_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(BatchConfig {
        frame_count: 2,
        width: 1,
        height: 1,
    })
    .unwrap();
    sink.push_frame(0, frame(1)).unwrap();
    sink.push_frame(1, frame(2)).unwrap();
    sink.end().unwrap();

    assert_eq!(sink.config().map(|c| c.frame_count), Some(2));
    let frames = sink.into_frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].data, vec![2; 4]);
}

#[test]
fn in_memory_sink_rejects_gaps() {
    let mut sink = InMemorySink::new();
    sink.begin(BatchConfig {
        frame_count: 3,
        width: 1,
        height: 1,
    })
    .unwrap();
    let err = sink.push_frame(1, frame(0)).unwrap_err();
    assert!(err.to_string().contains("out of order"));
}

#[test]
fn begin_resets_previous_frames() {
    let mut sink = InMemorySink::new();
    let cfg = BatchConfig {
        frame_count: 1,
        width: 1,
        height: 1,
    };
    sink.begin(cfg).unwrap();
    sink.push_frame(0, frame(9)).unwrap();
    sink.begin(cfg).unwrap();
    assert!(sink.frames.is_empty());
}

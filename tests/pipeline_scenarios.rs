//! End-to-end scenarios driving both stage threads through the controller

use acqpipe::{
    AcquireError, FaultInjector, Frame, ParseResult, Pipeline, PipelineConfig, PipelineController,
    RegisterDecoder, ScriptEntry, ScriptedDecoder, ScriptedSource, SimulatedSource, StageKind,
    StageState, StatusEvent, TransferQueue,
};
use crossbeam_channel::{Receiver, unbounded};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Register frame from device 1 whose value field is `value`
fn frame(value: i16) -> Frame {
    let [hi, lo] = value.to_be_bytes();
    Frame::new(vec![0x01, 0x03, 0x00, 0x01, 0x00, 0x01, hi, lo])
}

fn fast_config() -> PipelineConfig {
    PipelineConfig::new()
        .with_receive_interval(Duration::from_millis(2))
        .with_idle_interval(Duration::from_millis(2))
        .with_grace_period(Duration::from_millis(300))
}

fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(1));
    }
}

fn collect(results: &Receiver<ParseResult>, n: usize) -> Vec<i16> {
    (0..n)
        .map(|_| {
            results
                .recv_timeout(Duration::from_secs(5))
                .expect("result not delivered in time")
                .value
        })
        .collect()
}

struct Harness {
    controller: PipelineController,
    results: Receiver<ParseResult>,
    status: Receiver<StatusEvent>,
}

fn harness(pipeline: Pipeline) -> Harness {
    let (result_tx, results) = unbounded();
    let (status_tx, status) = unbounded();
    let controller = pipeline
        .with_config(fast_config())
        .with_status_sink(Arc::new(status_tx))
        .with_result_sink(Box::new(result_tx))
        .build()
        .unwrap();
    Harness {
        controller,
        results,
        status,
    }
}

#[test]
fn all_frames_arrive_in_order_without_duplicates() {
    let h = harness(Pipeline::new(
        ScriptedSource::frames((1..=5).map(frame)),
        RegisterDecoder::new(),
    ));
    h.controller.start().unwrap();

    assert_eq!(collect(&h.results, 5), vec![1, 2, 3, 4, 5]);

    // Script exhausted: nothing more arrives, both stages keep running
    thread::sleep(Duration::from_millis(50));
    assert!(h.results.try_recv().is_err());
    assert_eq!(h.controller.receiver_state(), StageState::Running);
    assert_eq!(h.controller.parser_state(), StageState::Running);
    assert!(h.controller.queue().is_empty());
}

#[test]
fn receive_failure_halts_only_the_receiver() {
    let h = harness(Pipeline::new(
        ScriptedSource::new(vec![
            Ok(frame(1)),
            Ok(frame(2)),
            Err(AcquireError::Timeout),
            Ok(frame(30)),
            Ok(frame(40)),
        ]),
        RegisterDecoder::new(),
    ));
    h.controller.start().unwrap();

    wait_until("receiver fault", || {
        h.controller.receiver_state() == StageState::Faulted
    });
    assert_eq!(collect(&h.results, 2), vec![1, 2]);

    thread::sleep(Duration::from_millis(30));
    assert!(h.results.try_recv().is_err());
    assert_eq!(h.controller.parser_state(), StageState::Running);

    let failures: Vec<StatusEvent> = h
        .status
        .try_iter()
        .filter(|e| e.message.contains("network timeout"))
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].stage, StageKind::Receiver);

    // Restart resumes with the attempt after the failure
    h.controller.restart().unwrap();
    assert_eq!(collect(&h.results, 2), vec![30, 40]);
    assert_eq!(h.controller.receiver_state(), StageState::Running);
}

#[test]
fn decode_failure_halts_only_the_parser() {
    let queue = TransferQueue::new();
    for value in 1..=3 {
        queue.enqueue(frame(value));
    }
    let h = harness(
        Pipeline::new(
            ScriptedSource::default(),
            ScriptedDecoder::new(RegisterDecoder::new()).fail_on(2),
        )
        .with_queue(queue),
    );
    h.controller.start().unwrap();

    wait_until("parser fault", || {
        h.controller.parser_state() == StageState::Faulted
    });
    assert_eq!(collect(&h.results, 1), vec![1]);
    assert!(h.results.try_recv().is_err());
    assert_eq!(h.controller.queue().len(), 1);
    assert_eq!(h.controller.receiver_state(), StageState::Running);

    let failure = h
        .status
        .try_iter()
        .find(|e| e.stage == StageKind::Parser && e.message.starts_with("parse failed"))
        .expect("parser failure reported");
    assert!(failure.message.contains("scripted failure on call 2"));

    // The failing frame is gone; the next one decodes after restart
    h.controller.restart().unwrap();
    assert_eq!(collect(&h.results, 1), vec![3]);
    wait_until("queue drained", || h.controller.queue().is_empty());
}

#[test]
fn second_start_is_a_noop() {
    let h = harness(Pipeline::new(
        ScriptedSource::frames((1..=3).map(frame)),
        RegisterDecoder::new(),
    ));
    h.controller.start().unwrap();
    h.controller.start().unwrap();

    assert_eq!(collect(&h.results, 3), vec![1, 2, 3]);
    thread::sleep(Duration::from_millis(30));
    assert!(h.results.try_recv().is_err());

    let starts = h
        .status
        .try_iter()
        .filter(|e| e.message.starts_with("started"))
        .count();
    assert_eq!(starts, 2);
}

#[test]
fn stop_interrupts_a_slow_source_promptly() {
    let source =
        SimulatedSource::with_faults(FaultInjector::disabled()).with_latency(Duration::from_secs(60));
    let h = harness(Pipeline::new(source, RegisterDecoder::new()));
    h.controller.start().unwrap();
    thread::sleep(Duration::from_millis(20));

    let stopped_at = Instant::now();
    h.controller.stop();
    wait_until("receiver idle", || {
        h.controller.receiver_state() == StageState::Idle
    });
    assert!(stopped_at.elapsed() < Duration::from_secs(1));
}

#[test]
fn parser_drains_queue_during_grace_period() {
    let queue = TransferQueue::new();
    for value in 1..=5 {
        queue.enqueue(frame(value));
    }
    let h = harness(Pipeline::new(ScriptedSource::default(), RegisterDecoder::new()).with_queue(queue));
    h.controller.start().unwrap();
    let stopped_at = Instant::now();
    h.controller.stop();

    assert_eq!(collect(&h.results, 5), vec![1, 2, 3, 4, 5]);
    assert_eq!(h.controller.parser_state(), StageState::Running);

    wait_until("parser idle", || {
        h.controller.parser_state() == StageState::Idle
    });
    let config = h.controller.config();
    let drained_in = stopped_at.elapsed();
    assert!(drained_in >= config.grace_period, "parser ended early: {:?}", drained_in);
    assert!(
        drained_in < config.grace_period + config.idle_interval + Duration::from_millis(500),
        "parser outlived its grace period: {:?}",
        drained_in
    );
    assert_eq!(h.controller.receiver_state(), StageState::Idle);

    let stopped: Vec<StageKind> = h
        .status
        .try_iter()
        .filter(|e| e.message == "stopped")
        .map(|e| e.stage)
        .collect();
    assert_eq!(stopped, vec![StageKind::Receiver, StageKind::Parser]);
}

#[test]
fn quick_restart_after_stop_keeps_parser_alive() {
    let h = harness(Pipeline::new(
        ScriptedSource::with_script(vec![
            ScriptEntry::with_delay(Ok(frame(1)), Duration::from_millis(400)),
            ScriptEntry::with_delay(Ok(frame(2)), Duration::from_millis(400)),
        ]),
        RegisterDecoder::new(),
    ));
    h.controller.start().unwrap();
    thread::sleep(Duration::from_millis(20));

    h.controller.stop();
    wait_until("receiver idle", || {
        h.controller.receiver_state() == StageState::Idle
    });
    h.controller.start().unwrap();

    // The frame cut short by stop is retried, then the next one follows
    assert_eq!(collect(&h.results, 2), vec![1, 2]);
    assert_eq!(h.controller.parser_state(), StageState::Running);
    assert_eq!(h.controller.receiver_state(), StageState::Running);
}

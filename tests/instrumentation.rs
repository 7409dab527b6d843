//! Properties of the recorded call and access logs.

use std::sync::Arc;

use lifting_flow::{
    AccessLogger, AccessPattern, EventCollector, LiftingError, LogEvent, LoggerConfig, Timestamp,
    TransformChain, Wavelet,
};

fn chain_with(logger: AccessLogger, input: &[i64]) -> TransformChain {
    TransformChain::build(input, Wavelet::LeGall5_3, Arc::new(logger)).unwrap()
}

// ============================================================================
// Clock
// ============================================================================

#[test]
fn test_timestamps_are_unique_and_ordered() {
    let chain = chain_with(AccessLogger::new(), &[2, 7, 1, 8, 2, 8]);
    AccessPattern::Lazy.drive(&chain).unwrap();

    let mut seen = Vec::new();
    for call in chain.logger().call_log() {
        let end = call.end_time.unwrap();
        assert!(call.start_time < end);
        seen.push(call.start_time);
        seen.push(end);
        for access in &call.access_log {
            let access_end = access.end_time.unwrap();
            assert!(call.start_time < access.start_time);
            assert!(access.start_time < access_end);
            assert!(access_end < end);
            seen.push(access.start_time);
            seen.push(access_end);
        }
    }
    let total = seen.len();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), total);
}

#[test]
fn test_calls_are_ordered_by_start_time() {
    let chain = chain_with(AccessLogger::new(), &[1, 1, 2, 3, 5, 8, 13]);
    AccessPattern::LazyTwoSteps.drive(&chain).unwrap();
    let calls = chain.logger().call_log();
    assert!(calls.windows(2).all(|w| w[0].start_time < w[1].start_time));
}

#[test]
fn test_call_stack_is_empty_after_reads() {
    let chain = chain_with(AccessLogger::new(), &[4, 3, 2, 1]);
    chain.output().read(2).unwrap();
    assert_eq!(chain.logger().call_depth(), 0);
    assert!(chain.logger().active_calls().is_empty());
}

// ============================================================================
// Memoization
// ============================================================================

#[test]
fn test_repeated_reads_do_not_recompute() {
    let chain = chain_with(AccessLogger::new(), &[9, 9, 9, 9]);
    chain.output().read_all().unwrap();
    let calls = chain.logger().call_log().len();
    let time = chain.logger().now();

    chain.output().read_all().unwrap();
    assert_eq!(chain.logger().call_log().len(), calls);
    // Each cached read still takes exactly two ticks.
    assert_eq!(chain.logger().now(), Timestamp(time.0 + 2 * 4));
}

#[test]
fn test_first_and_last_access_of_shared_sample() {
    let chain = chain_with(AccessLogger::new(), &[10, 20, 30, 40]);
    AccessPattern::Block.drive(&chain).unwrap();
    let logger = chain.logger();
    let first = logger.first_access_time("Encoder Input", 2).unwrap();
    let last = logger.last_access_time("Encoder Input", 2).unwrap();
    // Read by the block pass and by the neighbors of slots 1 and 3.
    assert!(first < last);
    let trace = logger.trace();
    let times = trace.access_times_of("Encoder Input", 2).unwrap();
    assert_eq!((times.first, times.last), (first, last));
}

#[test]
fn test_out_of_range_read_is_not_logged() {
    let chain = chain_with(AccessLogger::new(), &[1, 2]);
    let err = chain.output().read(2).unwrap_err();
    assert!(matches!(err, LiftingError::IndexOutOfRange { index: 2, len: 2, .. }));
    assert_eq!(chain.logger().now(), Timestamp(0));
}

// ============================================================================
// Sinks and limits
// ============================================================================

#[test]
fn test_collector_mirrors_the_log() {
    let collector = Arc::new(EventCollector::new());
    let chain = chain_with(AccessLogger::new().with_sink(collector.clone()), &[6, 2, 8, 3]);
    AccessPattern::Block.drive(&chain).unwrap();

    let events = collector.events();
    assert!(events.windows(2).all(|w| w[0].time() < w[1].time()));
    assert_eq!(events.last().unwrap().time(), chain.logger().now());

    let starts = events
        .iter()
        .filter(|e| matches!(e, LogEvent::CallStart { .. }))
        .count();
    let ends = events
        .iter()
        .filter(|e| matches!(e, LogEvent::CallEnd { .. }))
        .count();
    assert_eq!(starts, chain.logger().call_log().len());
    assert_eq!(starts, ends);

    let max_depth = events
        .iter()
        .filter_map(|e| match e {
            LogEvent::CallStart { depth, .. } => Some(*depth),
            _ => None,
        })
        .max()
        .unwrap();
    // Block order keeps every source resolved before it is needed.
    assert_eq!(max_depth, 1);
}

#[test]
fn test_lazy_nests_through_every_stage() {
    let collector = Arc::new(EventCollector::new());
    let chain = chain_with(AccessLogger::new().with_sink(collector.clone()), &[6, 2, 8, 3]);
    chain.output().read(0).unwrap();
    let max_depth = collector
        .events()
        .iter()
        .filter_map(|e| match e {
            LogEvent::CallStart { depth, .. } => Some(*depth),
            _ => None,
        })
        .max()
        .unwrap();
    assert_eq!(max_depth, 4);
}

#[test]
fn test_depth_limit_stops_lazy_evaluation() {
    let logger = AccessLogger::with_config(LoggerConfig::default().with_max_call_depth(2));
    let chain = chain_with(logger, &[1, 2, 3, 4]);
    let err = chain.output().read(0).unwrap_err();
    assert!(matches!(err, LiftingError::CallDepthExceeded { depth: 3 }));
    assert_eq!(chain.logger().call_depth(), 0);
    assert!(chain.output().current_values().iter().all(Option::is_none));

    // Block order never nests, so the same limit is enough.
    AccessPattern::Block.drive(&chain).unwrap();
    assert_eq!(chain.output().read_all().unwrap(), vec![1, 2, 3, 4]);
}

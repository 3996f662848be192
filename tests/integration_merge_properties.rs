use bench_measurement::{Measurement, Metric, Operation, Statistics};

/// Build a worker measurement with a deterministic, worker-specific spread
/// of latencies and counters across several operation kinds.
fn worker(seed: u64) -> Measurement {
    let mut m = Measurement::new();
    for (i, op) in Operation::iter().enumerate() {
        let samples = (seed as usize + i) % 5;
        for k in 0..samples {
            m.record_latency(op, ((seed * 31 + k as u64 * 7 + i as u64) % 97) as f64 / 4.0);
            m.record_success(op);
            m.record_ok_points(op, seed + k as u64);
        }
        if (seed + i as u64) % 3 == 0 {
            m.record_failure(op);
            m.record_fail_points(op, seed * 2);
        }
    }
    m
}

fn sorted_bag(m: &Measurement, op: Operation) -> Vec<f64> {
    let mut values = m.latencies(op).to_vec();
    values.sort_by(f64::total_cmp);
    values
}

fn assert_same_result(a: &Measurement, b: &Measurement) {
    for op in Operation::iter() {
        assert_eq!(a.ok_operations(op), b.ok_operations(op), "{}", op);
        assert_eq!(a.fail_operations(op), b.fail_operations(op), "{}", op);
        assert_eq!(a.ok_points(op), b.ok_points(op), "{}", op);
        assert_eq!(a.fail_points(op), b.fail_points(op), "{}", op);
        assert_eq!(sorted_bag(a, op), sorted_bag(b, op), "{}", op);
    }
    assert_eq!(a.merged_workers(), b.merged_workers());
}

/// Merging in reverse order yields the same counters and latency bag.
#[test]
fn merge_is_order_independent() {
    let workers: Vec<_> = (1..=6).map(worker).collect();

    let forward = Measurement::merge_all(&workers);
    let backward = Measurement::merge_all(workers.iter().rev());

    assert_same_result(&forward, &backward);
}

/// Merging group results equals merging every worker directly, including
/// the slowest-worker latency total.
#[test]
fn merge_is_associative_over_partitions() {
    let workers: Vec<_> = (1..=7).map(worker).collect();
    let direct = Measurement::merge_all(&workers);

    let partitions: [&[usize]; 3] = [&[0, 3, 5], &[1, 6], &[2, 4]];
    let groups: Vec<_> = partitions
        .iter()
        .map(|idx| Measurement::merge_all(idx.iter().map(|&i| &workers[i])))
        .collect();
    let grouped = Measurement::merge_all(&groups);

    assert_same_result(&direct, &grouped);

    let mut direct = direct;
    let mut grouped = grouped;
    let direct_stats = Statistics::derive(&mut direct);
    let grouped_stats = Statistics::derive(&mut grouped);
    for op in Operation::iter() {
        assert_eq!(
            direct_stats.get(Metric::MaxThreadLatencySum, op),
            grouped_stats.get(Metric::MaxThreadLatencySum, op),
            "{}",
            op
        );
        assert_eq!(
            direct_stats.get(Metric::MedianLatency, op),
            grouped_stats.get(Metric::MedianLatency, op),
            "{}",
            op
        );
    }
}

/// The slowest worker is found per operation from each worker's own total,
/// not from the merged sequence.
#[test]
fn max_thread_latency_sum_uses_per_worker_totals() {
    let mut fast = Measurement::new();
    let mut slow = Measurement::new();
    for _ in 0..10 {
        fast.record_latency(Operation::Ingestion, 1.0);
    }
    slow.record_latency(Operation::Ingestion, 25.0);
    slow.record_latency(Operation::RangeQuery, 3.0);

    let mut merged = Measurement::merge_all([&fast, &slow]);
    let stats = Statistics::derive(&mut merged);

    assert_eq!(stats.get(Metric::MaxThreadLatencySum, Operation::Ingestion), Some(25.0));
    assert_eq!(stats.get(Metric::MaxThreadLatencySum, Operation::RangeQuery), Some(3.0));
    assert_eq!(merged.thread_latency_sums(Operation::Ingestion), &[10.0, 25.0]);
}

/// Deriving twice from the same merged measurement gives identical tables.
#[test]
fn derivation_is_idempotent_after_merge() {
    let workers: Vec<_> = (1..=4).map(worker).collect();
    let mut merged = Measurement::merge_all(&workers);

    let first = Statistics::derive(&mut merged);
    let second = Statistics::derive(&mut merged);

    assert_eq!(first, second);
}

/// An operation nobody recorded a latency for has no statistics, while its
/// counters remain readable as zeros.
#[test]
fn empty_operation_has_counters_but_no_statistics() {
    let mut a = Measurement::new();
    a.record_latency(Operation::Ingestion, 2.0);
    a.record_success(Operation::Ingestion);
    let b = Measurement::new();

    let mut merged = Measurement::merge_all([&a, &b]);
    let stats = Statistics::derive(&mut merged);

    assert!(stats.operation(Operation::AggValueQuery).is_none());
    assert_eq!(merged.ok_operations(Operation::AggValueQuery), 0);
    assert_eq!(merged.fail_points(Operation::AggValueQuery), 0);
    assert!(stats.operation(Operation::Ingestion).is_some());
}

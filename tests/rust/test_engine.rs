/// Integration tests for the simulation engine.
use dispatchsim_core::config::SimConfig;
use dispatchsim_core::{run_simulation, PolicyKind, RequestKind, Simulation};

fn baseline_config(policy: PolicyKind) -> SimConfig {
    SimConfig::from_str(&format!(
        r#"
[simulation]
name = "integration-test"
seed = 42
horizon = 2000.0
policy = "{}"

[cluster]
num_servers = 3
speeds = [1.0, 2.0, 4.0]

[workload]
arrival_rate = 0.5
"#,
        policy
    ))
    .unwrap()
}

#[test]
fn test_full_simulation_round_robin() {
    let mut sim = Simulation::new(baseline_config(PolicyKind::RoundRobin)).unwrap();
    let metrics = sim.run().unwrap();

    assert!(metrics.completed_requests > 0);
    assert!(metrics.result.throughput > 0.0);
    assert!(metrics.result.mean_response_time > 0.0);
    assert!(metrics.result.mean_utilization > 0.0);
    assert!(metrics.response_time.p50 > 0.0);
    assert!(metrics.jains_fairness_index > 0.0);
}

#[test]
fn test_same_seed_is_bit_identical() {
    for policy in PolicyKind::ALL {
        let a = run_simulation(policy, 0.8, 500.0, 7, 3, None, 0.2).unwrap();
        let b = run_simulation(policy, 0.8, 500.0, 7, 3, None, 0.2).unwrap();
        assert_eq!(a, b, "{} is not reproducible", policy);
    }
}

#[test]
fn test_different_seed_differs() {
    let a = run_simulation(PolicyKind::Random, 0.8, 500.0, 1, 3, None, 0.2).unwrap();
    let b = run_simulation(PolicyKind::Random, 0.8, 500.0, 2, 3, None, 0.2).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_conservation_without_capacity() {
    for policy in PolicyKind::ALL {
        let mut sim = Simulation::new(baseline_config(policy)).unwrap();
        let m = sim.run().unwrap();
        assert_eq!(m.dropped_requests, 0, "{} dropped requests", policy);
        assert_eq!(
            m.arrivals,
            m.completed_requests + m.in_flight_requests,
            "{} lost requests",
            policy
        );
    }
}

#[test]
fn test_conservation_with_bounded_queues() {
    let mut config = baseline_config(PolicyKind::Random);
    config.cluster.queue_capacity = Some(2);
    config.workload.arrival_rate = 2.0;

    let mut sim = Simulation::new(config).unwrap();
    let m = sim.run().unwrap();

    assert!(m.dropped_requests > 0, "overloaded bounded queues never dropped");
    assert_eq!(
        m.arrivals,
        m.completed_requests + m.in_flight_requests + m.dropped_requests
    );
    for server in sim.servers() {
        assert!(server.queue_length() <= 2);
    }
}

#[test]
fn test_fifo_per_server() {
    let mut sim = Simulation::new(baseline_config(PolicyKind::Random)).unwrap();
    sim.run().unwrap();

    for server in sim.servers() {
        let ids: Vec<u64> = sim
            .collector()
            .records()
            .iter()
            .filter(|r| r.server_id == server.id)
            .map(|r| r.request_id)
            .collect();
        assert!(
            ids.windows(2).all(|w| w[0] < w[1]),
            "server {} completed out of order",
            server.id
        );
    }
}

#[test]
fn test_completion_records_are_consistent() {
    let mut sim = Simulation::new(baseline_config(PolicyKind::ShortestQueue)).unwrap();
    sim.run().unwrap();

    for r in sim.collector().records() {
        assert!(r.arrival_time <= r.start_time);
        assert!(r.start_time <= r.completion_time);
        assert!(r.completion_time <= 2000.0);
        assert!((r.completion_time - r.start_time - r.service_time).abs() < 1e-6);
    }
}

#[test]
fn test_monotonic_utilization_over_rate() {
    let utilizations: Vec<f64> = [0.1, 0.2, 0.4]
        .iter()
        .map(|&rate| {
            run_simulation(PolicyKind::RoundRobin, rate, 5000.0, 42, 3, None, 0.2)
                .unwrap()
                .mean_utilization
        })
        .collect();

    assert!(
        utilizations.windows(2).all(|w| w[0] <= w[1]),
        "utilization decreased with rate: {:?}",
        utilizations
    );
}

#[test]
fn test_single_server_scenario() {
    let mut config = SimConfig::new(PolicyKind::Random, 0.5, 1000.0, 42, 1);
    config.cluster.smoothing_factor = 0.2;
    let mut sim = Simulation::new(config).unwrap();
    let m = sim.run().unwrap();

    let processed = sim.servers()[0].processed_count;
    assert_eq!(m.result.throughput, processed as f64 / 1000.0);
    assert!((0.0..=1.0).contains(&m.result.mean_utilization));
}

#[test]
fn test_least_connections_burst() {
    let mut sim = Simulation::new(baseline_config(PolicyKind::LeastConnections)).unwrap();
    let targets: Vec<_> = (0..3)
        .map(|_| sim.dispatch(RequestKind::Io, 2.0))
        .collect();

    assert_eq!(targets, vec![Some(0), Some(1), Some(2)]);
    for server in sim.servers() {
        assert_eq!(server.received_count, 1);
    }
}

#[test]
fn test_clock_ends_at_horizon() {
    let mut sim = Simulation::new(baseline_config(PolicyKind::Adaptive)).unwrap();
    sim.run_until(300.0).unwrap();
    assert_eq!(sim.now(), 300.0);
    sim.run().unwrap();
    assert_eq!(sim.now(), 2000.0);
}

#[test]
fn test_run_simulation_validates_inputs() {
    assert!(run_simulation(PolicyKind::Random, 0.5, 0.0, 42, 3, None, 0.2).is_err());
    assert!(run_simulation(PolicyKind::Random, 0.5, 100.0, 42, 0, None, 0.2).is_err());
    assert!(run_simulation(PolicyKind::Random, 0.0, 100.0, 42, 3, None, 0.2).is_err());
    assert!(run_simulation(PolicyKind::Random, 0.5, 100.0, 42, 3, Some(vec![1.0]), 0.2).is_err());
    assert!(run_simulation(PolicyKind::Random, 0.5, 100.0, 42, 3, None, 0.0).is_err());
}

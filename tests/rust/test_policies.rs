/// Integration tests for dispatch policies in a simulation context.
use dispatchsim_core::config::SimConfig;
use dispatchsim_core::{compare_policies, PolicyKind, RequestKind, Simulation};

fn hetero_config(policy: PolicyKind, rate: f64) -> SimConfig {
    let mut config = SimConfig::new(policy, rate, 2000.0, 42, 3);
    config.cluster.speeds = Some(vec![1.0, 2.0, 4.0]);
    config
}

fn received(sim: &Simulation) -> Vec<u64> {
    sim.servers().iter().map(|s| s.received_count).collect()
}

#[test]
fn test_all_policies_complete_requests() {
    for policy in PolicyKind::ALL {
        let mut sim = Simulation::new(hetero_config(policy, 0.5)).unwrap();
        let m = sim.run().unwrap();
        assert!(
            m.completed_requests > 0,
            "Policy {} produced no completed requests",
            policy
        );
        assert_eq!(m.policy, policy.as_str());
    }
}

#[test]
fn test_round_robin_is_floor_ceil_fair() {
    let mut sim = Simulation::new(hetero_config(PolicyKind::RoundRobin, 0.5)).unwrap();
    let m = sim.run().unwrap();
    let counts = received(&sim);

    let n = counts.len() as u64;
    let floor = m.arrivals / n;
    let ceil = (m.arrivals + n - 1) / n;
    for c in &counts {
        assert!(*c == floor || *c == ceil, "{:?} not within [{}, {}]", counts, floor, ceil);
    }
    assert_eq!(counts.iter().sum::<u64>(), m.arrivals);
}

#[test]
fn test_shortest_queue_always_picks_a_minimal_queue() {
    let mut sim = Simulation::new(hetero_config(PolicyKind::ShortestQueue, 1.0)).unwrap();

    for step in 1..=200 {
        sim.run_until(step as f64 * 5.0).unwrap();
        let lengths: Vec<usize> = sim.servers().iter().map(|s| s.queue_length()).collect();
        let shortest = lengths.iter().copied().min().unwrap_or(0);

        let target = sim.dispatch(RequestKind::Compute, 1.0).unwrap();
        assert_eq!(
            lengths[target as usize], shortest,
            "picked server {} with queues {:?}",
            target, lengths
        );
    }
}

#[test]
fn test_shortest_queue_beats_random_under_load() {
    let random = Simulation::new(hetero_config(PolicyKind::Random, 0.5))
        .unwrap()
        .run()
        .unwrap();
    let jsq = Simulation::new(hetero_config(PolicyKind::ShortestQueue, 0.5))
        .unwrap()
        .run()
        .unwrap();

    assert!(
        jsq.result.mean_response_time < random.result.mean_response_time,
        "JSQ {} vs random {}",
        jsq.result.mean_response_time,
        random.result.mean_response_time
    );
}

#[test]
fn test_least_expected_delay_favours_fast_servers() {
    let mut sim = Simulation::new(hetero_config(PolicyKind::LeastExpectedDelay, 0.5)).unwrap();
    sim.run().unwrap();
    let counts = received(&sim);
    assert!(counts[2] > counts[0], "fast server got {:?}", counts);
}

#[test]
fn test_power_of_two_on_single_server() {
    let mut config = SimConfig::new(PolicyKind::PowerOfTwoChoices, 0.2, 500.0, 3, 1);
    config.cluster.speeds = Some(vec![2.0]);
    let mut sim = Simulation::new(config).unwrap();
    let m = sim.run().unwrap();
    assert_eq!(received(&sim), vec![m.arrivals]);
}

#[test]
fn test_least_response_time_with_alpha_one() {
    let mut config = hetero_config(PolicyKind::LeastResponseTime, 0.5);
    config.cluster.smoothing_factor = 1.0;
    let mut sim = Simulation::new(config).unwrap();
    sim.run().unwrap();

    // With alpha = 1 the average is the latest sample.
    for server in sim.servers() {
        if let Some(last) = server.response_time_samples.last() {
            assert_eq!(server.smoothed_response_time, *last);
        }
    }
}

#[test]
fn test_compare_mode() {
    let config = hetero_config(PolicyKind::Random, 0.5);
    let results = compare_policies(
        &config,
        &[
            PolicyKind::RoundRobin,
            PolicyKind::LeastLoad,
            PolicyKind::Adaptive,
        ],
    )
    .unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].policy, "round_robin");
    assert_eq!(results[1].policy, "least_load");
    assert_eq!(results[2].policy, "adaptive");
}

#[test]
fn test_policy_aliases_resolve() {
    for (alias, kind) in [
        ("roundrobin", PolicyKind::RoundRobin),
        ("shortest", PolicyKind::ShortestQueue),
        ("p2c", PolicyKind::PowerOfTwoChoices),
    ] {
        let mut config = SimConfig::default();
        config.simulation.policy = alias.to_string();
        assert_eq!(Simulation::new(config).unwrap().policy(), kind);
    }
}

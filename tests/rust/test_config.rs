/// Integration tests for configuration loading.
use dispatchsim_core::config::{ConfigError, SimConfig};
use dispatchsim_core::{PolicyKind, ServiceDistribution, Simulation};
use std::path::PathBuf;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "dispatchsim-{}-{}.toml",
        name,
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_from_file_round_trip() {
    let path = write_temp(
        "baseline",
        r#"
[simulation]
name = "baseline"
seed = 7
horizon = 300.0
policy = "least_expected_delay"

[cluster]
num_servers = 2
speeds = [1.0, 3.0]

[workload]
arrival_rate = 0.4
compute_mean = 1.5
io_mean = 3.0
service_distribution = "exponential"
"#,
    );

    let config = SimConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.simulation.name, "baseline");
    assert_eq!(config.policy_kind().unwrap(), PolicyKind::LeastExpectedDelay);
    assert_eq!(config.server_speeds(), vec![1.0, 3.0]);
    assert_eq!(config.service_model().compute_mean, 1.5);
    assert_eq!(
        config.service_model().distribution,
        ServiceDistribution::Exponential
    );

    let mut sim = Simulation::new(config).unwrap();
    assert_eq!(sim.name(), "baseline");
    assert_eq!(sim.run().unwrap().horizon, 300.0);
}

#[test]
fn test_missing_file_is_io_error() {
    let path = std::env::temp_dir().join("dispatchsim-does-not-exist.toml");
    assert!(matches!(
        SimConfig::from_file(&path),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_uniform_service_runs() {
    let config = SimConfig::from_str(
        r#"
[simulation]
horizon = 500.0
policy = "shortest_queue"

[workload]
service_distribution = "uniform"
"#,
    )
    .unwrap();
    let m = Simulation::new(config).unwrap().run().unwrap();
    assert!(m.completed_requests > 0);
}

#[test]
fn test_unknown_policy_reported_by_name() {
    let err = SimConfig::from_str("[simulation]\npolicy = \"weighted_magic\"\n").unwrap_err();
    assert!(err.to_string().contains("weighted_magic"));
}

#[test]
fn test_invalid_values_rejected_before_running() {
    let cases = [
        "[cluster]\nnum_servers = 0\n",
        "[simulation]\nhorizon = -5.0\n",
        "[workload]\narrival_rate = -1.0\n",
        "[workload]\ncompute_mean = 0.0\n",
        "[cluster]\nnum_servers = 2\nspeeds = [1.0, -2.0]\n",
        "[cluster]\nsmoothing_factor = 2.0\n",
        "[cluster]\nqueue_capacity = 0\n",
    ];
    for toml in cases {
        assert!(
            matches!(SimConfig::from_str(toml), Err(ConfigError::Validation(_))),
            "accepted invalid config:\n{}",
            toml
        );
    }
}

#[test]
fn test_programmatic_config_is_validated_by_simulation() {
    let mut config = SimConfig::new(PolicyKind::Random, 0.5, 100.0, 1, 3);
    config.cluster.speeds = Some(vec![1.0, 2.0]);
    assert!(matches!(
        Simulation::new(config),
        Err(ConfigError::Validation(_))
    ));
}

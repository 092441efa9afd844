//! Metrics collection and aggregation for simulation runs.
//!
//! The headline output of a run is the [`SimulationResult`] triple
//! (throughput, mean response time, mean utilization). [`SimulationMetrics`]
//! carries it alongside response-time percentiles, per-server breakdowns,
//! fairness and drop counts.

use crate::request::RequestKind;
use crate::server::SimulatedServer;
use log::warn;
use serde::{Deserialize, Serialize};

/// Per-request completion record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub request_id: u64,
    pub server_id: u32,
    pub kind: RequestKind,
    pub arrival_time: f64,
    /// When the worker dequeued the request.
    pub start_time: f64,
    pub completion_time: f64,
    pub service_time: f64,
}

impl CompletionRecord {
    pub fn response_time(&self) -> f64 {
        self.completion_time - self.arrival_time
    }

    /// Time spent waiting in the queue before service started.
    pub fn queue_wait(&self) -> f64 {
        self.start_time - self.arrival_time
    }
}

/// Percentile values for a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Percentiles {
    /// Compute percentiles from a slice of values.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                p50: 0.0,
                p90: 0.0,
                p99: 0.0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
            };
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();

        Self {
            p50: percentile_sorted(&sorted, 50.0),
            p90: percentile_sorted(&sorted, 90.0),
            p99: percentile_sorted(&sorted, 99.0),
            min: sorted[0],
            max: sorted[n - 1],
            mean: mean(values),
        }
    }
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// The three figures a run is judged by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Completed requests per unit of virtual time.
    pub throughput: f64,
    /// Mean response time over all completions; 0 if nothing completed.
    pub mean_response_time: f64,
    /// Mean over servers of busy time / horizon.
    pub mean_utilization: f64,
}

/// Per-server summary at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStats {
    pub id: u32,
    pub speed: f64,
    pub received: u64,
    pub processed: u64,
    pub utilization: f64,
    pub mean_response_time: f64,
    pub smoothed_response_time: f64,
    /// Requests still queued or in service at the horizon.
    pub in_flight: u64,
}

/// Aggregated metrics for an entire simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    /// Policy name.
    pub policy: String,
    pub arrival_rate: f64,
    pub horizon: f64,
    pub result: SimulationResult,

    // Request accounting
    pub arrivals: u64,
    pub completed_requests: u64,
    /// Rejected because the chosen server's queue was full.
    pub dropped_requests: u64,
    /// Accepted but not finished by the horizon.
    pub in_flight_requests: u64,

    // Latency
    pub response_time: Percentiles,
    pub queue_wait: Percentiles,

    // Fairness
    pub jains_fairness_index: f64,
    pub load_cv: f64,

    pub per_server: Vec<ServerStats>,
}

/// Collector that accumulates per-request records during simulation.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    records: Vec<CompletionRecord>,
    arrivals: u64,
    dropped: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an arrival, before routing.
    pub fn record_arrival(&mut self) {
        self.arrivals += 1;
    }

    /// Record a completed request.
    pub fn record(&mut self, record: CompletionRecord) {
        self.records.push(record);
    }

    /// Record a request dropped at a full queue.
    pub fn record_drop(&mut self) {
        self.dropped += 1;
    }

    pub fn arrivals(&self) -> u64 {
        self.arrivals
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// All completion records, in completion order.
    pub fn records(&self) -> &[CompletionRecord] {
        &self.records
    }

    /// Compute the headline triple from final server state.
    pub fn result(servers: &[SimulatedServer], horizon: f64) -> SimulationResult {
        let processed: u64 = servers.iter().map(|s| s.processed_count).sum();
        let samples: Vec<f64> = servers
            .iter()
            .flat_map(|s| s.response_time_samples.iter().copied())
            .collect();
        let utilizations: Vec<f64> = servers.iter().map(|s| s.utilization(horizon)).collect();

        SimulationResult {
            throughput: processed as f64 / horizon,
            mean_response_time: mean(&samples),
            mean_utilization: mean(&utilizations),
        }
    }

    /// Aggregate all metrics into a summary.
    pub fn aggregate(
        &self,
        policy: &str,
        arrival_rate: f64,
        horizon: f64,
        servers: &[SimulatedServer],
    ) -> SimulationMetrics {
        let result = Self::result(servers, horizon);

        let response_values: Vec<f64> = self.records.iter().map(|r| r.response_time()).collect();
        let wait_values: Vec<f64> = self.records.iter().map(|r| r.queue_wait()).collect();

        let per_server: Vec<ServerStats> = servers
            .iter()
            .map(|s| ServerStats {
                id: s.id,
                speed: s.speed,
                received: s.received_count,
                processed: s.processed_count,
                utilization: s.utilization(horizon),
                mean_response_time: mean(&s.response_time_samples),
                smoothed_response_time: s.smoothed_response_time,
                in_flight: s.in_flight(),
            })
            .collect();

        let processed: Vec<u64> = per_server.iter().map(|s| s.processed).collect();
        let in_flight: u64 = per_server.iter().map(|s| s.in_flight).sum();

        if self.dropped > 0 {
            warn!(
                "{}: dropped {} of {} arrivals at full queues",
                policy, self.dropped, self.arrivals
            );
        }

        SimulationMetrics {
            policy: policy.to_string(),
            arrival_rate,
            horizon,
            result,
            arrivals: self.arrivals,
            completed_requests: processed.iter().sum(),
            dropped_requests: self.dropped,
            in_flight_requests: in_flight,
            response_time: Percentiles::from_values(&response_values),
            queue_wait: Percentiles::from_values(&wait_values),
            jains_fairness_index: jains_fairness_index(&processed),
            load_cv: coefficient_of_variation(&processed),
            per_server,
        }
    }
}

/// Coefficient of variation (std / mean).
fn coefficient_of_variation(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<u64>() as f64 / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt() / mean
}

/// Jain's fairness index: (sum(x_i))^2 / (n * sum(x_i^2)).
fn jains_fairness_index(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    let sum_sq: f64 = values.iter().map(|&v| (v as f64).powi(2)).sum();
    if sum_sq == 0.0 {
        return 1.0;
    }
    (sum * sum) / (n * sum_sq)
}

/// Format metrics as a pretty-printed table string.
pub fn format_table(metrics: &SimulationMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n{:=<70}\n",
        format!("  {} Results  ", metrics.policy)
    ));
    out.push_str(&format!(
        "  Horizon: {:.1} | Rate: {:.3} | Arrivals: {} ({} dropped, {} in flight)\n",
        metrics.horizon,
        metrics.arrival_rate,
        metrics.arrivals,
        metrics.dropped_requests,
        metrics.in_flight_requests,
    ));
    out.push_str(&format!("{:-<70}\n", "  Summary  "));
    out.push_str(&format!(
        "  Throughput: {:.4}  Mean response: {:.3}  Mean utilization: {:.3}\n",
        metrics.result.throughput,
        metrics.result.mean_response_time,
        metrics.result.mean_utilization,
    ));
    out.push_str(&format!("{:-<70}\n", "  Latency  "));
    out.push_str(&format!(
        "  Response        P50={:>8.2}  P90={:>8.2}  P99={:>8.2}\n",
        metrics.response_time.p50, metrics.response_time.p90, metrics.response_time.p99
    ));
    out.push_str(&format!(
        "  Queue wait      P50={:>8.2}  P90={:>8.2}  P99={:>8.2}\n",
        metrics.queue_wait.p50, metrics.queue_wait.p90, metrics.queue_wait.p99
    ));
    out.push_str(&format!("{:-<70}\n", "  Servers  "));
    for s in &metrics.per_server {
        out.push_str(&format!(
            "  #{:<3} speed={:<6.2} recv={:<7} done={:<7} util={:.3}  resp={:.2}\n",
            s.id, s.speed, s.received, s.processed, s.utilization, s.mean_response_time
        ));
    }
    out.push_str(&format!(
        "  Load CV: {:.3}  Jain's index: {:.4}\n",
        metrics.load_cv, metrics.jains_fairness_index,
    ));
    out.push_str(&format!("{:=<70}\n", ""));
    out
}

/// Format a comparison table of multiple policy results.
pub fn format_comparison_table(results: &[SimulationMetrics]) -> String {
    if results.is_empty() {
        return String::from("No results to compare.\n");
    }

    let mut out = String::new();
    out.push_str(&format!("\n{:=<90}\n", "  Policy Comparison  "));
    out.push_str(&format!(
        "{:<22} {:>10} {:>10} {:>10} {:>10} {:>8} {:>8}\n",
        "Policy", "Thruput", "Resp mean", "Resp p99", "Util", "Dropped", "Jain's"
    ));
    out.push_str(&format!("{:-<90}\n", ""));

    for m in results {
        out.push_str(&format!(
            "{:<22} {:>10.4} {:>10.3} {:>10.3} {:>10.3} {:>8} {:>8.4}\n",
            m.policy,
            m.result.throughput,
            m.result.mean_response_time,
            m.response_time.p99,
            m.result.mean_utilization,
            m.dropped_requests,
            m.jains_fairness_index,
        ));
    }
    out.push_str(&format!("{:=<90}\n", ""));
    out
}

//! `jpdassoc` CLI: load a scenario, run one association cycle, report the
//! hypotheses, weights and updated tracks, and optionally export the
//! hypothesis records as CSV.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jpda_core::gating::CHI2_95;
use jpda_core::pipeline::{CycleOutput, Pipeline, PipelineConfig};
use jpda_core::types::{Report, ReportId, StateCov, StateVec, Track, TrackId};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "jpdassoc", about = "JPDA report-to-track association")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one cycle on a scenario file (JSON).
    Run {
        /// Path to the scenario JSON
        input: PathBuf,
        /// Export the hypothesis records as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Override the gate threshold τ (default: scenario value or χ²(0.95, 3))
        #[arg(long)]
        gate: Option<f64>,
    },
    /// Run the built-in 3-track / 4-report demo scenario.
    Demo {
        /// Export the hypothesis records as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Scenario file
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScenarioFile {
    tracks: Vec<TrackSpec>,
    reports: Vec<[f64; 3]>,
    /// Shared measurement-noise covariance R, row-major. Default: identity.
    #[serde(default)]
    noise_cov: Option<[[f64; 3]; 3]>,
    /// Gate threshold τ. Default: χ²(0.95, 3) ≈ 7.8147.
    #[serde(default)]
    gate_threshold: Option<f64>,
}

#[derive(Deserialize)]
struct TrackSpec {
    state: [f64; 3],
    /// Prior covariance, row-major. Default: identity.
    #[serde(default)]
    cov: Option<[[f64; 3]; 3]>,
}

fn matrix_from_rows(rows: &[[f64; 3]; 3]) -> StateCov {
    StateCov::from_fn(|r, c| rows[r][c])
}

impl ScenarioFile {
    fn into_inputs(self) -> (Vec<Track>, Vec<Report>, PipelineConfig) {
        let tracks = self
            .tracks
            .into_iter()
            .enumerate()
            .map(|(i, spec)| {
                Track::new(
                    TrackId(i),
                    StateVec::from_column_slice(&spec.state),
                    spec.cov
                        .map(|c| matrix_from_rows(&c))
                        .unwrap_or_else(StateCov::identity),
                )
            })
            .collect();
        let reports = self
            .reports
            .into_iter()
            .enumerate()
            .map(|(j, p)| Report::new(ReportId(j), StateVec::from_column_slice(&p)))
            .collect();
        let config = PipelineConfig {
            noise_cov: self
                .noise_cov
                .map(|c| matrix_from_rows(&c))
                .unwrap_or_else(StateCov::identity),
            gate_threshold: self.gate_threshold.unwrap_or(CHI2_95[3]),
        };
        (tracks, reports, config)
    }
}

/// The canonical 3-track / 4-report scenario (identity covariances, one
/// report far outside every gate).
fn demo_scenario() -> ScenarioFile {
    ScenarioFile {
        tracks: vec![
            TrackSpec { state: [6.0, 6.0, 10.0], cov: None },
            TrackSpec { state: [15.0, 15.0, 10.0], cov: None },
            TrackSpec { state: [7.0, 7.0, 10.0], cov: None },
        ],
        reports: vec![
            [7.0, 7.0, 10.0],
            [16.0, 16.0, 10.0],
            [8.0, 8.0, 10.0],
            [80.0, 80.0, 80.0],
        ],
        noise_cov: None,
        gate_threshold: None,
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { input, csv, gate } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("reading scenario {}", input.display()))?;
            let mut scenario: ScenarioFile =
                serde_json::from_str(&text).context("parsing scenario JSON")?;
            if let Some(gate) = gate {
                scenario.gate_threshold = Some(gate);
            }
            run_cycle(scenario, csv.as_deref())
        }
        Commands::Demo { csv } => run_cycle(demo_scenario(), csv.as_deref()),
    }
}

fn run_cycle(scenario: ScenarioFile, csv_path: Option<&Path>) -> Result<()> {
    let (mut tracks, reports, config) = scenario.into_inputs();
    let n_tracks = tracks.len();
    let pipeline = Pipeline::new(config)?;

    println!(
        "Gate threshold: {:.4} ({} tracks, {} reports)",
        pipeline.config().gate_threshold,
        n_tracks,
        reports.len()
    );

    let out = pipeline.process_cycle(&mut tracks, &reports)?;
    print_summary(&out, &tracks);

    if let Some(path) = csv_path {
        write_csv(&out, n_tracks, path)?;
        println!("Hypotheses saved to {}", path.display());
    }
    Ok(())
}

fn print_summary(out: &CycleOutput, tracks: &[Track]) {
    for c in &out.candidates {
        println!(
            "{} associated with {}, Mahalanobis distance: {:.4}",
            c.track, c.report, c.distance
        );
    }

    for (idx, cluster) in out.clusters.iter().enumerate() {
        let ts: Vec<String> = cluster.track_ids.iter().map(|t| t.to_string()).collect();
        let rs: Vec<String> = cluster.report_ids.iter().map(|r| r.to_string()).collect();
        println!("Cluster {idx}: tracks [{}], reports [{}]", ts.join(", "), rs.join(", "));
    }
    for idx in &out.skipped_clusters {
        println!("Cluster {idx}: skipped (no scorable hypothesis)");
    }

    for record in &out.records {
        let assigned: Vec<String> = record
            .report_ids
            .iter()
            .map(|r| r.map_or_else(|| "0".to_string(), |r| r.to_string()))
            .collect();
        println!(
            "Hypothesis: [{}], Probability: {:.4}, Joint Probability: {:.4}",
            assigned.join(", "),
            record.probability,
            record.joint_probability
        );
    }

    for w in &out.weights {
        println!("Track {}, Report {}: {:.4}", w.track, w.report, w.weight);
    }

    for b in &out.best_assignments {
        println!(
            "Most likely association for Report {}: Track {}, Probability: {:.4}",
            b.report, b.track, b.probability
        );
    }

    for (track, err) in &out.update_failures {
        println!("Track {track}: update failed ({err})");
    }

    for track in tracks {
        println!(
            "Track {}: state [{:.4}, {:.4}, {:.4}]",
            track.id, track.state[0], track.state[1], track.state[2]
        );
    }
}

/// Export hypothesis records as CSV. The header is sized to the overall
/// track count K, while each data row carries the owning cluster's
/// columns, so rows from smaller clusters are shorter than the header.
/// Existing consumers of the format rely on this exact shape.
fn write_csv(out: &CycleOutput, n_tracks: usize, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let mut header: Vec<String> = (1..=n_tracks).map(|i| format!("Track ID {i}")).collect();
    header.extend((1..=n_tracks).map(|i| format!("Report ID {i}")));
    header.push("Probability".into());
    header.push("Joint Probability".into());
    writer.write_record(&header)?;

    for record in &out.records {
        let mut row: Vec<String> = record.track_ids.iter().map(|t| t.to_string()).collect();
        row.extend(
            record
                .report_ids
                .iter()
                .map(|r| r.map_or_else(|| "0".to_string(), |r| r.to_string())),
        );
        row.push(record.probability.to_string());
        row.push(record.joint_probability.to_string());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

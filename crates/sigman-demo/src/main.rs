//! End-to-end walk through the signal model on a simulated recording
//!
//! Usage: `sigman-demo [analysis-config.json]`

use anyhow::{Context, Result};
use sigman_analysis::{analyzer, AnalysisConfig, ProcedureCatalog};
use sigman_core::{Resolution, SignalRegistry, TimeSpan};
use sigman_simulation::{RecordingConfig, RecordingSimulator, RhythmPattern};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let catalog = ProcedureCatalog::with_builtin();
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read analysis configuration {}", path))?;
            AnalysisConfig::from_json(&json).with_context(|| format!("failed to load {}", path))?
        }
        None => AnalysisConfig::for_catalog("demo", &catalog),
    };
    config.validate(&catalog).context("invalid analysis configuration")?;
    info!(profile = %config.name, procedures = ?catalog.names(), "analysis configured");

    let mut registry = simulate()?;
    report_timeline(&registry)?;

    let common = registry
        .common_range(&["ecg", "bp"])?
        .context("ecg and bp do not overlap")?;

    // smooth the ECG, then look for R peaks in it
    let smoothing = catalog.get("moving_average")?;
    analyzer::apply_filter(
        &mut registry,
        smoothing,
        common,
        &config.procedure_config(smoothing),
        None,
    )?;

    let detector = catalog.get("r_simple")?;
    let detected = analyzer::find_points(
        &registry,
        detector,
        common,
        &config.procedure_config(detector),
        Some("r_detected"),
    )?;
    let truth = registry.points("r").context("simulated recording lost its R peaks")?;
    let expected = truth.index_range(common.begin, common.end).map_or(0, |r| r.len());
    if detected.len() != expected {
        warn!(detected = detected.len(), expected, "R detection disagrees with ground truth");
    }
    println!("R peaks in common range: {} detected, {} simulated", detected.len(), expected);
    registry.add_points(detected, None, false)?;

    // hand-edit the detection: drop the beat nearest 30 s and put it back
    let points = registry
        .points_mut("r_detected")
        .context("detected points were not registered")?;
    let (time, value) = points.remove_nearest(30.0, None)?;
    println!("removed R peak at {:.3}s ({:.3} mV)", time, value);
    points.insert(time, value)?;

    let heart_rate = catalog.get("heart_rate")?;
    let window = config.parameter_window;
    let windows = analyzer::parameter_windows(common, window.length, window.step)?;
    let hr = analyzer::calculate_parameter(
        &registry,
        heart_rate,
        &windows,
        &config.procedure_config(heart_rate),
        None,
    )?;
    for (begin, end, bpm) in hr.iter() {
        println!("  {} heart rate {:.1} bpm", TimeSpan::new(begin, end), bpm);
    }
    registry.add_parameter(hr, None, true)?;

    // move the ECG and keep the R peaks valued with it
    let ecg = registry.wave_mut("ecg").context("ecg missing")?;
    let shifted = ecg.offset() - 0.25;
    ecg.set_offset(shifted)?;
    let ecg = ecg.clone();
    let r = registry.points_mut("r").context("r missing")?;
    r.shift(-0.25)?;
    r.realign_to(&ecg)?;

    let preview = ecg.slice(common.begin, common.begin + 1.0, Resolution::Count(10))?;
    println!("first second of shifted ECG at 10 Hz: {:.3?}", preview);

    report_timeline(&registry)?;
    info!(
        waves = registry.wave_labels().len(),
        point_sets = registry.point_labels().len(),
        parameters = registry.parameter_labels().len(),
        "analysis complete"
    );
    Ok(())
}

fn simulate() -> Result<SignalRegistry> {
    let config = RecordingConfig {
        duration: 120.0,
        heart_rate: 68.0,
        rhythm: RhythmPattern::Sinus {
            depth: 0.05,
            frequency: 0.25,
        },
        bp_offset: 1.5,
        seed: Some(2024),
        ..Default::default()
    };
    let recording = RecordingSimulator::new(config)
        .context("invalid simulation configuration")?
        .generate()
        .context("simulation failed")?;
    Ok(recording.into_registry()?)
}

fn report_timeline(registry: &SignalRegistry) -> Result<()> {
    let overall = registry.overall_span().context("registry is empty")?;
    println!("overall span: {}", overall);
    for label in registry.wave_labels() {
        if let Some(wave) = registry.wave(label) {
            println!(
                "  wave {:<4} {} at {:.0} Hz",
                label,
                wave.span(),
                wave.sample_rate()
            );
        }
    }
    for label in registry.point_labels() {
        if let Some(points) = registry.points(label) {
            println!("  points {:<10} {} events", label, points.len());
        }
    }
    match registry.common_range(&["ecg", "bp"])? {
        Some(common) => println!("common range of ecg and bp: {}", common),
        None => println!("ecg and bp do not overlap"),
    }
    Ok(())
}

//! somnoise CLI: render long ambient noise tracks and master them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use somnoise_engine::{
    generate_to_file, master_file, measure_file, FilterSpec, GenerationConfig, MasterReport,
    Metrics, Preset, RenderReport, DEFAULT_SAMPLE_RATE,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "somnoise", version, about = "Long-duration ambient noise generator and mastering")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize a raw track block by block.
    Generate {
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        gen: GenerateArgs,
    },
    /// Band-filter, fade and normalize an existing track.
    Master {
        #[arg(long = "in")]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sr: u32,
        #[command(flatten)]
        master: MasterArgs,
    },
    /// Generate, master and measure in one go.
    Render {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        name: String,
        #[command(flatten)]
        gen: GenerateArgs,
        #[command(flatten)]
        master: MasterArgs,
    },
    /// Print peak and RMS of a mono 16-bit WAV.
    Measure { path: PathBuf },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, default_value_t = 8.0)]
    hours: f64,
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sr: u32,
    /// brown_noise | fan_noise | rain_window | ocean_waves
    #[arg(long, default_value = "brown_noise")]
    preset: Preset,
    /// Fixed seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
}

impl GenerateArgs {
    fn config(&self) -> GenerationConfig {
        let cfg = GenerationConfig::from_hours(self.preset, self.hours, self.sr);
        match self.seed {
            Some(seed) => cfg.with_seed(seed),
            None => cfg,
        }
    }
}

#[derive(Args, Debug)]
struct MasterArgs {
    #[arg(long, default_value_t = -20.0, allow_hyphen_values = true)]
    target_rms_db: f64,
    #[arg(long, default_value_t = 15)]
    fade_seconds: u32,
    /// 0 disables the highpass.
    #[arg(long, default_value_t = 18.0)]
    highpass_hz: f64,
    /// 0 disables the lowpass.
    #[arg(long, default_value_t = 1200.0)]
    lowpass_hz: f64,
    #[arg(long, default_value_t = 0.98)]
    peak_ceiling_linear: f64,
}

impl From<&MasterArgs> for FilterSpec {
    fn from(a: &MasterArgs) -> Self {
        FilterSpec {
            highpass_hz: Some(a.highpass_hz),
            lowpass_hz: Some(a.lowpass_hz),
            fade_seconds: a.fade_seconds,
            target_rms_dbfs: a.target_rms_db,
            peak_ceiling_linear: a.peak_ceiling_linear,
        }
    }
}

fn init_tracing() {
    // Logs go to stderr so the printed summaries stay clean on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn generate(out: &Path, cfg: &GenerationConfig) -> Result<RenderReport> {
    let report = generate_to_file(cfg, out)
        .with_context(|| format!("generating {} into {}", cfg.preset, out.display()))?;
    println!(
        "Raw audio: {}  | {} frames in {} blocks  | clipped: {}",
        out.display(),
        report.frames,
        report.blocks,
        report.clipped_samples
    );
    Ok(report)
}

fn master(input: &Path, out: &Path, sr: u32, spec: &FilterSpec) -> Result<MasterReport> {
    let report = master_file(input, out, sr, spec)
        .with_context(|| format!("mastering {} into {}", input.display(), out.display()))?;
    println!(
        "Final audio: {}  | gain {:+.2} dB  | RMS {:.2} dBFS  | peak {:.4} ({:.2} dBFS){}",
        out.display(),
        report.gain_db,
        report.rms_dbfs,
        report.peak_linear,
        report.peak_dbfs,
        if report.peak_clamped { "  | peak ceiling engaged" } else { "" }
    );
    Ok(report)
}

fn print_metrics(path: &Path, m: &Metrics) {
    println!("File: {}", path.display());
    println!("  sample rate : {} Hz", m.sample_rate);
    println!("  frames      : {} ({:.1} s)", m.frames, m.duration_seconds);
    println!("  peak        : {:.4} ({:.2} dBFS)", m.peak_linear, m.peak_dbfs);
    println!("  rms         : {:.2} dBFS", m.rms_dbfs);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Generate { out, gen } => {
            generate(&out, &gen.config())?;
        }
        Command::Master { input, out, sr, master: m } => {
            master(&input, &out, sr, &FilterSpec::from(&m))?;
        }
        Command::Render { dir, name, gen, master: m } => {
            let cfg = gen.config();
            let spec = FilterSpec::from(&m);
            // fail on a bad filter spec before spending hours on synthesis
            spec.validate(cfg.sample_rate)
                .context("invalid mastering parameters")?;

            let raw = dir.join(format!("{name}_raw.wav"));
            let fin = dir.join(format!("{name}_final.wav"));
            info!(preset = %cfg.preset, dir = %dir.display(), name = %name, "render started");

            generate(&raw, &cfg)?;
            master(&raw, &fin, cfg.sample_rate, &spec)?;
            let metrics = measure_file(&fin)
                .with_context(|| format!("measuring {}", fin.display()))?;
            print_metrics(&fin, &metrics);
        }
        Command::Measure { path } => {
            let metrics = measure_file(&path)
                .with_context(|| format!("measuring {}", path.display()))?;
            print_metrics(&path, &metrics);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_documented_values() {
        let cli = Cli::try_parse_from(["somnoise", "render", "--dir", "out", "--name", "night"]).unwrap();
        let Command::Render { gen, master, .. } = cli.command else {
            panic!("expected render");
        };
        let cfg = gen.config();
        assert_eq!(cfg.preset, Preset::BrownNoise);
        assert_eq!(cfg.sample_rate, 44_100);
        assert_eq!(cfg.duration_seconds, 8.0 * 3600.0);
        assert_eq!(cfg.seed, None);
        assert_eq!(FilterSpec::from(&master), FilterSpec::default());
    }

    #[test]
    fn preset_aliases_and_negative_targets_parse() {
        let cli = Cli::try_parse_from([
            "somnoise", "render", "--dir", "d", "--name", "n",
            "--preset", "Ocean-Waves", "--seed", "7", "--target-rms-db", "-23",
        ])
        .unwrap();
        let Command::Render { gen, master, .. } = cli.command else {
            panic!("expected render");
        };
        assert_eq!(gen.preset, Preset::OceanWaves);
        assert_eq!(gen.config().seed, Some(7));
        assert_eq!(master.target_rms_db, -23.0);
    }

    #[test]
    fn unknown_preset_is_rejected_by_the_parser() {
        let err = Cli::try_parse_from(["somnoise", "generate", "--out", "x.wav", "--preset", "thunder"]);
        assert!(err.is_err());
    }

    #[test]
    fn master_takes_in_flag() {
        let cli = Cli::try_parse_from(["somnoise", "master", "--in", "a.wav", "--out", "b.wav", "--sr", "48000"]).unwrap();
        match cli.command {
            Command::Master { input, sr, .. } => {
                assert_eq!(input, PathBuf::from("a.wav"));
                assert_eq!(sr, 48_000);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

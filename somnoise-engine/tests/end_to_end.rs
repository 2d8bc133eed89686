//! Generate → master → measure, in memory and through files.

use somnoise_core::dsp::{mean, peak, rms_db};
use somnoise_engine::{
    generate_to_file, master_buffer, master_file, measure_file, BlockDriver, Error, FilterSpec,
    GenerationConfig, Preset,
};

fn flat_spec(target: f64) -> FilterSpec {
    FilterSpec {
        highpass_hz: Some(0.0),
        lowpass_hz: Some(0.0),
        fade_seconds: 0,
        target_rms_dbfs: target,
        peak_ceiling_linear: 0.98,
    }
}

#[test]
fn brown_noise_ten_seconds_then_master() {
    let cfg = GenerationConfig::new(Preset::BrownNoise, 10.0, 8000).with_seed(42);
    let mut raw = Vec::new();
    BlockDriver::new(&cfg).unwrap().run(&mut raw).unwrap();

    assert_eq!(raw.len(), 80_000);
    assert!(raw.iter().all(|s| (-1.0..=1.0).contains(s)));
    assert!(mean(&raw).abs() < 0.01, "mean={}", mean(&raw));

    let report = master_buffer(&mut raw, 8000, &flat_spec(-20.0)).unwrap();
    let level = rms_db(&raw);
    assert!((-20.1..=-19.9).contains(&level), "rms={level}");
    assert!(f64::from(peak(&raw)) <= 0.98 + 1e-6);
    assert!(!report.faded);
    assert!((report.rms_dbfs - level).abs() < 1e-12);
}

#[test]
fn every_preset_survives_the_file_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    for preset in Preset::ALL {
        let raw = dir.path().join(format!("out/{preset}_raw.wav"));
        let fin = dir.path().join(format!("out/{preset}_final.wav"));
        let cfg = GenerationConfig::new(preset, 3.0, 8000).with_seed(9);

        let rendered = generate_to_file(&cfg, &raw).unwrap();
        assert_eq!(rendered.frames, 24_000);

        let spec = FilterSpec { fade_seconds: 1, ..FilterSpec::default() };
        let mastered = master_file(&raw, &fin, 8000, &spec).unwrap();
        assert_eq!(mastered.frames, 24_000);
        assert!(mastered.faded);

        let m = measure_file(&fin).unwrap();
        assert_eq!(m.frames, 24_000);
        assert_eq!(m.sample_rate, 8000);
        assert!((m.duration_seconds - 3.0).abs() < 1e-12);
        assert!(m.peak_linear <= 0.98 + 1e-3, "{preset}: peak={}", m.peak_linear);
        // 16-bit quantization moves the level only marginally
        assert!((m.rms_dbfs - mastered.rms_dbfs).abs() < 0.05, "{preset}");
    }
}

#[test]
fn mastering_refuses_a_sample_rate_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.wav");
    let fin = dir.path().join("final.wav");
    let cfg = GenerationConfig::new(Preset::OceanWaves, 1.0, 22_050).with_seed(1);
    generate_to_file(&cfg, &raw).unwrap();

    let err = master_file(&raw, &fin, 44_100, &FilterSpec::default()).unwrap_err();
    assert!(matches!(err, Error::SampleRateMismatch { file: 22_050, expected: 44_100 }));
    assert!(!fin.exists());
}

#[test]
fn unknown_preset_fails_before_any_io() {
    let err = "thunderstorm".parse::<Preset>().unwrap_err();
    assert!(err.to_string().contains("thunderstorm"));
}

#[test]
fn missing_input_surfaces_the_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = master_file(
        &dir.path().join("nope.wav"),
        &dir.path().join("out.wav"),
        44_100,
        &FilterSpec::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Wav(_) | Error::Io(_)));
}

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use num_complex::Complex32;
use rf_dsp::{ChannelBuildParams, ChannelMode, ChannelPolicy, DspChannel};

const RF_SAMPLE_RATE: f64 = 48_000.0;
const AUDIO_SAMPLE_RATE: f64 = 8_000.0;
const BLOCK_LENS: [usize; 3] = [480, 4_096, 16_384];

fn build_channel(mode: ChannelMode) -> DspChannel {
    let params = ChannelBuildParams {
        id: "bench".into(),
        label: "bench".into(),
        freq_hz: 100_000_000.0,
        hardware_freq_hz: 100_000_000.0,
        mode,
        rf_sample_rate: RF_SAMPLE_RATE,
        audio_sample_rate: AUDIO_SAMPLE_RATE,
    };
    let policy = ChannelPolicy {
        audio_gain_db: 0.0,
        squelch_threshold_dbfs: -30.0,
        dwell_s: 1.0,
        muted: false,
        solo: None,
        hold: false,
        force_active: false,
    };
    DspChannel::new(params, policy).expect("bench channel parameters are valid")
}

fn bench_mode(c: &mut Criterion, mode: ChannelMode, name: &str) {
    let mut group = c.benchmark_group(format!("dsp_channel_{name}"));

    for &block_len in &BLOCK_LENS {
        group.throughput(Throughput::Elements(block_len as u64));
        let iq: Vec<Complex32> = (0..block_len)
            .map(|i| Complex32::new((i as f32 * 0.01).sin() * 0.2, (i as f32 * 0.013).cos() * 0.2))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(block_len), &block_len, |b, _| {
            let mut channel = build_channel(mode);
            b.iter(|| {
                for &sample in &iq {
                    black_box(channel.process_rf_sample(black_box(sample), 1.0 / RF_SAMPLE_RATE));
                }
            });
        });
    }

    group.finish();
}

fn bench_fm(c: &mut Criterion) {
    bench_mode(c, ChannelMode::Fm, "fm");
}

fn bench_am(c: &mut Criterion) {
    bench_mode(c, ChannelMode::Am, "am");
}

fn bench_eas(c: &mut Criterion) {
    bench_mode(c, ChannelMode::NoaaEas, "eas");
}

criterion_group!(benches, bench_fm, bench_am, bench_eas);
criterion_main!(benches);

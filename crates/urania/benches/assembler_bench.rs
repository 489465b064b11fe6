use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::{Path, PathBuf};
use urania::ephemeris::bodies::CALC_FLAGS;
use urania::ephemeris::{BodyCalc, EngineError, HouseCalc, NodeApsCalc};
use urania::{
    CalendarMoment, ChartAssembler, EphemerisAdapter, EphemerisConfig, EphemerisEngine,
    GeoLocation, HouseSystem, Limits, NodeMethod,
};

/// Constant-time engine so the bench measures assembly only.
struct FlatEngine;

impl EphemerisEngine for FlatEngine {
    fn calc_ut(&self, _jd_ut: f64, body: i32, _flags: i32) -> Result<BodyCalc, EngineError> {
        Ok(BodyCalc {
            status: CALC_FLAGS,
            values: [f64::from(body % 360), 0.1, 1.5, 0.9, 0.0, 0.0],
            message: String::new(),
        })
    }

    fn houses(
        &self,
        _jd_ut: f64,
        _flags: i32,
        _lat: f64,
        _lon: f64,
        _system: HouseSystem,
    ) -> Result<HouseCalc, EngineError> {
        let mut cusps = [0.0; 12];
        for (i, cusp) in cusps.iter_mut().enumerate() {
            *cusp = i as f64 * 30.0 + 12.0;
        }
        Ok(HouseCalc {
            cusps,
            ascendant: 12.0,
            midheaven: 282.0,
        })
    }

    fn nod_aps(
        &self,
        _jd_et: f64,
        body: i32,
        _flags: i32,
        _method: NodeMethod,
    ) -> Result<NodeApsCalc, EngineError> {
        let v = [f64::from(body) * 20.0, 0.0, 1.0, 0.0, 0.0, 0.0];
        Ok(NodeApsCalc {
            ascending: v,
            descending: v,
            perihelion: v,
            aphelion: v,
        })
    }

    fn delta_t(&self, _jd_ut: f64, _flags: i32) -> f64 {
        0.0008
    }

    fn body_name(&self, _body: i32) -> String {
        "?".to_string()
    }

    fn set_data_path(&self, _path: &Path) {}

    fn data_path(&self) -> Option<PathBuf> {
        None
    }
}

fn assembler() -> ChartAssembler<FlatEngine> {
    ChartAssembler::new(
        EphemerisAdapter::new(FlatEngine, EphemerisConfig::default()),
        Limits::default(),
    )
}

fn bench_chart(c: &mut Criterion) {
    let asm = assembler();
    let moment = CalendarMoment::new(2023, 12, 25, 12, 0, 0).unwrap();
    let location = GeoLocation { lat: 51.5, lon: -0.091_666 };
    c.bench_function("chart_document", |b| {
        b.iter(|| asm.chart(black_box(&moment), &location, HouseSystem::PLACIDUS))
    });
}

fn bench_asteroid_batch(c: &mut Criterion) {
    let asm = assembler();
    let moment = CalendarMoment::new(2023, 12, 25, 12, 0, 0).unwrap();
    c.bench_function("asteroid_range_1000", |b| {
        b.iter(|| asm.asteroid_range(black_box(&moment), 1, 1000, Some(500_000)))
    });
    c.bench_function("asteroid_range_truncated", |b| {
        b.iter(|| asm.asteroid_range(black_box(&moment), 1, 1000, None))
    });
}

criterion_group!(benches, bench_chart, bench_asteroid_batch);
criterion_main!(benches);

//! Criterion benchmarks for rhadron-decay hot paths.
//!
//! Covers: gluino and squark flavor splitting, harvesting, and store appends.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use rhadron_core::event::{GeneratorEvent, GeneratorParticle};
use rhadron_core::traits::ParticleCatalog;
use rhadron_core::types::{
    CycleId, DecayVertexRecord, FourVector, ParticleDefinition, ThreeVector, TrackedParticle,
};
use rhadron_decay::bridge::{fill_particle, harvest_products};
use rhadron_decay::flavor::{split_gluino, split_squark, HeavyPartonIds};
use rhadron_decay::store::DecayRecordStore;

struct Pions([ParticleDefinition; 2]);

impl ParticleCatalog for Pions {
    fn find(&self, pdg_id: i32) -> Option<&ParticleDefinition> {
        self.0.iter().find(|d| d.pdg_id == pdg_id)
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

fn bench_split_gluino(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    // gluino-baryon: exercises the quark pick and diquark spin draw.
    c.bench_function("split_gluino_baryon", |b| {
        b.iter(|| split_gluino(black_box(1_093_214), &mut rng))
    });
}

fn bench_split_squark(c: &mut Criterion) {
    let ids = HeavyPartonIds::default();
    c.bench_function("split_squark_baryon", |b| {
        b.iter(|| split_squark(black_box(-1_006_211), &ids))
    });
}

fn bench_fill_and_harvest(c: &mut Criterion) {
    let catalog = Pions([
        ParticleDefinition::stable(211, "pi+", 139.57, 1.0),
        ParticleDefinition::stable(-211, "pi-", 139.57, -1.0),
    ]);
    let track = TrackedParticle::moving(1, 1_009_213, 1_800_000.0, ThreeVector::new(0.0, 0.0, 5e5));
    let mut event = GeneratorEvent::new();

    c.bench_function("fill_and_harvest_20", |b| {
        b.iter(|| {
            fill_particle(black_box(&track), &mut event);
            for i in 0..20 {
                let id = if i % 2 == 0 { 211 } else { -211 };
                event.append(GeneratorParticle::new(id, 91, FourVector::new(0.1, 0.0, 1.0, 1.02), 0.13957));
            }
            harvest_products(&event, &catalog)
        })
    });
}

fn bench_store_append(c: &mut Criterion) {
    let record = DecayVertexRecord {
        cycle: CycleId(0),
        parent_track_id: 1,
        parent_pdg_id: 1_000_993,
        position: ThreeVector::ZERO,
        time: 0.0,
        parent_momentum: FourVector::new(0.0, 0.0, 0.0, 1_800_000.0),
        products: vec![],
    };

    c.bench_function("store_append", |b| {
        b.iter_batched(
            DecayRecordStore::new,
            |store| {
                for _ in 0..64 {
                    let _ = store.append(black_box(record.clone()));
                }
                store
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_split_gluino,
    bench_split_squark,
    bench_fill_and_harvest,
    bench_store_append
);
criterion_main!(benches);

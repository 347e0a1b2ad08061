//! Live tracking demo against a synthetic remote world
//!
//! Drives the full pipeline — enumeration, cache tiers, projection,
//! shape dispatch — over an in-memory gateway holding a small world of
//! wandering entities. Useful for eyeballing cache behavior and stats
//! without any real remote source.

use std::time::{Duration, Instant};

use clap::Parser;
use glam::{Mat4, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sightline::core::config::TrackerConfig;
use sightline::core::layout::WorldLayout;
use sightline::gateway::memory::InMemoryGateway;
use sightline::pipeline::Tracker;
use sightline::project::Viewport;
use sightline::render::RenderMode;

#[derive(Parser, Debug)]
#[command(name = "live_track", about = "Run the tracking pipeline on a synthetic world")]
struct Args {
    /// Number of synthetic entities
    #[arg(long, default_value_t = 24)]
    entities: usize,

    /// Ticks to simulate (at 60 Hz of simulated time)
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Presentation mode: head or skeleton
    #[arg(long, default_value = "head")]
    mode: String,

    /// Optional layout table (TOML); defaults to the synthetic layout
    #[arg(long)]
    layout: Option<std::path::PathBuf>,

    /// Show network-id labels under markers
    #[arg(long, default_value_t = false)]
    show_net_id: bool,

    /// RNG seed for the synthetic world
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

/// Local joint offsets shared by every synthetic entity, head on top.
const JOINT_OFFSETS: [(usize, Vec3); 7] = [
    (0, Vec3::new(0.0, 0.0, 0.75)),
    (3, Vec3::new(0.4, 0.0, 0.1)),
    (4, Vec3::new(-0.4, 0.0, 0.1)),
    (5, Vec3::new(-0.2, 0.0, 0.5)),
    (6, Vec3::new(0.0, 0.0, 0.2)),
    (7, Vec3::new(0.0, 0.0, 0.6)),
    (8, Vec3::new(0.2, 0.0, 0.5)),
];

/// A camera at the origin looking down +x: clip depth is the entity's
/// x coordinate, world y/z map to the screen axes.
fn camera_matrix() -> Mat4 {
    Mat4::from_cols(
        Vec4::ZERO,
        Vec4::new(0.0, 1.0, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(1.0, 0.0, 0.0, 0.0),
    )
}

struct SyntheticWorld {
    bases: Vec<u64>,
    positions: Vec<Vec3>,
    rng: StdRng,
}

impl SyntheticWorld {
    fn seed(gateway: &mut InMemoryGateway, layout: &WorldLayout, count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let interface = 0x3000u64;
        let list = 0x4000u64;
        gateway.write_u64(layout.roster_root, interface);
        gateway.write_u64(interface + layout.roster_list_offset, list);
        gateway.write_mat4(layout.view_matrix_addr(), camera_matrix());
        gateway.write_vec3(layout.local_entity + layout.position_offset, Vec3::ZERO);

        let mut bases = Vec::with_capacity(count);
        let mut positions = Vec::with_capacity(count);
        for i in 0..count {
            let base = 0x20_0000u64 + i as u64 * 0x1_0000;
            let position = Vec3::new(
                rng.gen_range(20.0..80.0),
                rng.gen_range(-30.0..30.0),
                rng.gen_range(-2.0..2.0),
            );
            gateway.write_u64(list + i as u64 * 8, base);
            gateway.write_u64(base + layout.identity_link_offset, 0x8_0000 + i as u64 * 0x100);
            gateway.write_i32(
                0x8_0000 + i as u64 * 0x100 + layout.net_id_offset,
                i as i32 + 1,
            );
            gateway.write_f32(base + layout.health_offset, rng.gen_range(5.0..100.0));
            bases.push(base);
            positions.push(position);
        }
        // Pad the remaining roster slots with nulls.
        for i in count..TrackerConfig::default().max_entities {
            gateway.write_u64(list + i as u64 * 8, 0);
        }

        let mut world = Self {
            bases,
            positions,
            rng,
        };
        world.step(gateway, layout);
        world
    }

    /// Random-walk every entity and rewrite its remote state.
    fn step(&mut self, gateway: &mut InMemoryGateway, layout: &WorldLayout) {
        for (base, position) in self.bases.iter().zip(&mut self.positions) {
            *position += Vec3::new(
                self.rng.gen_range(-0.3..0.3),
                self.rng.gen_range(-0.3..0.3),
                0.0,
            );
            gateway.write_vec3(base + layout.position_offset, *position);
            gateway.write_mat4(
                base + layout.matrix_offset,
                Mat4::from_translation(*position),
            );
            for (joint, offset) in JOINT_OFFSETS {
                gateway.write_vec3(layout.joint_addr(*base, joint), offset);
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let layout = match &args.layout {
        Some(path) => match WorldLayout::load(path) {
            Ok(layout) => layout,
            Err(err) => {
                tracing::error!("failed to load layout table: {err}");
                std::process::exit(1);
            }
        },
        None => WorldLayout::default(),
    };

    let mode = match args.mode.as_str() {
        "skeleton" => RenderMode::Skeleton,
        _ => RenderMode::HeadMarker,
    };

    tracing::info!(
        entities = args.entities,
        ticks = args.ticks,
        ?mode,
        "starting live tracking demo"
    );

    let start = Instant::now();
    let mut gateway = InMemoryGateway::new();
    let mut world = SyntheticWorld::seed(&mut gateway, &layout, args.entities, args.seed);

    let mut tracker = Tracker::new(
        gateway,
        layout.clone(),
        TrackerConfig::default(),
        Viewport::default(),
        start,
    );
    tracker.set_mode(mode);
    tracker.style_mut().show_net_id = args.show_net_id;

    let tick_step = Duration::from_millis(16);
    let mut total_shapes = 0usize;
    for tick in 0..args.ticks {
        let now = start + tick_step * tick;
        world.step(tracker.gateway_mut(), &layout);
        let shapes = tracker.tick(now);
        total_shapes += shapes.len();

        if tick % 300 == 0 {
            tracing::info!(
                tick,
                tracked = tracker.valid_ids().len(),
                shapes = shapes.len(),
                hit_ratio_pct = tracker.stats().hit_ratio() * 100.0,
                "tick summary"
            );
        }
    }

    let stats = tracker.stats();
    tracing::info!(
        total_shapes,
        round_trips = stats.batch_round_trips,
        remote_reads = stats.remote_reads,
        hits = stats.cache_hits,
        misses = stats.cache_misses,
        "demo finished"
    );
}

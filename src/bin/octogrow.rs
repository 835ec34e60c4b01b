use anyhow::{bail, Result};
use argh::FromArgs;
use log::*;
use nalgebra::Point3;
use octogrow::*;
use simple_stopwatch::Stopwatch;
use std::time::Duration;

#[derive(FromArgs)]
/// toplevel
struct TopLevel {
    #[argh(subcommand)]
    nested: SubCommandEnum,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum SubCommandEnum {
    Grow(SubCommandGrow),
    GrowBg(SubCommandGrowBg),
}

#[derive(FromArgs, PartialEq, Debug)]
/// synchronous growth: run N ticks in-process and report stats
#[argh(subcommand, name = "grow")]
struct SubCommandGrow {
    /// number of ticks
    #[argh(option)]
    ticks: u64,

    /// per-tick spawn probability
    #[argh(option, default = "0.05")]
    intensity: f32,

    /// rng seed
    #[argh(option, default = "1")]
    seed: u64,

    /// use the dense array backend instead of the hash backend
    #[argh(switch)]
    dense: bool,

    /// boundary shape: rect, cylinder, polygon
    #[argh(option, default = "String::from(\"rect\")")]
    shape: String,

    /// boundary width (rect)
    #[argh(option, default = "700.0")]
    width: f32,

    /// boundary depth (rect)
    #[argh(option, default = "700.0")]
    depth: f32,

    /// boundary height
    #[argh(option, default = "50.0")]
    height: f32,

    /// boundary radius (cylinder / polygon)
    #[argh(option, default = "350.0")]
    radius: f32,

    /// polygon sides
    #[argh(option, default = "6")]
    sides: usize,

    /// disable the boundary entirely
    #[argh(switch)]
    unbounded: bool,
}

#[derive(FromArgs, PartialEq, Debug)]
/// threaded growth: background worker + periodic drain, for a wall-clock duration
#[argh(subcommand, name = "grow-bg")]
struct SubCommandGrowBg {
    /// run duration in seconds
    #[argh(option, default = "5.0")]
    seconds: f32,

    /// drain cadence in milliseconds
    #[argh(option, default = "100")]
    drain_ms: u64,

    /// per-second spawn chance
    #[argh(option, default = "0.8")]
    spawn_chance: f32,

    /// rng seed
    #[argh(option, default = "1")]
    seed: u64,

    /// use the dense array backend instead of the hash backend
    #[argh(switch)]
    dense: bool,

    /// boundary shape: rect, cylinder, polygon
    #[argh(option, default = "String::from(\"rect\")")]
    shape: String,

    /// boundary width (rect)
    #[argh(option, default = "700.0")]
    width: f32,

    /// boundary depth (rect)
    #[argh(option, default = "700.0")]
    depth: f32,

    /// boundary height
    #[argh(option, default = "50.0")]
    height: f32,

    /// boundary radius (cylinder / polygon)
    #[argh(option, default = "350.0")]
    radius: f32,

    /// polygon sides
    #[argh(option, default = "6")]
    sides: usize,
}

fn build_boundary(
    shape: &str,
    width: f32,
    depth: f32,
    height: f32,
    radius: f32,
    sides: usize,
) -> Result<Boundary> {
    let shape = match shape {
        "rect" => BoundaryShape::Rectangle {
            width,
            depth,
            height,
        },
        "cylinder" => BoundaryShape::Cylinder { radius, height },
        "polygon" => BoundaryShape::PolygonPrism {
            sides,
            radius,
            height,
        },
        other => bail!("unknown boundary shape: {}", other),
    };
    Ok(Boundary::new(shape, Point3::origin()))
}

fn report(prefix: &str, stats: &SimStats) {
    info!(
        "{}: cells={} visible={} hidden={}, faces sq/hex={}/{}, load={:.3}",
        prefix,
        stats.total,
        stats.visible,
        stats.hidden,
        stats.placements.square_faces,
        stats.placements.hexagon_faces,
        stats.load.load_factor(),
    );
}

fn run_grow<L: Lattice + 'static>(opt: &SubCommandGrow) -> Result<()> {
    let mut boundary = build_boundary(
        &opt.shape, opt.width, opt.depth, opt.height, opt.radius, opt.sides,
    )?;
    if opt.unbounded {
        boundary.set_enabled(false);
    }

    let mut colony = Colony::<L>::default();
    colony.seed(&boundary.center());

    let sw = Stopwatch::start_new();
    for tick in 0..opt.ticks {
        let added = colony.step_sync(&boundary, opt.intensity, opt.seed);
        if added > 0 {
            debug!("tick {}: +{} cells, total {}", tick, added, colony.len());
        }
    }

    let elapsed = sw.ms();
    info!(
        "growth: took={:.2}ms, ticks={}, cells={}, cps={}",
        elapsed,
        opt.ticks,
        colony.len(),
        (colony.len() * 1000) as f32 / elapsed.max(1.0),
    );
    let stats = colony.stats();
    info!(
        "faces sq/hex={}/{}, rejected={}, dup={}, visible={}/{}",
        stats.square_faces,
        stats.hexagon_faces,
        stats.rejected_out_of_boundary,
        stats.dropped_duplicates,
        colony.visible_count(),
        colony.len(),
    );
    Ok(())
}

fn run_grow_bg<L: Lattice + 'static>(opt: &SubCommandGrowBg) -> Result<()> {
    let boundary = build_boundary(
        &opt.shape, opt.width, opt.depth, opt.height, opt.radius, opt.sides,
    )?;
    let config = GrowthConfig {
        spawn_chance: opt.spawn_chance,
        seed: opt.seed,
        ..GrowthConfig::default()
    };

    let mut manager = ColonyManager::<L>::new(boundary, config);
    manager.start_growth();

    let sw = Stopwatch::start_new();
    let mut drained = 0usize;
    while sw.ms() < opt.seconds * 1000.0 {
        std::thread::sleep(Duration::from_millis(opt.drain_ms));
        drained += manager.drain_and_apply();
        report("drain", &manager.stats());
    }

    manager.stop_growth();
    report("final", &manager.stats());
    info!("applied {} cells over {:.1}s", drained, sw.ms() / 1000.0);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let opt: TopLevel = argh::from_env();

    match opt.nested {
        SubCommandEnum::Grow(opt) => {
            if opt.dense {
                run_grow::<DenseLattice>(&opt)
            } else {
                run_grow::<HashLattice>(&opt)
            }
        }
        SubCommandEnum::GrowBg(opt) => {
            if opt.dense {
                run_grow_bg::<DenseLattice>(&opt)
            } else {
                run_grow_bg::<HashLattice>(&opt)
            }
        }
    }
}

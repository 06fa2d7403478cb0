use clap::Parser;
use std::sync::Arc;

use pathfinder_engine::geometry::BlockPos;
use pathfinder_engine::generator::FlatWorldGenerator;
use pathfinder_engine::{Context, PathfinderConfig};
use utils::cli::CommandLineConfig;

/// Finds a path between two points in a demo flat world and prints it.
#[derive(Parser, Debug)]
#[command(name = "nether-pathfinder", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommandLineConfig,

    #[command(flatten)]
    pub pathfinder: PathfinderConfig,

    /// World seed passed to the chunk generator.
    #[arg(long, default_value_t = 0)]
    pub seed: i64,

    #[arg(long, allow_hyphen_values = true, num_args = 3, value_names = ["X", "Y", "Z"])]
    pub start: Vec<i32>,

    #[arg(long, allow_hyphen_values = true, num_args = 3, value_names = ["X", "Y", "Z"])]
    pub goal: Vec<i32>,

    /// Promote the start node to an X4 cube instead of X2.
    #[arg(long, default_value_t = false)]
    pub coarse_min: bool,
}

pub fn run(cli: Cli) {
    tracer::init_tracing("nether-pathfinder", Some(&cli.common.log_level));

    let start = BlockPos::new(cli.start[0], cli.start[1], cli.start[2]);
    let goal = BlockPos::new(cli.goal[0], cli.goal[1], cli.goal[2]);

    let ctx = Context::new(cli.seed, Arc::new(FlatWorldGenerator), cli.pathfinder);

    match ctx.find_path(start, goal, cli.coarse_min, None) {
        Ok(Some(path)) => {
            let (finished, blocks) = path.pack_blocks();
            println!("finished: {finished}");
            println!("blocks: {}", blocks.len());
            for block in &path.blocks {
                println!("  ({}, {}, {})", block.x, block.y, block.z);
            }
        }
        Ok(None) => println!("no path found"),
        Err(err) => eprintln!("pathfinding failed: {err}"),
    }
}

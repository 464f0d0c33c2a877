use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pushbox::{Coordinate, Level, Levels};

#[derive(Parser)]
#[command(name = "pushbox")]
#[command(about = "Inspect and exercise box-pushing puzzle levels", long_about = None)]
struct Args {
    /// Path to the levels file
    #[arg(value_name = "FILE")]
    levels_file: String,

    /// Level number to select (1-indexed), or start of range
    #[arg(value_name = "LEVEL")]
    level_start: Option<usize>,

    /// Optional end of level range (inclusive, 1-indexed)
    #[arg(value_name = "LEVEL_END")]
    level_end: Option<usize>,

    /// Print each selected level's grid
    #[arg(short, long)]
    print_grid: bool,

    /// Box move to apply, as FROM_X,FROM_Y:TO_X,TO_Y (repeatable; requires
    /// a single selected level)
    #[arg(short, long = "move", value_name = "MOVE")]
    moves: Vec<String>,
}

fn parse_coordinate(part: &str) -> Result<Coordinate> {
    let (x, y) = part
        .split_once(',')
        .with_context(|| format!("coordinate must be X,Y: {:?}", part))?;
    Ok(Coordinate::new(
        x.trim().parse().with_context(|| format!("bad x in {:?}", part))?,
        y.trim().parse().with_context(|| format!("bad y in {:?}", part))?,
    ))
}

fn parse_move(arg: &str) -> Result<(Coordinate, Coordinate)> {
    let (from, to) = arg
        .split_once(':')
        .with_context(|| format!("move must be FROM_X,FROM_Y:TO_X,TO_Y: {:?}", arg))?;
    Ok((parse_coordinate(from)?, parse_coordinate(to)?))
}

fn print_summary(level_num: usize, level: &Level) {
    let (width, height) = level.size();
    let solved_char = if level.is_solved() { 'Y' } else { 'N' };
    println!(
        "level: {:<3}  size: {:>3}x{:<3}  boxes: {:<3}  remaining: {:<3}  solved: {}",
        level_num,
        width,
        height,
        level.box_count(),
        level.remaining_targets(),
        solved_char
    );
}

fn apply_moves(level: &mut Level, args: &[String]) -> Result<()> {
    for arg in args {
        let (from, to) = parse_move(arg)?;
        let tile = level.value(from)?;
        if !tile.has_box() {
            bail!("no box at {} (tile is {:?})", from, tile);
        }
        level
            .move_box(from, to)
            .with_context(|| format!("cannot apply move {:?}", arg))?;
        println!(
            "Move {} -> {} ({} moves, {} remaining targets):\n{}",
            from,
            to,
            level.moves(),
            level.remaining_targets(),
            level
        );
    }
    if level.is_solved() {
        println!("Solved in {} moves", level.moves());
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut levels = Levels::from_file(&args.levels_file)
        .with_context(|| format!("failed to load levels from {}", args.levels_file))?;

    if levels.is_empty() {
        bail!("no levels found in {}", args.levels_file);
    }

    // Determine the range of levels to select
    let level_start = args.level_start.unwrap_or(1);
    let level_end = args.level_end.or(args.level_start).unwrap_or(levels.len());

    if level_start == 0 {
        bail!("level numbers must be at least 1");
    }
    if level_end < level_start {
        bail!("level end must be >= level start");
    }
    if level_end > levels.len() {
        bail!(
            "level {} not found (file contains {} levels)",
            level_end,
            levels.len()
        );
    }
    if !args.moves.is_empty() && level_start != level_end {
        bail!("moves can only be applied when a single level is selected");
    }

    for level_num in level_start..=level_end {
        let level = levels.get(level_num - 1).unwrap();
        print_summary(level_num, level);
        if args.print_grid {
            println!("{}", level);
        }
    }

    if !args.moves.is_empty() {
        let level = levels.get_mut(level_start - 1).unwrap();
        apply_moves(level, &args.moves)?;
    }

    Ok(())
}

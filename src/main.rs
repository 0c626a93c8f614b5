//! Headless level runner
//!
//! Loads a level file, drives the simulation with a scripted input for a
//! fixed number of frames, and prints the resulting session report. Useful
//! for smoke-testing level files without a renderer attached.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use hare_higher::consts::FRAME_DT;
use hare_higher::sim::{LevelSession, SessionPhase, TickInput, TileMap, tick};
use hare_higher::{Progress, Tuning};

struct Args {
    level: PathBuf,
    frames: u32,
    seed: u64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let level = args
        .next()
        .ok_or_else(|| "usage: hare-higher <level.json> [frames] [seed]".to_string())?;
    let frames = match args.next() {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| format!("invalid frame count: {raw}"))?,
        None => 600,
    };
    let seed = match args.next() {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| format!("invalid seed: {raw}"))?,
        None => 0,
    };
    Ok(Args {
        level: PathBuf::from(level),
        frames,
        seed,
    })
}

/// Scripted input: walk right the whole run, hop for half a second
/// out of every two.
fn scripted_input(frame: u32) -> TickInput {
    let phase = frame % 120;
    TickInput {
        move_left: false,
        move_right: true,
        jump_held: phase < 30,
        jump_released: phase == 30,
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let map = TileMap::load(&args.level)?;
    log::info!(
        "Loaded {} ({} tiles)",
        args.level.display(),
        map.grid_len()
    );

    let mut session = LevelSession::new(map, Tuning::default(), args.seed)?;

    for frame in 0..args.frames {
        tick(&mut session, &scripted_input(frame));
        match session.phase() {
            SessionPhase::Complete => {
                log::info!("Level complete at frame {frame}");
                break;
            }
            SessionPhase::Failed => {
                log::info!("Hit at frame {frame}, resetting");
                session.reset()?;
            }
            SessionPhase::Playing => {}
        }
    }

    let report = session.report();
    println!(
        "carrots: {}  radishes: {}  elapsed: {:.2}s  completed: {}",
        report.carrots, report.radishes, report.elapsed_seconds, report.completed
    );

    let progress_path = Path::new("progress.json");
    let mut progress = Progress::load(progress_path);
    let level_name = args
        .level
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.level.display().to_string());
    if progress.record(&level_name, &report) {
        progress.save(progress_path)?;
    }

    log::info!(
        "Simulated {} frames ({:.2}s of game time)",
        args.frames,
        args.frames as f32 * FRAME_DT
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

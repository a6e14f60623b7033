#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Algorun programs in the terminal.

mod program;

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    thread,
    time::Duration,
};

use algorun_core::{Action, Event, Placement, Termination};
use algorun_level_catalog::LevelCatalog;
use algorun_presentation::{dispatch, TextPresentation};
use algorun_system_progression::Progression;
use algorun_world::{query, Config, World};
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, warn};

use crate::program::ProgramLine;

#[derive(Debug, Parser)]
#[command(
    name = "algorun",
    author,
    version,
    about = "Plays Algorun puzzle programs in the terminal",
    long_about = None
)]
struct CliArgs {
    /// Level catalog to play instead of the built-in campaign.
    #[arg(long, value_name = "PATH")]
    levels: Option<PathBuf>,

    /// Zero-based index of the first level to play.
    #[arg(long, value_name = "INDEX", default_value_t = 0)]
    level: usize,

    /// Delay before each executed command, in milliseconds.
    #[arg(
        long,
        value_name = "MS",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pacing_ms: u64,

    /// Program to run, for example "F1: F R g:2 1; F2: L".
    #[arg(long, value_name = "NOTATION")]
    program: String,

    /// Keep playing the following levels with the same program after a win.
    #[arg(long)]
    all: bool,

    /// Print messages only, without grid frames.
    #[arg(long)]
    quiet: bool,

    /// Deliver pacing time immediately instead of sleeping.
    #[arg(long)]
    no_wait: bool,

    /// Abort a run once it has executed this many commands.
    #[arg(long, value_name = "STEPS")]
    max_steps: Option<u32>,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();

    let catalog = match args.levels.as_deref() {
        Some(path) => LevelCatalog::from_path(path)?,
        None => LevelCatalog::builtin().context("built-in level catalog is invalid")?,
    };
    if catalog.is_empty() {
        bail!("level catalog contains no levels");
    }
    let program = program::parse(&args.program)
        .with_context(|| format!("invalid program `{}`", args.program))?;
    let config = Config::new(Duration::from_millis(args.pacing_ms))?;

    let stdout = io::stdout();
    let mut presentation = TextPresentation::new(stdout.lock());
    let outcome = play(&args, catalog, &program, config, &mut presentation)?;
    let _ = presentation.finish()?;

    Ok(if outcome == Some(Termination::Won) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn play<W: Write>(
    args: &CliArgs,
    catalog: LevelCatalog,
    program: &[ProgramLine],
    config: Config,
    presentation: &mut TextPresentation<W>,
) -> Result<Option<Termination>> {
    let mut progression = Progression::new(catalog, World::with_config(config));
    let mut events = Vec::new();

    if !progression.load_level_by_index(args.level, &mut events) {
        bail!(
            "level index {} is out of range; the catalog has {} levels",
            args.level,
            progression.level_count()
        );
    }
    present(&mut events, presentation, args.quiet);

    loop {
        for line in program {
            progression.apply(
                Action::SubmitCommand {
                    kind: line.kind.clone(),
                    condition: line.condition.clone(),
                    placement: Placement::Subroutine(line.subroutine),
                },
                &mut events,
            );
        }
        progression.apply(Action::StartRun, &mut events);
        present(&mut events, presentation, args.quiet);

        let mut steps = 0_u32;
        while let Some(delay) = query::time_until_next_step(progression.world()) {
            if args.max_steps.is_some_and(|max| steps >= max) {
                warn!("step budget of {steps} exhausted; aborting the run");
                progression.apply(Action::AbortRun, &mut events);
                present(&mut events, presentation, args.quiet);
                continue;
            }
            if !args.no_wait {
                thread::sleep(delay);
            }
            // Each tick delivers exactly the remaining delay, so one command executes.
            progression.apply(Action::Tick { dt: delay }, &mut events);
            steps = steps.saturating_add(1);
            present(&mut events, presentation, args.quiet);
        }

        if !(args.all && progression.next_level_unlocked()) {
            break;
        }
        debug!("advancing past level {:?}", progression.current_index());
        let advanced = progression.load_next_level(&mut events);
        present(&mut events, presentation, args.quiet);
        if !advanced {
            break;
        }
    }

    Ok(query::last_termination(progression.world()))
}

fn present<W: Write>(
    events: &mut Vec<Event>,
    presentation: &mut TextPresentation<W>,
    quiet: bool,
) {
    if quiet {
        events.retain(|event| !matches!(event, Event::CursorMoved { .. }));
    }
    dispatch(events.as_slice(), presentation);
    events.clear();
}

use sc_api::{create_player, CreatePlayerOptions, ScenarioPlayer};
use sc_runtime::{FsSourceLoader, StepOutcome};
use tracing::{info, warn};

use crate::{read_limits, read_project_scripts, resolve_project_dir, CliError, RunArgs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) frames: u64,
    pub(crate) finished: bool,
}

pub(crate) fn build_player(args: &RunArgs) -> Result<ScenarioPlayer, CliError> {
    let root = resolve_project_dir(&args.project_dir)?;
    let scripts = read_project_scripts(&root)?;
    let limits = read_limits(args.limits.as_deref())?;

    let mut options = CreatePlayerOptions::new(scripts, FsSourceLoader::new(&root));
    options.entry_scenario = args.scenario.clone();
    options.limits = limits;
    Ok(create_player(options)?)
}

/// Ticks until the scenario finishes or `max_frames` ticks have run, handing
/// every output line to `emit` as it is produced.
pub(crate) fn run_frames(
    player: &mut ScenarioPlayer,
    max_frames: u64,
    emit: &mut dyn FnMut(String),
) -> Result<RunSummary, CliError> {
    emit_output(player, emit);

    let mut frames = 0;
    let mut finished = false;
    while frames < max_frames {
        let step = player.step();
        frames += 1;
        emit_output(player, emit);
        let outcome = step?;
        emit(format!("EVENT:{}", outcome.as_str()));
        if outcome == StepOutcome::Finished {
            finished = true;
            break;
        }
    }

    if finished {
        info!(frames, "scenario finished");
    } else {
        warn!(frames, "frame limit reached before the scenario finished");
    }
    Ok(RunSummary { frames, finished })
}

fn emit_output(player: &ScenarioPlayer, emit: &mut dyn FnMut(String)) {
    for text in player.take_output() {
        emit(format!(
            "OUTPUT_JSON:{}",
            serde_json::to_string(&text).unwrap_or_else(|_| "\"\"".to_string())
        ));
    }
}

pub(crate) fn run_project(args: RunArgs) -> Result<i32, CliError> {
    let mut player = build_player(&args)?;
    if let Some(title) = &player.setup().title {
        println!("TITLE:{}", title);
    }

    let summary = run_frames(&mut player, args.max_frames, &mut |line: String| {
        println!("{}", line)
    })?;
    println!("RESULT:OK");
    println!("FRAMES:{}", summary.frames);
    println!("FINISHED:{}", summary.finished);
    Ok(0)
}

use loading_screen_core::progress::DEFAULT_PLUGIN_COUNT;
use loading_screen_core::{classify, LoadEvent, ProgressStateMachine, ProgressUpdate};

/// Log lines in the order a BepInEx 5 game with a few plugins produces them
const BEPINEX5_STARTUP: &[&str] = &[
    "BepInEx 5.4.22.0 - Lethal Company",
    "Running under Unity v2022.3.9.8253327",
    "Preloader finished",
    "Loaded 2 patcher methods from [BepInEx.Preloader 5.4.22.0]",
    "Preloader started",
    "Patching [Assembly-CSharp] with [HarmonyX]",
    "Preloader finished",
    "Chainloader ready",
    "Chainloader started",
    "4 plugins to load",
    "Loading [LC_API 3.4.5]",
    "Loading [MoreCompany 1.7.2]",
    "Skipping [OldMod 0.1.0] because it has incompatible dependencies",
    "Loading [ShipLoot 1.0.0]",
    "Chainloader startup complete",
];

fn run(lines: &[&str]) -> (ProgressStateMachine, Vec<ProgressUpdate>) {
    let mut machine = ProgressStateMachine::new();
    let mut updates = Vec::new();
    for line in lines {
        if let Ok(signals) = classify(line) {
            updates.extend(machine.apply_all(signals));
        }
    }
    (machine, updates)
}

fn stages(updates: &[ProgressUpdate]) -> Vec<LoadEvent> {
    updates
        .iter()
        .filter_map(|u| match u {
            ProgressUpdate::Stage(event) => Some(*event),
            _ => None,
        })
        .collect()
}

#[test]
fn plugin_count_then_loading_lines_gives_half_done() {
    let mut lines = vec!["10 plugins to load"];
    lines.extend(["Loading A", "Loading B", "Loading C", "Loading D", "Loading E"]);

    let (machine, _) = run(&lines);

    assert_eq!(machine.state().plugin_count(), 10);
    assert_eq!(machine.state().plugin_processed_count(), 5);
    assert_eq!(machine.state().plugin_percent_done(), 50);
}

#[test]
fn startup_complete_fires_both_final_stages_once() {
    let (machine, updates) = run(&["Chainloader started", "Chainloader startup complete"]);

    let finals: Vec<_> = stages(&updates)
        .into_iter()
        .filter(|e| *e >= LoadEvent::ChainloaderFinish)
        .collect();
    assert_eq!(finals, vec![LoadEvent::ChainloaderFinish, LoadEvent::LoadFinished]);
    assert!(machine.state().is_finished());

    // Replaying the line changes nothing
    let mut machine = machine;
    let replay = machine.apply_all(classify("Chainloader startup complete").unwrap());
    assert!(replay.is_empty());
}

#[test]
fn full_startup_visits_every_stage_in_order() {
    let (machine, updates) = run(BEPINEX5_STARTUP);

    assert_eq!(stages(&updates), LoadEvent::ALL[1..].to_vec());
    assert_eq!(machine.state().plugin_count(), 4);
    assert_eq!(machine.state().plugin_percent_done(), 100);
}

#[test]
fn early_preloader_finished_is_tolerated() {
    // "Preloader finished" before "Preloader started" jumps ahead once,
    // the late "Preloader started" is then a no-op
    let (machine, updates) = run(&["Preloader finished", "Preloader started"]);

    assert_eq!(
        stages(&updates),
        vec![LoadEvent::PreloaderStart, LoadEvent::PreloaderFinish]
    );
    assert_eq!(machine.state().last_event(), LoadEvent::PreloaderFinish);
}

#[test]
fn stage_and_percent_never_decrease() {
    let mut machine = ProgressStateMachine::new();
    let mut last_event = LoadEvent::None;
    let mut last_percent = 0;

    // Shuffled-looking input: stages out of order, counts changing midway
    let lines = [
        "Loading [A]",
        "Preloader started",
        "3 plugins to load",
        "Loading [B]",
        "Patching [X] with [Y]",
        "50 plugins to load",
        "Skipping [C]",
        "Preloader finished",
        "Loading [D]",
        "Loading [E]",
        "Loading [F]",
        "Chainloader started",
    ];
    for line in lines {
        machine.apply_all(classify(line).unwrap());
        let state = machine.state();
        assert!(state.last_event() >= last_event, "stage regressed on {line}");
        assert!(state.plugin_percent_done() >= last_percent, "percent regressed on {line}");
        assert!(state.plugin_percent_done() <= 100);
        last_event = state.last_event();
        last_percent = state.plugin_percent_done();
    }
}

#[test]
fn missing_plugin_count_uses_failsafe() {
    let (machine, _) = run(&["Loading [A]", "Loading [B]"]);

    assert_eq!(machine.state().plugin_count(), DEFAULT_PLUGIN_COUNT);
    assert_eq!(machine.state().plugin_percent_done(), 20);
}

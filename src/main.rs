use std::fs;
use std::rc::Rc;

use chrono::Utc;
use lesson_adapters::register_builtin;
use lesson_core::{ArtifactRegistry, LessonRunner, LessonSession, ManualClock, Manifest, MethodRegistry,
                  SessionStateManager};
use lesson_persistence::{FileEventStore, FileSnapshotStore, JsonLinesHostChannel};
use lessonflow::cli::{PlayArgs, USAGE};
use lessonflow::{play, AppError, Script, CONFIG};

fn main() {
    lessonflow::logging::init_logging();
    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("[lessonflow] {e}");
            std::process::exit(e.exit_code());
        }
    }
}

fn run(args: &[String]) -> Result<i32, AppError> {
    let Some(args) = PlayArgs::parse(args)? else {
        eprintln!("{USAGE}");
        return Ok(2);
    };
    let autosave = args.autosave.unwrap_or(CONFIG.autosave);

    let mut config = CONFIG.clone();
    if let Some(dir) = args.state_dir {
        config.store = config.store.with_state_dir(dir);
    }

    let manifest = Manifest::from_json(&fs::read_to_string(&args.manifest_path)?)?;
    let script = match args.script_path {
        Some(p) => Script::parse(&fs::read_to_string(p)?)?,
        None => Script::default(),
    };

    let clock = ManualClock::new(Utc::now());
    let mut registry = MethodRegistry::new();
    register_builtin(&mut registry);
    let journal = FileEventStore::new(config.store.journal_dir())?;
    let runner = LessonRunner::builder_with_store(journal).registry(registry)
                                                         .clock(clock.clone())
                                                         .config(config.runner_config())
                                                         .build();
    let store = FileSnapshotStore::from_config(&config.store)?;
    let state = SessionStateManager::new(Box::new(store), Rc::new(clock.clone()))
        .with_host(Box::new(JsonLinesHostChannel::stdout()))
        .with_key(config.store.snapshot_key.clone());
    let mut session = LessonSession::new(runner, ArtifactRegistry::default(), state).with_autosave(autosave);

    session.load_lesson(manifest)?;
    if args.fresh {
        session.state_mut().clear_persisted();
    }
    if let Some(p) = args.inject_path {
        session.inject_snapshot(fs::read(p)?);
    }
    let source = session.boot();
    let mut report = play(&mut session, &clock, &script);
    report.recovered_from = Some(source);
    println!("{}", serde_json::to_string(&report)?);
    Ok(0)
}

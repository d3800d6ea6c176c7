//! Reproductor headless.
//!
//! Ejecuta un guion de acciones sobre una `LessonSession` con reloj manual:
//! `wait` avanza el tiempo simulado y dispara el auto-avance pendiente. El
//! guion es un array JSON o JSON lines:
//!
//! ```json
//! [ { "op": "input", "value": { "action": "next" } },
//!   { "op": "wait", "ms": 1500 },
//!   { "op": "next" }, { "op": "collect", "id": "map" } ]
//! ```

use lesson_core::{Clock, EventStore, LessonSession, ManualClock, NavOutcome, RecoverySource};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ScriptStep {
    Next,
    Prev,
    Jump { index: usize },
    Input {
        #[serde(default)]
        value: Value,
    },
    Wait { ms: i64 },
    Collect { id: String },
    Save,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Acepta un array JSON o una acción por línea.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim_start();
        if trimmed.starts_with('[') {
            let steps = serde_json::from_str(trimmed).map_err(|e| AppError::Script(e.to_string()))?;
            return Self::checked(steps);
        }
        let mut steps = Vec::new();
        for (i, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let step = serde_json::from_str(line).map_err(|e| AppError::Script(format!("line {}: {e}", i + 1)))?;
            steps.push(step);
        }
        Self::checked(steps)
    }

    // el reloj simulado sólo avanza
    fn checked(steps: Vec<ScriptStep>) -> Result<Self, AppError> {
        if let Some(pos) = steps.iter().position(|s| matches!(s, ScriptStep::Wait { ms } if *ms < 0)) {
            return Err(AppError::Script(format!("step {}: wait needs ms >= 0", pos + 1)));
        }
        Ok(Self { steps })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayReport {
    pub session_id: Uuid,
    pub recovered_from: Option<RecoverySource>,
    pub final_index: i64,
    pub finished: bool,
    pub collected: Vec<String>,
    /// Peticiones descartadas/abortadas e inputs rechazados.
    pub rejected: usize,
    pub events: Vec<&'static str>,
}

/// Abre la lección (no-op si un restore ya la abrió) y ejecuta el guion.
pub fn play<E: EventStore>(session: &mut LessonSession<E>, clock: &ManualClock, script: &Script) -> PlayReport {
    let mut rejected = 0;
    let mut count = |outcome: NavOutcome| {
        if !outcome.moved() && outcome != NavOutcome::Dropped(lesson_core::DropReason::AlreadyStarted) {
            rejected += 1;
        }
    };
    count(session.begin());
    for step in &script.steps {
        match step {
            ScriptStep::Next => count(session.next_module()),
            ScriptStep::Prev => count(session.prev_module()),
            ScriptStep::Jump { index } => count(session.jump_to(*index)),
            ScriptStep::Input { value } => {
                if let Err(e) = session.dispatch_input(value) {
                    warn!("play:input-rejected err={e}");
                    count(NavOutcome::Unchanged);
                }
            }
            ScriptStep::Wait { ms } if *ms < 0 => {
                warn!("play:wait-rejected ms={ms}");
                count(NavOutcome::Unchanged);
            }
            ScriptStep::Wait { ms } => {
                clock.advance_ms(*ms);
                if let Some(outcome) = session.tick() {
                    count(outcome);
                }
            }
            ScriptStep::Collect { id } => {
                session.collect(id);
            }
            ScriptStep::Save => {
                session.save();
            }
        }
    }
    let runner = session.runner();
    info!("play:done index={} finished={} at={}", runner.index(), runner.is_finished(), clock.now());
    PlayReport { session_id: runner.session_id(),
                 recovered_from: None,
                 final_index: runner.index(),
                 finished: runner.is_finished(),
                 collected: session.artifacts().collected_ids(),
                 rejected,
                 events: runner.event_variants() }
}

//! `EventStore` append-only persistido en JSON lines.
//!
//! Un archivo `<session_id>.jsonl` por sesión. Al primer `append_kind` de una
//! sesión ya existente en disco se rehidrata su historia para continuar la
//! secuencia. Un fallo de escritura se registra con `error!` y el evento
//! queda sólo en memoria: el runner nunca se detiene por el journal.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lesson_core::{EventStore, InMemoryEventStore, LessonEvent, LessonEventKind};
use log::{debug, error, warn};
use uuid::Uuid;

use crate::error::PersistenceError;

#[derive(Debug)]
pub struct FileEventStore {
    dir: PathBuf,
    cache: InMemoryEventStore,
}

impl FileEventStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir,
                  cache: InMemoryEventStore::default() })
    }

    pub fn path_for(&self, session_id: Uuid) -> PathBuf {
        self.dir.join(format!("{session_id}.jsonl"))
    }

    /// Lee la historia persistida de una sesión. Las líneas corruptas se
    /// descartan con warning.
    pub fn load(&self, session_id: Uuid) -> Result<Vec<LessonEvent>, PersistenceError> {
        let path = self.path_for(session_id);
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut events = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LessonEvent>(&line) {
                Ok(ev) => events.push(ev),
                Err(e) => {
                    let err = PersistenceError::Corrupt { path: path.display().to_string(),
                                                          line: i + 1,
                                                          msg: e.to_string() };
                    warn!("load:skip {err}");
                }
            }
        }
        debug!("load:done session_id={session_id} count={}", events.len());
        Ok(events)
    }

    fn hydrate(&mut self, session_id: Uuid) {
        if self.cache.inner.contains_key(&session_id) {
            return;
        }
        let history = match self.load(session_id) {
            Ok(h) => h,
            Err(e) => {
                error!("hydrate:load error session_id={session_id} err={e}");
                Vec::new()
            }
        };
        self.cache.inner.insert(session_id, history);
    }

    fn write_line(path: &Path, event: &LessonEvent) -> Result<(), PersistenceError> {
        let line = serde_json::to_string(event)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl EventStore for FileEventStore {
    fn append_kind(&mut self, session_id: Uuid, kind: LessonEventKind, ts: DateTime<Utc>) -> LessonEvent {
        self.hydrate(session_id);
        let event = self.cache.append_kind(session_id, kind, ts);
        debug!("append_kind:start session_id={session_id} seq={} kind={}", event.seq, event.kind.code());
        if let Err(e) = Self::write_line(&self.path_for(session_id), &event) {
            error!("append_kind:write error session_id={session_id} seq={} err={e}", event.seq);
        }
        event
    }

    fn list(&self, session_id: Uuid) -> Vec<LessonEvent> {
        if let Some(events) = self.cache.inner.get(&session_id) {
            return events.clone();
        }
        self.load(session_id).unwrap_or_else(|e| {
                                 error!("list:load error session_id={session_id} err={e}");
                                 Vec::new()
                             })
    }
}

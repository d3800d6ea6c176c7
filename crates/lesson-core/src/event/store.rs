use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{LessonEvent, LessonEventKind};

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, session_id: Uuid, kind: LessonEventKind, ts: DateTime<Utc>) -> LessonEvent;
    /// Lista eventos de una sesión (orden ascendente por seq).
    fn list(&self, session_id: Uuid) -> Vec<LessonEvent>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    pub inner: HashMap<Uuid, Vec<LessonEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, session_id: Uuid, kind: LessonEventKind, ts: DateTime<Utc>) -> LessonEvent {
        let vec = self.inner.entry(session_id).or_default();
        let seq = vec.len() as u64;
        let ev = LessonEvent { seq,
                               session_id,
                               kind,
                               ts };
        vec.push(ev.clone());
        ev
    }

    fn list(&self, session_id: Uuid) -> Vec<LessonEvent> {
        self.inner.get(&session_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_per_session_and_monotonic() {
        let mut store = InMemoryEventStore::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        assert_eq!(store.append_kind(a, LessonEventKind::AwaitingStart, now).seq, 0);
        assert_eq!(store.append_kind(a, LessonEventKind::Ready, now).seq, 1);
        assert_eq!(store.append_kind(b, LessonEventKind::Ready, now).seq, 0);
        let codes: Vec<_> = store.list(a).iter().map(|e| e.kind.code()).collect();
        assert_eq!(codes, vec!["W", "R"]);
        assert!(store.list(Uuid::new_v4()).is_empty());
    }
}

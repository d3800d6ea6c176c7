//! Bus de eventos tipado de los `MethodInstance`.
//!
//! Cada mensaje lleva un `source` (ruta de nombres desde el instance que lo
//! observa hasta el que lo emitió). Un evento propio tiene ruta vacía; al
//! burbujear hacia el padre se antepone el nombre del hijo. Los listeners se
//! suscriben a un `Topic` exacto (ruta + tipo), de modo que un padre no
//! confunde la finalización de un hijo con la suya propia.
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tipos de evento publicados por un método.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodEventKind {
    /// `init` terminó con éxito.
    Initialized,
    /// `advance_step` incrementó el contador.
    StepComplete,
    /// El método se marcó como completo.
    Complete,
    /// `reset` restauró los contadores.
    Reset,
    /// El handler solicita colectar un artifact (`payload.id`).
    CollectArtifact,
    /// Evento libre definido por el handler.
    Custom(String),
}

impl MethodEventKind {
    pub fn label(&self) -> &str {
        match self {
            MethodEventKind::Initialized => "initialized",
            MethodEventKind::StepComplete => "stepComplete",
            MethodEventKind::Complete => "complete",
            MethodEventKind::Reset => "reset",
            MethodEventKind::CollectArtifact => "collectArtifact",
            MethodEventKind::Custom(name) => name,
        }
    }
}

/// Mensaje jerárquico publicado en el bus.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodMessage {
    pub source: Vec<String>,
    pub kind: MethodEventKind,
    pub payload: Value,
}

impl MethodMessage {
    pub fn new(kind: MethodEventKind, payload: Value) -> Self {
        Self { source: Vec::new(),
               kind,
               payload }
    }

    /// `true` si lo emitió el propio instance que lo observa.
    pub fn is_own(&self) -> bool {
        self.source.is_empty()
    }

    pub fn topic(&self) -> Topic {
        Topic { path: self.source.clone(),
                kind: self.kind.clone() }
    }

    /// Copia del mensaje tal como lo ve el padre de `child`.
    pub(crate) fn bubbled_from(mut self, child: &str) -> Self {
        self.source.insert(0, child.to_string());
        self
    }

    /// Etiqueta plana `hijo:nieto:evento`, sólo para logs.
    pub fn label(&self) -> String {
        let mut parts: Vec<&str> = self.source.iter().map(String::as_str).collect();
        parts.push(self.kind.label());
        parts.join(":")
    }
}

/// Clave de suscripción: ruta de origen + tipo de evento.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    pub path: Vec<String>,
    pub kind: MethodEventKind,
}

impl Topic {
    /// Eventos emitidos por el propio instance.
    pub fn own(kind: MethodEventKind) -> Self {
        Self { path: Vec::new(), kind }
    }

    /// Eventos burbujeados desde un descendiente (`["quiz"]`, `["quiz", "q1"]`, ...).
    pub fn from_child<I, S>(path: I, kind: MethodEventKind) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { path: path.into_iter().map(Into::into).collect(),
               kind }
    }
}

pub type Listener = Box<dyn FnMut(&MethodMessage)>;

/// Tabla de listeners de un instance.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<Topic, Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, topic: Topic, listener: F)
        where F: FnMut(&MethodMessage) + 'static
    {
        self.listeners.entry(topic).or_default().push(Box::new(listener));
    }

    /// Quita todos los listeners de `topic`; devuelve cuántos había.
    pub fn off(&mut self, topic: &Topic) -> usize {
        self.listeners.remove(topic).map(|v| v.len()).unwrap_or(0)
    }

    /// Entrega `msg` a los listeners de su topic; devuelve cuántos lo recibieron.
    pub fn publish(&mut self, msg: &MethodMessage) -> usize {
        match self.listeners.get_mut(&msg.topic()) {
            Some(list) => {
                for l in list.iter_mut() {
                    l(msg);
                }
                list.len()
            }
            None => 0,
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
         .field("topics", &self.listeners.len())
         .field("listeners", &self.listener_count())
         .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn publish_matches_exact_topic_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let s = seen.clone();
        bus.on(Topic::own(MethodEventKind::Complete), move |m| s.borrow_mut().push(m.label()));

        let own = MethodMessage::new(MethodEventKind::Complete, json!(null));
        let child = own.clone().bubbled_from("quiz");
        assert_eq!(bus.publish(&own), 1);
        assert_eq!(bus.publish(&child), 0);
        assert_eq!(*seen.borrow(), vec!["complete".to_string()]);
        assert_eq!(child.label(), "quiz:complete");
    }

    #[test]
    fn off_removes_every_listener_of_topic() {
        let mut bus = EventBus::new();
        let topic = Topic::from_child(["a", "b"], MethodEventKind::Reset);
        bus.on(topic.clone(), |_| {});
        bus.on(topic.clone(), |_| {});
        assert_eq!(bus.listener_count(), 2);
        assert_eq!(bus.off(&topic), 2);
        assert_eq!(bus.listener_count(), 0);
    }
}

//! `MethodCore` + `MethodInstance`: la implementación base del contrato.
//!
//! Un `MethodInstance` es dueño de sus hijos. Cuando un hijo emite, el evento
//! queda en su `outbox`; `with_child` lo retransmite al padre con el nombre
//! del hijo antepuesto a la ruta. El outbox del instance raíz lo vacía el
//! runner (`take_outbox`).
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{EventBus, Lifecycle, MethodBehavior, MethodEventKind, MethodMessage, Topic};
use crate::errors::MethodError;

/// Handle opaco del destino de render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerHandle(pub String);

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Estado base compartido por todos los métodos.
#[derive(Debug)]
pub struct MethodCore {
    name: String,
    container: Option<ContainerHandle>,
    current_step: u32,
    total_steps: u32,
    is_complete: bool,
    lifecycle: Lifecycle,
    parent: Option<String>,
    children: Vec<MethodInstance>,
    bus: EventBus,
    outbox: Vec<MethodMessage>,
}

impl MethodCore {
    fn new(name: String) -> Self {
        Self { name,
               container: None,
               current_step: 0,
               total_steps: 0,
               is_complete: false,
               lifecycle: Lifecycle::Created,
               parent: None,
               children: Vec::new(),
               bus: EventBus::new(),
               outbox: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container(&self) -> Option<&ContainerHandle> {
        self.container.as_ref()
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Nombre del padre si este instance fue compuesto con `add_child`.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn children(&self) -> &[MethodInstance] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&MethodInstance> {
        self.children.iter().find(|c| c.name() == name)
    }

    /// Reconfiguración explícita del techo de pasos. Es la única vía (junto a
    /// `set_state`) por la que `total_steps` cambia.
    pub fn set_total_steps(&mut self, total: u32) {
        self.total_steps = total;
        if self.current_step > total {
            self.current_step = total;
        }
    }

    /// Avanza un paso y emite `StepComplete`. En el techo no hace nada y
    /// devuelve `false`.
    pub fn advance_step(&mut self) -> bool {
        if self.lifecycle == Lifecycle::Destroyed || self.current_step >= self.total_steps {
            return false;
        }
        self.current_step += 1;
        let payload = json!({ "step": self.current_step, "total": self.total_steps });
        self.emit(MethodEventKind::StepComplete, payload);
        true
    }

    /// Marca el método como completo y emite `Complete` una sola vez.
    pub fn mark_complete(&mut self) -> bool {
        if self.lifecycle == Lifecycle::Destroyed || self.is_complete {
            return false;
        }
        self.is_complete = true;
        self.emit(MethodEventKind::Complete, json!({ "step": self.current_step }));
        true
    }

    /// Solicita al runner la colección de un artifact declarado.
    pub fn request_artifact(&mut self, artifact_id: &str) {
        self.emit(MethodEventKind::CollectArtifact, json!({ "id": artifact_id }));
    }

    /// Publica un evento propio y lo deja en el outbox para el padre/runner.
    pub fn emit(&mut self, kind: MethodEventKind, payload: Value) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        let msg = MethodMessage::new(kind, payload);
        let delivered = self.bus.publish(&msg);
        debug!("emit name={} event={} listeners={delivered}", self.name, msg.label());
        self.outbox.push(msg);
    }

    pub fn on<F>(&mut self, topic: Topic, listener: F)
        where F: FnMut(&MethodMessage) + 'static
    {
        self.bus.on(topic, listener);
    }

    pub fn listener_count(&self) -> usize {
        self.bus.listener_count()
    }

    /// Compone un hijo. Los ciclos son imposibles: el padre es dueño del hijo.
    pub fn add_child(&mut self, mut child: MethodInstance) -> &mut MethodInstance {
        child.core.parent = Some(self.name.clone());
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Ejecuta `f` sobre el hijo `name` y retransmite lo que haya emitido.
    pub fn with_child<R, F>(&mut self, name: &str, f: F) -> Result<R, MethodError>
        where F: FnOnce(&mut MethodInstance) -> R
    {
        let idx = self.children
                      .iter()
                      .position(|c| c.name() == name)
                      .ok_or_else(|| MethodError::UnknownChild(name.to_string()))?;
        let result = f(&mut self.children[idx]);
        let pending = self.children[idx].core.take_outbox();
        let child_name = self.children[idx].name().to_string();
        for msg in pending {
            self.relay(msg.bubbled_from(&child_name));
        }
        Ok(result)
    }

    fn relay(&mut self, msg: MethodMessage) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.bus.publish(&msg);
        self.outbox.push(msg);
    }

    /// Vacía el outbox (eventos propios y burbujeados, en orden de emisión).
    pub fn take_outbox(&mut self) -> Vec<MethodMessage> {
        std::mem::take(&mut self.outbox)
    }

    fn base_state(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".into(), Value::from(self.name.clone()));
        map.insert("currentStep".into(), Value::from(self.current_step));
        map.insert("totalSteps".into(), Value::from(self.total_steps));
        map.insert("isComplete".into(), Value::from(self.is_complete));
        map
    }

    fn apply_base_state(&mut self, saved: &Map<String, Value>) {
        if let Some(total) = saved.get("totalSteps").and_then(Value::as_u64) {
            self.total_steps = u32::try_from(total).unwrap_or(u32::MAX);
        }
        if let Some(step) = saved.get("currentStep").and_then(Value::as_u64) {
            let step = u32::try_from(step).unwrap_or(u32::MAX);
            self.current_step = step.min(self.total_steps);
        }
        if let Some(done) = saved.get("isComplete").and_then(Value::as_bool) {
            self.is_complete = done;
        }
    }
}

/// Instance de un método: estado base + behavior específico del tipo.
pub struct MethodInstance {
    core: MethodCore,
    behavior: Box<dyn MethodBehavior>,
}

/// Factory base: construye un instance a partir de un nombre y sus hooks.
pub fn create_method<B>(name: impl Into<String>, behavior: B) -> MethodInstance
    where B: MethodBehavior + 'static
{
    MethodInstance::new(name, Box::new(behavior))
}

impl MethodInstance {
    pub fn new(name: impl Into<String>, behavior: Box<dyn MethodBehavior>) -> Self {
        Self { core: MethodCore::new(name.into()),
               behavior }
    }

    pub fn core(&self) -> &MethodCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut MethodCore {
        &mut self.core
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn current_step(&self) -> u32 {
        self.core.current_step
    }

    pub fn total_steps(&self) -> u32 {
        self.core.total_steps
    }

    pub fn is_complete(&self) -> bool {
        self.core.is_complete
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.core.lifecycle
    }

    /// Monta el método en `container`. Si el hook falla el instance vuelve a
    /// `Created` sin contenedor.
    pub fn init(&mut self, container: ContainerHandle, options: &Value) -> Result<(), MethodError> {
        if self.core.lifecycle == Lifecycle::Destroyed {
            return Err(MethodError::Destroyed(self.core.name.clone()));
        }
        self.core.container = Some(container);
        self.core.lifecycle = Lifecycle::Active;
        if let Err(e) = self.behavior.on_init(&mut self.core, options) {
            warn!("init:failed name={} err={e}", self.core.name);
            self.core.container = None;
            self.core.lifecycle = Lifecycle::Created;
            return Err(e);
        }
        self.core.emit(MethodEventKind::Initialized, Value::Null);
        Ok(())
    }

    pub fn handle_input(&mut self, input: &Value) -> Result<(), MethodError> {
        match self.core.lifecycle {
            Lifecycle::Active => self.behavior.on_input(&mut self.core, input),
            Lifecycle::Created => Err(MethodError::NotInitialized(self.core.name.clone())),
            Lifecycle::Destroyed => Err(MethodError::Destroyed(self.core.name.clone())),
        }
    }

    /// Destruye primero los hijos, luego el propio behavior, y al final
    /// limpia listeners y outbox. Idempotente.
    pub fn destroy(&mut self) {
        if self.core.lifecycle == Lifecycle::Destroyed {
            return;
        }
        for child in self.core.children.iter_mut() {
            child.destroy();
        }
        self.behavior.on_destroy(&mut self.core);
        self.core.children.clear();
        self.core.bus.clear();
        self.core.outbox.clear();
        self.core.container = None;
        self.core.lifecycle = Lifecycle::Destroyed;
        debug!("destroy:done name={}", self.core.name);
    }

    pub fn reset(&mut self) {
        self.core.current_step = 0;
        self.core.is_complete = false;
        self.behavior.on_reset(&mut self.core);
        self.core.emit(MethodEventKind::Reset, Value::Null);
    }

    /// Estado serializable: campos propios del behavior + forma base. Los
    /// campos base tienen precedencia.
    pub fn get_state(&self) -> Value {
        let mut map = self.behavior.state();
        map.extend(self.core.base_state());
        Value::Object(map)
    }

    /// Aplica un estado guardado. Seguro antes o después de `init`; valores
    /// que no son objeto se ignoran.
    pub fn set_state(&mut self, saved: &Value) {
        let Some(map) = saved.as_object() else {
            warn!("set_state:ignored name={} reason=not-an-object", self.core.name);
            return;
        };
        self.core.apply_base_state(map);
        self.behavior.apply_state(&mut self.core, map);
    }

    pub fn advance_step(&mut self) -> bool {
        self.core.advance_step()
    }

    pub fn mark_complete(&mut self) -> bool {
        self.core.mark_complete()
    }

    pub fn on<F>(&mut self, topic: Topic, listener: F)
        where F: FnMut(&MethodMessage) + 'static
    {
        self.core.on(topic, listener);
    }

    pub fn add_child(&mut self, child: MethodInstance) -> &mut MethodInstance {
        self.core.add_child(child)
    }

    pub fn with_child<R, F>(&mut self, name: &str, f: F) -> Result<R, MethodError>
        where F: FnOnce(&mut MethodInstance) -> R
    {
        self.core.with_child(name, f)
    }

    pub fn take_outbox(&mut self) -> Vec<MethodMessage> {
        self.core.take_outbox()
    }

    /// Rutas `padre/hijo/...` de todo el árbol, en preorden.
    pub fn instance_names(&self) -> Vec<String> {
        let mut out = vec![self.core.name.clone()];
        for child in &self.core.children {
            out.extend(child.instance_names()
                            .into_iter()
                            .map(|n| format!("{}/{n}", self.core.name)));
        }
        out
    }
}

impl fmt::Debug for MethodInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInstance")
         .field("core", &self.core)
         .field("behavior", &self.behavior)
         .finish()
    }
}

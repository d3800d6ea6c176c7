//! Contrato de los métodos de enseñanza.
//!
//! Todo handler de contenido se expresa como un `MethodInstance`: un estado
//! base común (`MethodCore`: contadores, eventos, hijos, ciclo de vida) más un
//! `MethodBehavior` con los hooks propios del tipo. El runner sólo conoce
//! esta interfaz y trata a todos los tipos de forma polimórfica.

mod contract;
mod events;
mod instance;
mod status;

pub use contract::{MethodBehavior, Passive};
pub use events::{EventBus, Listener, MethodEventKind, MethodMessage, Topic};
pub use instance::{create_method, ContainerHandle, MethodCore, MethodInstance};
pub use status::Lifecycle;

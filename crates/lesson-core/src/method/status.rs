/// Fase del ciclo de vida de un `MethodInstance`.
///
/// Las transiciones válidas son:
/// - `Created` -> `Active` (init exitoso)
/// - `Created` | `Active` -> `Destroyed`
///
/// Un instance destruido no vuelve a usarse: el runner crea uno nuevo en
/// cada entrada a un módulo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Construido por la factory, todavía sin `init`.
    Created,
    /// `init` terminó correctamente.
    Active,
    /// `destroy` ya se ejecutó.
    Destroyed,
}

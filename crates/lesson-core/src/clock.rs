//! Fuente de tiempo inyectable.
//!
//! El runner no tiene hilos ni timers propios: cooldowns y auto-avance se
//! modelan como deadlines que se comparan contra `Clock::now`. En tests se usa
//! `ManualClock` para avanzar el tiempo de forma determinista.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// `at + delay`, saturando en `DateTime::<Utc>::MAX_UTC`. Un deadline que
/// desborda nunca vence.
pub fn deadline_after(at: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    at.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Reloj de pared (UTC).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Reloj manual compartible: los clones ven el mismo instante.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { inner: Rc::new(Cell::new(start)) }
    }

    /// Avanza el reloj. No retrocede: `ms` negativos se ignoran y el
    /// desbordamiento satura.
    pub fn advance_ms(&self, ms: i64) {
        let step = Duration::milliseconds(ms.max(0));
        self.inner.set(deadline_after(self.inner.get(), step));
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.inner.set(at);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.inner.get()
    }
}

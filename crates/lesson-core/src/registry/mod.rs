//! Registro de tipos de método.
//!
//! Mapea un tag (`"progressive-disclosure"`, `"scenario"`, ...) a una factory
//! que produce instances nuevos e independientes en cada llamada.
//!
//! Algoritmo de resolución (único):
//! 1. coincidencia exacta del tag;
//! 2. un único salto por la tabla de alias explícita (nombres heredados).
//!
//! No hay transformación implícita de nombres: un alias que no esté
//! registrado con `alias` no resuelve.
use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::method::MethodInstance;

pub type MethodFactory = Box<dyn Fn() -> MethodInstance>;

#[derive(Default)]
pub struct MethodRegistry {
    factories: IndexMap<String, MethodFactory>,
    aliases: HashMap<String, String>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra (o reemplaza) la factory de `tag`. Devuelve `true` si
    /// reemplazó una existente.
    pub fn register<F>(&mut self, tag: impl Into<String>, factory: F) -> bool
        where F: Fn() -> MethodInstance + 'static
    {
        let tag = tag.into();
        debug!("register:tag={tag}");
        self.factories.insert(tag, Box::new(factory)).is_some()
    }

    pub fn unregister(&mut self, tag: &str) -> bool {
        self.factories.shift_remove(tag).is_some()
    }

    /// Declara `legacy` como alias de `canonical`.
    pub fn alias(&mut self, legacy: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(legacy.into(), canonical.into());
    }

    /// Tag canónico al que resuelve `tag`, si existe factory para él.
    pub fn resolve<'a>(&'a self, tag: &'a str) -> Option<&'a str> {
        if let Some((k, _)) = self.factories.get_key_value(tag) {
            return Some(k.as_str());
        }
        let canonical = self.aliases.get(tag)?;
        match self.factories.get_key_value(canonical.as_str()) {
            Some((k, _)) => Some(k.as_str()),
            None => {
                warn!("resolve:dangling-alias tag={tag} canonical={canonical}");
                None
            }
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.resolve(tag).is_some()
    }

    /// Crea un instance nuevo para `tag` (o su alias).
    pub fn create(&self, tag: &str) -> Option<MethodInstance> {
        let canonical = self.resolve(tag)?;
        self.factories.get(canonical).map(|factory| factory())
    }

    /// Tags registrados en orden de registro (tooling).
    pub fn registered_types(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Tags que contienen `needle` (tooling).
    pub fn filter_types(&self, needle: &str) -> Vec<&str> {
        self.factories
            .keys()
            .filter(|k| k.contains(needle))
            .map(String::as_str)
            .collect()
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
         .field("types", &self.registered_types())
         .field("aliases", &self.aliases)
         .finish()
    }
}

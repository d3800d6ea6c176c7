//! Alta de los métodos incluidos en el crate.

use lesson_core::{create_method, MethodRegistry};

use crate::methods::{BundleMethod, RevealMethod, ScenarioMethod};

pub const PROGRESSIVE_DISCLOSURE: &str = "progressive-disclosure";
pub const SCENARIO: &str = "scenario";
pub const BUNDLE: &str = "bundle";

/// Nombres heredados que siguen apareciendo en manifests antiguos.
const LEGACY_ALIASES: &[(&str, &str)] = &[("ProgressiveDisclosureMethod", PROGRESSIVE_DISCLOSURE),
                                          ("progressiveDisclosure", PROGRESSIVE_DISCLOSURE),
                                          ("ScenarioMethod", SCENARIO),
                                          ("BundleMethod", BUNDLE)];

pub fn register_builtin(registry: &mut MethodRegistry) {
    registry.register(PROGRESSIVE_DISCLOSURE, || create_method(PROGRESSIVE_DISCLOSURE, RevealMethod::default()));
    registry.register(SCENARIO, || create_method(SCENARIO, ScenarioMethod::default()));
    registry.register(BUNDLE, || create_method(BUNDLE, BundleMethod::default()));
    for (legacy, canonical) in LEGACY_ALIASES {
        registry.alias(*legacy, *canonical);
    }
}

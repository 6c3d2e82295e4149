//! Critique personas for antithesis fan-out.
//!
//! This module provides:
//! - `Persona`: an immutable named critique perspective
//! - A fixed built-in catalog (see [`all_personas`])
//! - Preset groups and name resolution via [`resolve_personas`]

mod builtins;

pub use builtins::*;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A named critique perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Display name, also used as the section header in merged critiques.
    pub name: String,
    /// Short description of the role.
    pub description: String,
    /// What this persona looks for.
    pub focus: String,
    /// Extra instructions appended to the critique prompt.
    pub instructions: String,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        focus: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            focus: focus.into(),
            instructions: instructions.into(),
        }
    }
}

/// Names of the preset persona groups.
pub const PERSONA_GROUPS: &[&str] = &["balanced", "rigorous", "all"];

/// Look up a built-in persona by name (case-insensitive).
pub fn find_persona(name: &str) -> Option<Persona> {
    let name = name.trim();
    all_personas()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Personas in a preset group (case-insensitive).
pub fn persona_group(group: &str) -> Option<Vec<Persona>> {
    match group.trim().to_lowercase().as_str() {
        "balanced" => Some(vec![logician(), empiricist(), pragmatist()]),
        "rigorous" => Some(vec![logician(), empiricist()]),
        "all" => Some(all_personas()),
        _ => None,
    }
}

/// Resolve a group name or a comma-separated list of persona names.
///
/// Duplicates are kept once, at their first position. An empty selector resolves to
/// no personas (single-critic mode).
pub fn resolve_personas(selector: &str) -> AppResult<Vec<Persona>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(group) = persona_group(selector) {
        return Ok(group);
    }

    let mut resolved: Vec<Persona> = Vec::new();
    for name in selector.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let persona = find_persona(name).ok_or_else(|| AppError::InvalidRequest {
            field: "personas".to_string(),
            reason: format!("Unknown persona '{}'", name),
        })?;
        if !resolved.iter().any(|p| p.name == persona.name) {
            resolved.push(persona);
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(personas: &[Persona]) -> Vec<&str> {
        personas.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_catalog_names_are_unique() {
        let all = all_personas();
        let mut seen = names(&all);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), all.len());
    }

    #[test]
    fn test_find_persona_case_insensitive() {
        assert_eq!(find_persona("EMPIRICIST").unwrap().name, "Empiricist");
        assert_eq!(find_persona("  logician ").unwrap().name, "Logician");
        assert!(find_persona("astrologer").is_none());
    }

    #[test]
    fn test_groups() {
        for group in PERSONA_GROUPS {
            assert!(persona_group(group).is_some(), "group {} missing", group);
        }
        assert_eq!(
            names(&persona_group("rigorous").unwrap()),
            vec!["Logician", "Empiricist"]
        );
        assert!(persona_group("unknown").is_none());
    }

    #[test]
    fn test_resolve_list_preserves_order_and_dedups() {
        let resolved = resolve_personas("pragmatist, Logician,PRAGMATIST").unwrap();
        assert_eq!(names(&resolved), vec!["Pragmatist", "Logician"]);
    }

    #[test]
    fn test_resolve_group() {
        let resolved = resolve_personas("Balanced").unwrap();
        assert_eq!(names(&resolved), vec!["Logician", "Empiricist", "Pragmatist"]);
    }

    #[test]
    fn test_resolve_empty_is_single_critic() {
        assert!(resolve_personas("   ").unwrap().is_empty());
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let err = resolve_personas("logician,astrologer").unwrap_err();
        assert!(err.to_string().contains("Unknown persona 'astrologer'"));
    }
}

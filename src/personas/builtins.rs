//! Built-in critique personas.

use super::Persona;

/// Formal-logic critic.
pub fn logician() -> Persona {
    Persona::new(
        "Logician",
        "formal reasoning auditor",
        "validity of inferences, hidden premises, internal consistency",
        "Identify non-sequiturs, equivocations and premises the argument needs but never states.",
    )
}

/// Evidence-first critic.
pub fn empiricist() -> Persona {
    Persona::new(
        "Empiricist",
        "evidence and measurement skeptic",
        "quality of evidence, sample sizes, confounders, falsifiability",
        "Ask what data would have to be true for the claim to hold and whether that data exists.",
    )
}

/// Consequences-and-feasibility critic.
pub fn pragmatist() -> Persona {
    Persona::new(
        "Pragmatist",
        "implementation and consequences reviewer",
        "cost, feasibility, second-order effects, incentives",
        "Describe how the position fails when someone actually tries to act on it.",
    )
}

/// Values-and-stakeholders critic.
pub fn ethicist() -> Persona {
    Persona::new(
        "Ethicist",
        "values and stakeholder advocate",
        "who bears the costs, fairness, rights, long-term harms",
        "Name the stakeholders the position ignores and the harms it externalizes.",
    )
}

/// Devil's advocate.
pub fn contrarian() -> Persona {
    Persona::new(
        "Contrarian",
        "devil's advocate",
        "the strongest case for the opposite conclusion",
        "Argue the opposite bottom line as persuasively as possible, even if you disagree.",
    )
}

/// Every built-in persona, in catalog order.
pub fn all_personas() -> Vec<Persona> {
    vec![logician(), empiricist(), pragmatist(), ethicist(), contrarian()]
}

//! Centralized prompt definitions for the dialectic phases
//!
//! This module contains all system prompts and prompt builders used by the engine.
//! Keeping the output-format instructions here keeps them in step with the parser
//! labels in [`crate::engine::parser`].

use crate::personas::Persona;

/// System prompt for the thesis phase.
pub const THESIS_SYSTEM_PROMPT: &str = r#"You are a rigorous analyst. Take a clear, well-argued position on the question you are given.

Guidelines:
- State your bottom-line answer in the first paragraph
- Support it with the strongest reasoning and evidence available
- Make your assumptions explicit
- Be concise; do not hedge every sentence"#;

/// System prompt for the antithesis phase.
pub const ANTITHESIS_SYSTEM_PROMPT: &str = r#"You are an adversarial critic. Your job is to find where a position is wrong, incomplete or overconfident.

Report each problem in exactly this format:
CONTRADICTION: <one-sentence description of the flaw>
EVIDENCE: <the fact, counterexample or reasoning that exposes it>

Guidelines:
- List every substantive contradiction, most important first
- Attack the reasoning, not the wording
- After the list, state the alternative position you would defend"#;

/// System prompt for the synthesis phase.
pub const SYNTHESIS_SYSTEM_PROMPT: &str = r#"You are a synthesizer. Given a position and a critique of it, produce a stronger position that survives the critique.

Guidelines:
- Keep what the critique did not refute
- Resolve or explicitly concede each contradiction raised
- State the synthesized position clearly

Finish with open questions that evidence could settle, each in exactly this format:
RESEARCH_PROPOSAL: <what to investigate>
TESTABLE_PREDICTION: <an observable outcome that would confirm or refute it>"#;

/// System prompt for the conflict classifier.
pub const CONFLICT_CLASSIFIER_PROMPT: &str = r#"You compare two texts and rate how strongly the second text's bottom-line recommendation opposes the first's.

Respond with minified JSON only, in exactly this format:
{"conflict":0.0}

Scale:
- 0.0: the recommendations agree
- 0.5: partial disagreement or different emphasis
- 1.0: directly opposite recommendations"#;

/// User prompt for the thesis phase.
pub fn thesis_prompt(query: &str) -> String {
    format!("Question:\n{}\n\nState and defend your position.", query)
}

/// User prompt for a single-critic antithesis phase.
pub fn antithesis_prompt(query: &str, thesis: &str) -> String {
    format!(
        "Question:\n{}\n\nPosition under review:\n{}\n\nCritique this position.",
        query, thesis
    )
}

/// User prompt for one persona's critique.
pub fn persona_antithesis_prompt(query: &str, thesis: &str, persona: &Persona) -> String {
    format!(
        "You are critiquing as the {} ({}).\nFocus: {}\n{}\n\n{}",
        persona.name,
        persona.description,
        persona.focus,
        persona.instructions,
        antithesis_prompt(query, thesis)
    )
}

/// User prompt for the synthesis phase.
pub fn synthesis_prompt(query: &str, thesis: &str, antithesis: &str) -> String {
    format!(
        "Question:\n{}\n\nPosition:\n{}\n\nCritique:\n{}\n\nProduce the synthesis.",
        query, thesis, antithesis
    )
}

/// User prompt for the conflict classifier.
pub fn conflict_prompt(thesis: &str, antithesis: &str) -> String {
    format!("TEXT 1:\n{}\n\nTEXT 2:\n{}", thesis, antithesis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::find_persona;

    #[test]
    fn test_format_labels_match_parser() {
        assert!(ANTITHESIS_SYSTEM_PROMPT.contains("CONTRADICTION:"));
        assert!(ANTITHESIS_SYSTEM_PROMPT.contains("EVIDENCE:"));
        assert!(SYNTHESIS_SYSTEM_PROMPT.contains("RESEARCH_PROPOSAL:"));
        assert!(SYNTHESIS_SYSTEM_PROMPT.contains("TESTABLE_PREDICTION:"));
        assert!(CONFLICT_CLASSIFIER_PROMPT.contains(r#"{"conflict":0.0}"#));
    }

    #[test]
    fn test_synthesis_prompt_includes_all_inputs() {
        let prompt = synthesis_prompt("Q?", "T.", "A.");
        assert!(prompt.contains("Q?"));
        assert!(prompt.contains("T."));
        assert!(prompt.contains("A."));
    }

    #[test]
    fn test_persona_prompt_includes_focus() {
        let persona = find_persona("logician").unwrap();
        let prompt = persona_antithesis_prompt("Q?", "T.", &persona);
        assert!(prompt.contains(&persona.name));
        assert!(prompt.contains(&persona.focus));
        assert!(prompt.contains("Position under review:\nT."));
    }
}

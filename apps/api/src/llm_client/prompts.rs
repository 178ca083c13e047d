// Shared prompt constants and prompt-building utilities.
// Each operation that needs LLM calls defines its prompts in interview/prompts.rs.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every feedback prompt.
pub const ACTIONABLE_INSTRUCTION: &str = "\
    Feedback must be specific to what the candidate actually said or how they said it. \
    Every field must contain actionable advice the candidate can apply in their next answer. \
    Do NOT invent content that is not present in the input.";

/// Substitutes `{name}` placeholders in a single left-to-right pass.
///
/// Inserted values are never rescanned, so user text that happens to contain
/// `{response}` or similar is sent verbatim. Unknown placeholders and stray
/// braces are left as they are.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_brace = &rest[open + 1..];
        let hit = vars.iter().find_map(|&(name, value)| {
            after_brace
                .strip_prefix(name)
                .and_then(|tail| tail.strip_prefix('}'))
                .map(|tail| (value, tail))
        });
        match hit {
            Some((value, tail)) => {
                out.push_str(value);
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after_brace;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_replaces_known_placeholders() {
        let filled = fill_template(
            "Q: {question}\nA: {response}",
            &[("question", "Why us?"), ("response", "Because.")],
        );
        assert_eq!(filled, "Q: Why us?\nA: Because.");
    }

    #[test]
    fn test_fill_template_does_not_rescan_inserted_text() {
        let filled = fill_template(
            "Q: {question}\nA: {response}",
            &[
                ("question", "Tell me about {response}"),
                ("response", "I said {question}"),
            ],
        );
        assert_eq!(filled, "Q: Tell me about {response}\nA: I said {question}");
    }

    #[test]
    fn test_fill_template_keeps_json_braces_and_unknown_names() {
        let filled = fill_template("{\n  \"a\": 1\n} {other} {", &[("a", "x")]);
        assert_eq!(filled, "{\n  \"a\": 1\n} {other} {");
    }
}

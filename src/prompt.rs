/// Substitution point inside [`DEOBFUSCATE_PROMPT`].
pub const CODE_PLACEHOLDER: &str = "{code}";

/// Instruction sent ahead of the obfuscated source.
pub const DEOBFUSCATE_PROMPT: &str = "You are a JavaScript expert. Analyze the obfuscated code below and, \
without changing what it does, rename the obfuscated variables to readable names that match how they are used.
Requirements:
1. Only rename identifiers; do not change the logic or structure of the code
2. New names must reflect the actual purpose of each value in the code
3. Keep the formatting of the code unchanged
4. Return the complete modified code only, with no explanation, no code block markers and nothing else

Code:
{code}";

/// Inserts the source into the template as-is. Only the first placeholder is
/// replaced, so a literal `{code}` inside the source survives untouched.
#[must_use]
pub fn render_prompt(source: &str) -> String {
    DEOBFUSCATE_PROMPT.replacen(CODE_PLACEHOLDER, source, 1)
}

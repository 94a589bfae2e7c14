//! Prompt builders for every flow.
//!
//! Each builder embeds the caller's text verbatim and spells out the exact
//! JSON shape the reply must have. The input is neither escaped nor length
//! capped; whatever the caller sends becomes part of the instruction. Use
//! [`excerpt`] whenever caller text goes into a log line.

use crate::config::GenerationConfig;

/// Instruction for the production-planning analysis flow.
pub fn analysis_prompt(text: &str) -> String {
    format!(
        r#"You are an expert AI assistant that helps small fruit business owners plan production and calculate profits.
The user will describe available resources (for example: 200 kg apples, 150 kg oranges, 100 kg sugar) and the recipe or formula for one product (jam, juice, marmalade, etc).
Each product requires different ingredient amounts, and ingredient costs can also vary.

Your job:
1. Calculate how many total products can be made.
2. Estimate maximum profit (based on ingredient costs if given).
3. Show how much of each ingredient is used and how much is left.
4. If prices are missing, give an estimated total cost and profit.
5. Always reply in JSON format only with these keys:

{{
  "productType": "string",
  "totalProducts": number,
  "estimatedProfit": number,
  "usedIngredients": {{ "ingredientName": number }},
  "leftoverIngredients": {{ "ingredientName": number }},
  "notes": "string"
}}

Now use the same logic for this user input:
{text}
"#
    )
}

/// Instruction for the structured academic document flow.
///
/// Outline range, word counts and language come from `config`.
pub fn document_prompt(topic: &str, config: &GenerationConfig) -> String {
    let (min_points, max_points) = config.outline_points;
    format!(
        r#"Write a structured academic document about "{topic}" in this JSON format:
{{
  "title": "string",
  "outline": ["point1", "point2", "point3"],
  "paragraphs": [{{ "point1": ["para1", "para2"] }}],
  "conclusion": "string",
  "references": ["ref1", "ref2"]
}}

Guidelines:
- The title should be short and academic.
- The outline should contain {min_points}–{max_points} main sections.
- For each outline point, write paragraphs including {words} words and if formulas exist, add those.
- Each paragraph should be factual and clear.
- Include APA-style references.
- Conclusion must include at least {conclusion} words.
- Language must be in {language}.
- Respond ONLY in pure JSON (no markdown).
"#,
        words = config.paragraph_words,
        conclusion = config.conclusion_words,
        language = config.language,
    )
}

/// Instruction for Cyrillic → Latin transliteration.
pub fn transliteration_prompt(text: &str) -> String {
    format!(
        r#"You are an expert AI assistant that helps people convert kirilcha to lotin
1. Always reply in JSON format only with these keys:

{{
  "data": "string"
}}
Now use the same logic for this user input:
{text}
"#
    )
}

const EXCERPT_CHARS: usize = 100;

/// Log-safe preview of caller text: trimmed, cut at 100 characters on a char
/// boundary, with the total length appended when cut.
pub fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::from("[EMPTY]");
    }

    match trimmed.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!(
            "{}… ({} chars total)",
            &trimmed[..cut],
            trimmed.chars().count()
        ),
        None => trimmed.to_string(),
    }
}

//! The fixed instruction prompt sent alongside the aggregated deck text.

/// The sentence the model must answer with when the deck is clean.
pub const NO_FINDINGS_SENTENCE: &str = "No inconsistencies were found in the presentation.";

/// Build the full analysis prompt embedding the aggregated slide text.
///
/// The instructions ask for factual, numerical, and timeline contradictions
/// only; style and grammar are explicitly off the table so the report stays
/// actionable.
pub fn build_analysis_prompt(aggregated_text: &str) -> String {
    format!(
        "You are an expert business and strategy consultant for a top-tier firm like McKinsey or BCG.\n\
         Your task is to meticulously analyze the following content extracted from a multi-slide PowerPoint presentation.\n\
         The content from each slide is clearly separated and labeled with '--- Slide X ---'.\n\
         \n\
         Your goal is to identify all factual, numerical, and logical inconsistencies across the entire deck. Pay close attention to:\n\
         1.  **Conflicting Numerical Data:** Look for mismatched revenue figures, user counts, market shares, financial projections, or percentages that don't add up. Be precise. For example, '$15M' on one slide vs. '$12M' on another.\n\
         2.  **Contradictory Textual Claims:** Identify statements that contradict each other. For example, \"we are entering a low-competition market\" on one slide and \"we must navigate a highly competitive landscape\" on another.\n\
         3.  **Timeline Mismatches:** Find conflicting dates, project phases, or launch forecasts.\n\
         \n\
         **Instructions for Output:**\n\
         - Analyze the content below thoroughly.\n\
         - If you find one or more inconsistencies, list each one clearly. For each inconsistency, provide:\n\
             - A short, bolded title for the inconsistency (e.g., **Conflicting Revenue Projections**).\n\
             - The slide numbers where the conflicting information appears (e.g., \"Slide 2 vs. Slide 4.\").\n\
             - The specific conflicting data or statements, quoting them if possible.\n\
             - A brief explanation of why it's an inconsistency.\n\
         - If you find absolutely no inconsistencies, you MUST respond with the single sentence: \"{NO_FINDINGS_SENTENCE}\"\n\
         - Do not comment on the presentation's quality, style, or grammar. Focus ONLY on factual and logical contradictions.\n\
         \n\
         Here is the presentation content:\n\
         ---\n\
         {aggregated_text}\n\
         ---\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_document() {
        let doc = "--- Slide 1 ---\nRevenue $15M\n\n--- Slide 2 ---\nRevenue $12M";
        let prompt = build_analysis_prompt(doc);

        assert!(prompt.contains(doc));
    }

    #[test]
    fn test_prompt_contains_no_findings_sentence() {
        let prompt = build_analysis_prompt("--- Slide 1 ---");

        assert!(prompt.contains(NO_FINDINGS_SENTENCE));
    }

    #[test]
    fn test_prompt_fences_content() {
        let prompt = build_analysis_prompt("DECK TEXT");
        let fence_start = prompt.find("---\nDECK TEXT").unwrap();
        let fence_end = prompt.rfind("---\n").unwrap();

        assert!(fence_start < fence_end);
    }
}

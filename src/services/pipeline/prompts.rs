//! Role prompts for the plan/design/code/test loop.

pub fn plan_prompt(instruction: &str) -> String {
    format!(
        "A user wants this change made to their website:\n\n{}\n\n\
         Write a short numbered, step-by-step plan for the modification. Describe what \
         should change on each page, not how to write the code.",
        instruction.trim()
    )
}

pub fn design_prompt(content: &str, plan: &str) -> String {
    format!(
        "Modification plan:\n{plan}\n\n\
         Current page:\n{content}\n\n\
         Give concrete design directives for this page: exact colors (hex), spacing, \
         typography and any layout adjustments. Prose only, no code.",
        plan = plan.trim(),
        content = content,
    )
}

pub fn code_prompt(content: &str, plan: &str, design_specs: &str) -> String {
    format!(
        "Modification plan:\n{plan}\n\n\
         Design directives:\n{design}\n\n\
         Current page:\n{content}\n\n\
         Rewrite the page so it follows the plan and the directives. Keep all existing \
         content, links and scripts that the plan does not ask to change. Return the \
         complete HTML document only, no explanation.",
        plan = plan.trim(),
        design = design_specs.trim(),
        content = content,
    )
}

pub fn review_prompt(original: &str, updated: &str, instruction: &str) -> String {
    format!(
        "Requested change:\n{instruction}\n\n\
         Original page:\n{original}\n\n\
         Updated page:\n{updated}\n\n\
         Review the updated page against the request. If it fully satisfies the request \
         without breaking existing content, say \"Looks good\". Otherwise list the \
         specific problems to fix.",
        instruction = instruction.trim(),
        original = original,
        updated = updated,
    )
}

/// Feedback appended to the design directives for the next coding round.
pub fn feedback_section(round: u32, feedback: &str) -> String {
    format!("\n\nReviewer feedback (round {}):\n{}", round, feedback.trim())
}

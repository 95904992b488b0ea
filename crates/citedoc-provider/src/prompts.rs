//! Prompt text sent alongside documents and questions.

pub const CONFIRMATION_INSTRUCTION: &str =
    "Please analyze this PDF document and confirm it has been processed for citations.";

/// Substituted when ask-simple is called without context.
pub const NO_CONTEXT_PLACEHOLDER: &str = "No specific context provided";

pub fn citation_prompt(question: &str) -> String {
    format!(
        "Please answer this question based on the provided PDF document: {}\n\n\
         Provide a detailed answer with specific citations from the document. \
         Include page references and quote the relevant text that supports your answer.",
        question
    )
}

pub fn simple_prompt(question: &str, context: Option<&str>) -> String {
    let context = context
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(NO_CONTEXT_PLACEHOLDER);
    format!(
        "Context: {}\n\nQuestion: {}\n\nPlease provide a clear, concise answer.",
        context, question
    )
}

pub(crate) fn answer_prompt(
    context: &str,
    question: &str,
    format_instructions: &str,
) -> String {
    // Keep the contract explicit:
    // - The model, not the pipeline, judges whether context was useful.
    // - Output must be machine-readable JSON matching the declared schema.
    format!(
        r#"You are a helpful assistant. Decide how to answer based on the context:

- If the provided context is useful, combine it with your reasoning.
  In that case set "mode" = "context+reasoning".
- If the context is missing or irrelevant, rely only on your reasoning.
  In that case set "mode" = "reasoning".
- Always return valid JSON.

Context:
{context}

Question:
{question}

{format_instructions}
"#
    )
}

pub(crate) fn repair_prompt(
    context: &str,
    question: &str,
    format_instructions: &str,
    previous_reply: &str,
    validation_error: &str,
) -> String {
    format!(
        r#"Your previous reply did not satisfy the required output format.

Validation error:
{validation_error}

Previous reply:
{previous_reply}

Answer the question again. Return ONLY a corrected JSON object, with no
surrounding prose or markdown.

Context:
{context}

Question:
{question}

{format_instructions}
"#
    )
}

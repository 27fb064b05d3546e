use askpdf_core::error::AppError;
use serde::{Deserialize, Serialize};

mod prompts;

/// Declares whether retrieved context contributed to the answer. The
/// judgment is made by the model through the prompt's decision rule; the
/// pipeline never rewrites it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnswerMode {
    #[serde(rename = "context+reasoning")]
    ContextReasoning,
    #[serde(rename = "reasoning")]
    Reasoning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RagAnswer {
    pub mode: AnswerMode,
    pub answer: String,
}

/// The prompt template and the output schema as one versioned pairing.
/// Changing the schema means changing the rendered format instructions and
/// the parser together; nothing outside this type touches either half.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerContract;

impl AnswerContract {
    pub fn format_instructions(&self) -> &'static str {
        r#"Return a JSON object matching this schema:
{"properties": {"mode": {"description": "Either 'context+reasoning' or 'reasoning'", "type": "string"}, "answer": {"description": "The answer to the question", "type": "string"}}, "required": ["mode", "answer"]}"#
    }

    pub fn build_prompt(&self, context: &str, question: &str) -> String {
        prompts::answer_prompt(context, question, self.format_instructions())
    }

    pub fn repair_prompt(
        &self,
        context: &str,
        question: &str,
        previous_reply: &str,
        validation_error: &str,
    ) -> String {
        prompts::repair_prompt(
            context,
            question,
            self.format_instructions(),
            previous_reply,
            validation_error,
        )
    }

    /// Validate raw model output against the answer schema. A surrounding
    /// markdown code fence is tolerated; any content-level violation
    /// (non-JSON, missing field, unknown mode, blank answer) fails with
    /// the offending text attached for diagnosis. No repair, no coercion.
    pub fn parse(&self, raw: &str) -> Result<RagAnswer, AppError> {
        let body = strip_code_fence(raw.trim());
        let parsed: RagAnswer = serde_json::from_str(body).map_err(|e| {
            AppError::new("ANSWER_INVALID", "Model output did not match the answer schema")
                .with_details(format!("err={e}; raw={raw}"))
        })?;
        if parsed.answer.trim().is_empty() {
            return Err(AppError::new(
                "ANSWER_INVALID",
                "Model output answer field was empty",
            )
            .with_details(format!("raw={raw}")));
        }
        Ok(parsed)
    }
}

/// Drop a single surrounding ``` fence (with or without a language tag),
/// returning the inner body. Anything else passes through untouched.
fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let Some(body_start) = rest.find('\n') else {
        return s;
    };
    let body = &rest[body_start + 1..];
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => s,
    }
}

pub mod answer;
pub mod chunk;
pub mod context;
pub mod embed;
pub mod llm;
pub mod ollama;
pub mod pipeline;
pub mod retrieve;

#[cfg(test)]
mod tests {
    use super::answer::{AnswerContract, AnswerMode};
    use super::ollama::OllamaClient;

    #[test]
    fn base_url_must_be_a_plain_http_origin() {
        assert!(OllamaClient::new("http://127.0.0.1:11434").is_ok());
        assert!(OllamaClient::new("http://127.0.0.1:11434/").is_ok()); // trailing slash is trimmed
        assert!(OllamaClient::new("https://models.internal:8443").is_ok());

        assert!(OllamaClient::new("127.0.0.1:11434").is_err());
        assert!(OllamaClient::new("ftp://127.0.0.1").is_err());
        assert!(OllamaClient::new("http://").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:11434/api").is_err());
        assert!(OllamaClient::new("http://user@host:11434").is_err());
    }

    #[test]
    fn contract_prompt_and_parser_agree_on_mode_spelling() {
        let contract = AnswerContract;
        let prompt = contract.build_prompt("", "q");
        // The wire forms named in the prompt are exactly the ones the
        // parser accepts.
        assert!(prompt.contains(r#""mode" = "context+reasoning""#));
        assert!(prompt.contains(r#""mode" = "reasoning""#));
        let parsed = contract
            .parse(r#"{"mode":"context+reasoning","answer":"ok"}"#)
            .expect("parse");
        assert_eq!(parsed.mode, AnswerMode::ContextReasoning);
    }
}

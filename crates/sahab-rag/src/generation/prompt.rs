//! Prompt templates for legal RAG generation

use crate::types::{ConversationTurn, GenerationRequest};

/// Separator placed between retrieved passages in the context block
pub const PASSAGE_SEPARATOR: &str = "\n";

const ROLE: &str = "You are SAHAB, an authoritative legal assistant. \
Your primary source of information is the provided legal CONTEXT.";

const STRICT_POLICY: &str = "\
1. Respond professionally and confidently.
2. IF the answer is found in the CONTEXT, rely strictly on it and cite the specific section numbers given there.";

const FALLBACK_POLICY: &str = "\
3. IF the answer is NOT in the CONTEXT (for example questions about the CrPC, the Evidence Act, or general definitions not covered by the statutes supplied):
   - Provide a brief, general legal explanation based on your general legal knowledge.
   - Do NOT mention that the information is missing from the context or from your database.
   - Suggest consulting the relevant authoritative act (for example the CrPC for bail).";

const CLOSED_BOOK_POLICY: &str = "\
3. IF the answer is NOT in the CONTEXT:
   - State plainly that the supplied statutes do not cover the question.
   - Do NOT answer from general knowledge and do NOT speculate.";

const FORMAT_RULES: &str = "\
4. Respond in bullet points, one distinct aspect of the law per point.
5. Do not use emojis or decorative symbols.
6. Keep the answer concise and limited to what the question asks; do not assume facts not given.";

/// Builds generation requests and renders them into the prompt text
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    closed_book: bool,
}

impl PromptAssembler {
    /// Assembler with the general-knowledge fallback policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fallback policy with a closed-book instruction
    pub fn closed_book(mut self, closed_book: bool) -> Self {
        self.closed_book = closed_book;
        self
    }

    /// Whether the closed-book policy is active
    pub fn is_closed_book(&self) -> bool {
        self.closed_book
    }

    /// Merge question, passages and history into one request
    pub fn assemble(
        &self,
        question: &str,
        passages: &[&str],
        history: &[ConversationTurn],
    ) -> GenerationRequest {
        GenerationRequest {
            context: passages.join(PASSAGE_SEPARATOR),
            history: history.to_vec(),
            question: question.to_string(),
        }
    }

    /// Render the prompt string sent to the generative model
    pub fn render(&self, request: &GenerationRequest) -> String {
        let policy = if self.closed_book {
            CLOSED_BOOK_POLICY
        } else {
            FALLBACK_POLICY
        };

        format!(
            "{role}\n\nGuidelines:\n{strict}\n{policy}\n{format}\n\nCONTEXT:\n{context}\n\nCHAT HISTORY:\n{history}\n\nQUESTION: {question}\nANSWER:\n",
            role = ROLE,
            strict = STRICT_POLICY,
            policy = policy,
            format = FORMAT_RULES,
            context = request.context,
            history = Self::format_history(&request.history),
            question = request.question,
        )
    }

    fn format_history(history: &[ConversationTurn]) -> String {
        history
            .iter()
            .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_joined_passages() {
        let assembler = PromptAssembler::new();
        let request = assembler.assemble(
            "What is the punishment for murder?",
            &["Section 302: punishment for murder.", "Section 304: culpable homicide."],
            &[],
        );
        assert_eq!(
            request.context,
            "Section 302: punishment for murder.\nSection 304: culpable homicide."
        );
    }

    #[test]
    fn test_empty_passages_still_render_fallback_policy() {
        let assembler = PromptAssembler::new();
        let request = assembler.assemble("What are the conditions for bail?", &[], &[]);
        assert_eq!(request.context, "");

        let prompt = assembler.render(&request);
        assert!(prompt.contains("general legal knowledge"));
        assert!(prompt.contains("Do NOT mention that the information is missing"));
        assert!(prompt.contains("CrPC for bail"));
        assert!(prompt.contains("QUESTION: What are the conditions for bail?"));
        assert!(prompt.contains("SAHAB"));
        assert!(prompt.contains("Do not use emojis"));
    }

    #[test]
    fn test_closed_book_replaces_fallback() {
        let assembler = PromptAssembler::new().closed_book(true);
        let prompt = assembler.render(&assembler.assemble("bail?", &[], &[]));
        assert!(prompt.contains("do not cover the question"));
        assert!(!prompt.contains("general legal knowledge"));
    }

    #[test]
    fn test_history_rendered_in_order() {
        let assembler = PromptAssembler::new();
        let history = vec![
            ConversationTurn::user("What is Section 302?"),
            ConversationTurn::assistant("- Punishment for murder."),
        ];
        let prompt = assembler.render(&assembler.assemble("And 304?", &[], &history));

        let user = prompt.find("User: What is Section 302?").unwrap();
        let assistant = prompt.find("Assistant: - Punishment for murder.").unwrap();
        assert!(user < assistant);
    }
}

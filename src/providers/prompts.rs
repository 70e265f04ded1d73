//! Prompt templates
//!
//! Prompt text is data: each [`Instruction`] selects one template and the
//! context is substituted at the call site.

/// Placeholder replaced by the log text or digest
pub const LOG_CONTENT_PLACEHOLDER: &str = "{log_content}";
/// Placeholder replaced by the user question
pub const QUERY_PLACEHOLDER: &str = "{query}";

const SUMMARIZE_FRAGMENT: &str = "Summarize the key insights and critical errors from the following log chunk:
{log_content}
Focus on unique patterns, frequent errors, and actionable items.";

const SUMMARIZE_FINAL: &str = "The following are summaries of log file chunks:
{log_content}
Create a concise, high-level summary focusing on recurring patterns, critical issues, and actionable insights with detailed steps to resolve it.";

const ANSWER_QUERY: &str = "Analyze the following log file:
{log_content}
Respond to the user's query: {query}
Include any relevant details and actionable suggestions in your response.";

/// Which prompt shape a generation call uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    SummarizeFragment,
    SummarizeFinal,
    AnswerQuery { question: &'a str },
}

impl Instruction<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Instruction::SummarizeFragment => "summarize_fragment",
            Instruction::SummarizeFinal => "summarize_final",
            Instruction::AnswerQuery { .. } => "answer_query",
        }
    }
}

/// The three prompt templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub summarize_fragment: String,
    pub summarize_final: String,
    pub answer_query: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            summarize_fragment: SUMMARIZE_FRAGMENT.to_string(),
            summarize_final: SUMMARIZE_FINAL.to_string(),
            answer_query: ANSWER_QUERY.to_string(),
        }
    }
}

impl PromptSet {
    /// Render the template for `instruction` around `context`
    pub fn render(&self, instruction: Instruction<'_>, context: &str) -> String {
        match instruction {
            Instruction::SummarizeFragment => substitute(&self.summarize_fragment, context, None),
            Instruction::SummarizeFinal => substitute(&self.summarize_final, context, None),
            Instruction::AnswerQuery { question } => substitute(&self.answer_query, context, Some(question)),
        }
    }
}

// Context and question are inserted verbatim, never re-expanded.
fn substitute(template: &str, context: &str, question: Option<&str>) -> String {
    let fill = |part: &str| match question {
        Some(question) => part.replace(QUERY_PLACEHOLDER, question),
        None => part.to_string(),
    };

    match template.find(LOG_CONTENT_PLACEHOLDER) {
        Some(pos) => format!(
            "{}{}{}",
            fill(&template[..pos]),
            context,
            fill(&template[pos + LOG_CONTENT_PLACEHOLDER.len()..])
        ),
        None => fill(template),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fragment() {
        let prompts = PromptSet::default();
        let prompt = prompts.render(Instruction::SummarizeFragment, "ERROR 500: boom");

        assert!(prompt.contains("following log chunk:\nERROR 500: boom\nFocus"));
        assert!(!prompt.contains(LOG_CONTENT_PLACEHOLDER));
    }

    #[test]
    fn test_render_query() {
        let prompts = PromptSet::default();
        let prompt = prompts.render(
            Instruction::AnswerQuery { question: "Why {log_content}?" },
            "line with {query}",
        );

        assert!(prompt.contains("log file:\nline with {query}\n"));
        assert!(prompt.contains("Respond to the user's query: Why {log_content}?"));
    }
}

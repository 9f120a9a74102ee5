//! Prompt Composer: turns a task request into a system prompt plus chat turns.
//!
//! Every content task gets: role text, then the three style rules, then (for
//! JSON tasks) the JSON-only instruction with its key list. The assistant task
//! puts the caller's base prompt where the role text would go. Image
//! enhancement uses its own fixed instruction, since markup in its reply would
//! end up inside a URL.
//!
//! Pure: no I/O, no clock, no randomness.

use crate::generation::prompts::{
    BLOG_CODE_REQUEST, BLOG_CONTENT_NOTE, BLOG_DIAGRAM_REQUEST, BLOG_PROMPT_TEMPLATE,
    BLOG_REQUIRED_KEYS, BLOG_ROLE, IMAGE_ENHANCER_SYSTEM, QUIZ_PROMPT_TEMPLATE,
    QUIZ_QUESTION_COUNT, QUIZ_REQUIRED_KEYS, QUIZ_ROLE, QUIZ_SHAPE_NOTE, TUTOR_ROLE,
};
use crate::generation::request::{
    AssistantRequest, BlogRequest, GenerationRequest, ImageRequest, QuizRequest, TutorRequest,
};
use crate::llm_client::prompts::{required_keys_instruction, style_rules, JSON_OBJECT_ONLY};
use crate::models::conversation::{ChatMessage, ConversationHistory};

/// Output of composition: what the Completion Gateway sends.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    pub system_prompt: String,
    /// History (if any) followed by the new user turn.
    pub turns: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct PromptComposer {
    style_rules: String,
}

impl PromptComposer {
    pub fn new(image_origin: &str) -> Self {
        Self {
            style_rules: style_rules(image_origin),
        }
    }

    /// Entry point used by the orchestrators; the per-task methods below are its arms.
    pub fn compose(&self, request: &GenerationRequest) -> ComposedPrompt {
        match request {
            GenerationRequest::Blog(r) => self.blog(r),
            GenerationRequest::Tutor(r) => self.tutor(r),
            GenerationRequest::Assistant(r) => self.assistant(r),
            GenerationRequest::Quiz(r) => self.quiz(r),
            GenerationRequest::Image(r) => self.image(r),
        }
    }

    pub fn blog(&self, request: &BlogRequest) -> ComposedPrompt {
        let system_prompt = [
            BLOG_ROLE,
            self.style_rules.as_str(),
            JSON_OBJECT_ONLY,
            required_keys_instruction(&BLOG_REQUIRED_KEYS).as_str(),
            BLOG_CONTENT_NOTE,
        ]
        .join(" ");

        let mut user_prompt = BLOG_PROMPT_TEMPLATE
            .replace("{topic}", request.topic.trim())
            .replace("{difficulty}", request.difficulty.trim())
            .replace("{word_count}", &request.word_count.to_string());
        if request.include_code {
            user_prompt.push(' ');
            user_prompt.push_str(BLOG_CODE_REQUEST);
        }
        if request.include_diagrams {
            user_prompt.push(' ');
            user_prompt.push_str(BLOG_DIAGRAM_REQUEST);
        }

        ComposedPrompt {
            system_prompt,
            turns: vec![ChatMessage::user(user_prompt)],
        }
    }

    pub fn tutor(&self, request: &TutorRequest) -> ComposedPrompt {
        ComposedPrompt {
            system_prompt: format!("{TUTOR_ROLE} {}", self.style_rules),
            turns: with_new_turn(&request.history, &request.message),
        }
    }

    /// The caller's base prompt is kept verbatim; the style rules are appended after it.
    pub fn assistant(&self, request: &AssistantRequest) -> ComposedPrompt {
        ComposedPrompt {
            system_prompt: format!("{} {}", request.system_prompt.trim_end(), self.style_rules),
            turns: with_new_turn(&request.history, &request.message),
        }
    }

    pub fn quiz(&self, request: &QuizRequest) -> ComposedPrompt {
        let system_prompt = [
            QUIZ_ROLE,
            self.style_rules.as_str(),
            JSON_OBJECT_ONLY,
            required_keys_instruction(&QUIZ_REQUIRED_KEYS).as_str(),
            QUIZ_SHAPE_NOTE,
        ]
        .join(" ");

        let user_prompt = QUIZ_PROMPT_TEMPLATE
            .replace("{count}", &QUIZ_QUESTION_COUNT.to_string())
            .replace("{content}", request.content.trim());

        ComposedPrompt {
            system_prompt,
            turns: vec![ChatMessage::user(user_prompt)],
        }
    }

    pub fn image(&self, request: &ImageRequest) -> ComposedPrompt {
        ComposedPrompt {
            system_prompt: IMAGE_ENHANCER_SYSTEM.to_string(),
            turns: vec![ChatMessage::user(request.prompt.trim())],
        }
    }
}

fn with_new_turn(history: &ConversationHistory, message: &str) -> Vec<ChatMessage> {
    history
        .iter()
        .cloned()
        .chain(std::iter::once(ChatMessage::user(message)))
        .collect()
}

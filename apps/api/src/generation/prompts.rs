// All LLM prompt constants for the Generation module.
// Style rules and the JSON-only fragment come from llm_client::prompts.

/// Role text for blog generation.
pub const BLOG_ROLE: &str = "You are an expert technical blog writer.";

/// Keys the blog JSON object must carry, in the order they are requested.
pub const BLOG_REQUIRED_KEYS: [&str; 4] = ["title", "content", "seo_title", "seo_description"];

/// Extra note on the blog `content` field, appended after the key list.
pub const BLOG_CONTENT_NOTE: &str = "For 'content', use Markdown.";

/// Blog user prompt. Replace `{topic}`, `{difficulty}`, `{word_count}`.
pub const BLOG_PROMPT_TEMPLATE: &str = "Generate a comprehensive, engaging blog post about \
    {topic} at a {difficulty} level. It should be approximately {word_count} words long. \
    Structure the content clearly using point-wise lists (bullet points) for better readability.";

pub const BLOG_CODE_REQUEST: &str = "Include relevant Python code examples.";

pub const BLOG_DIAGRAM_REQUEST: &str = "Include Mermaid.js diagram code where appropriate.";

/// Role text for the tutoring chat.
pub const TUTOR_ROLE: &str = "You are an expert AI and Coding Tutor.";

/// Role text for quiz generation.
pub const QUIZ_ROLE: &str = "You are an expert educator who writes multiple choice quizzes.";

pub const QUIZ_REQUIRED_KEYS: [&str; 1] = ["questions"];

/// Number of questions requested per quiz.
pub const QUIZ_QUESTION_COUNT: usize = 3;

/// Options per quiz question, for both model output and the fallback.
pub const QUIZ_OPTION_COUNT: usize = 4;

/// Shape of one quiz question, appended after the key list.
pub const QUIZ_SHAPE_NOTE: &str = "'questions' is an array. Each element has 'question' \
    (string), 'options' (array of exactly 4 strings) and 'answer' (the correct option string, \
    copied exactly from 'options').";

/// Quiz user prompt. Replace `{count}` and `{content}`.
pub const QUIZ_PROMPT_TEMPLATE: &str =
    "Generate {count} multiple choice questions based on this content: {content}";

/// Fixed instruction for stage 1 of the image pipeline. The reply is embedded
/// in a URL path segment, so it must be short plain text.
pub const IMAGE_ENHANCER_SYSTEM: &str = "You are an AI image prompt enhancer. Enhance the \
    user's prompt to be highly detailed for an image generator. Output ONLY the enhanced prompt \
    text in English, without any markdown, quotes, or conversational text. Limit to 50 words.";

/// Base system prompt used by the assistant when the caller does not send one.
pub const DEFAULT_ASSISTANT_PROMPT: &str = "You are a helpful AI Assistant.";

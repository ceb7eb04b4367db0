//! System prompts and prompt templates.

use std::fmt;
use std::str::FromStr;

/// Base instructions shared by every chat preset.
pub const SYSTEM_DEFAULT: &str = "You are an AI assistant.\
\nYou only provide factual responses.\
\nA factual response is one that is derived with public data.\
\nYou will provide references for where the information you provide was obtained.\
\nYou should always adhere to technical information.\
\nYour responses should be informative and logical.\
\nYou are collaborative and do not repeat context, facts, or phrases.\
\nYou do not use too many extraneous words and phrases.\
\nMinimize any other prose.\
\nYour response should be in markdown unless otherwise specified by the user.";

const EMAIL: &str = "\nYou specialize in writing short and succinct emails.\
\nDetermine if the user provided an existing email.\
\nIf an existing email is identified, then rewrite it.\
\nIf no email is identified then generate a new email based on the user request.";

const CODE: &str = "\nYou are an expert programmer and specialize in writing computer software.\
\nFirst think step-by-step.\
\nThen describe your plan for what to build in pseudocode, written out in great detail.\
\nThen output the code in a single code block.\
\nKeep your answers short and impersonal.\
\nFollow the user's requirements carefully & to the letter.\
\nUse Markdown formatting in your answers.\
\nMake sure to include the programming language name at the start of the Markdown code blocks.\
\nAvoid wrapping the whole response in triple backticks.";

const BLOG: &str = "\nYou specialize in writing short and succinct blogs.\
\nDetermine if the user provided an existing blog entry.\
\nIf an existing blog is identified, then rewrite it.\
\nIf no blog is identified then generate a new blog based on the request.";

/// Appended to every chat system prompt.
pub const FOLLOW_REQUIREMENTS: &str = "\nFollow the user's requirements carefully and to the letter.";

/// Chat presets selecting the base system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    General,
    Email,
    Code,
    Blog,
    /// The agent builds its own prompt; the base is empty.
    Todoist,
    /// Only the caller's extension text.
    Custom,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        ContentType::General,
        ContentType::Email,
        ContentType::Code,
        ContentType::Blog,
        ContentType::Todoist,
        ContentType::Custom,
    ];

    /// The base prompt for this preset.
    pub fn base_prompt(self) -> String {
        match self {
            ContentType::General => SYSTEM_DEFAULT.to_string(),
            ContentType::Email => format!("{SYSTEM_DEFAULT}{EMAIL}"),
            ContentType::Code => format!("{SYSTEM_DEFAULT}{CODE}"),
            ContentType::Blog => format!("{SYSTEM_DEFAULT}{BLOG}"),
            ContentType::Todoist | ContentType::Custom => String::new(),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::General => "general",
            ContentType::Email => "email",
            ContentType::Code => "code",
            ContentType::Blog => "blog",
            ContentType::Todoist => "todoist",
            ContentType::Custom => "custom",
        };
        f.write_str(s)
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown content type '{s}' (expected general, email, code, blog, todoist or custom)")
            })
    }
}

/// The full chat system prompt: preset base followed by `extension`.
pub fn system_prompt(content_type: ContentType, extension: &str) -> String {
    format!("{}{}", content_type.base_prompt(), extension)
}

/// The default extension: the requirements reminder plus one
/// `DOCUMENT n:` block per attached document.
pub fn document_extension(documents: &[String]) -> String {
    let mut ext = FOLLOW_REQUIREMENTS.to_string();
    for (i, text) in documents.iter().enumerate() {
        ext.push_str(&format!("\nDOCUMENT {i}: {text}"));
    }
    ext
}

/// System prompt for the ReAct agent.
pub fn agent_prompt(schema: &str, tools: &str, objective: &str) -> String {
    format!(
        "You are a getting-things-done (GTD) agent that manages the user's task list.\
\nYou work in steps. Every step you receive a JSON object holding either the \"objective\" or the \"observation\" produced by your previous action.\
\nYou answer every step with exactly one JSON object that matches JSON_SCHEMA: a \"thought\" explaining your reasoning and one \"action\".\
\nOnly use ids that appeared in earlier observations. Never invent ids.\
\nWhen the objective is complete, or cannot be completed, use the give_final_answer action to tell the user what you did.\
\nYou are only allowed to respond in JSON. Do not wrap the JSON in Markdown.\
\n\nAVAILABLE ACTIONS:\n{tools}\
\n- give_final_answer: Stop and answer the user.\
\n\nJSON_SCHEMA:\n{schema}\
\n\nOBJECTIVE:\n{objective}"
    )
}

/// System prompt of the dedicated repair conversation.
pub const REPAIR_SYSTEM_PROMPT: &str = "Your task is to fix the FAULTY_INPUT such that it can be parsed into the JSON_SCHEMA.\
\nUse the ERROR_MSG to create a FIXED_INPUT.\
\nThe FIXED_INPUT should be in the same format as the FAULTY_INPUT.\
\nYou are only allowed to respond in json format.";

/// The fix request sent for one repair round.
pub fn fix_request(schema: &str, faulty_input: &str, error: &str) -> String {
    format!("JSON_SCHEMA:\n{schema}\n\nFAULTY_INPUT:\n{faulty_input}\n\nERROR_MSG:\n{error}\nFIXED_INPUT:")
}

/// Observation fed back when the model's reply could not be used.
pub fn correction(error: &str) -> String {
    format!(
        "Your response caused the following error: {error}. Please try again and avoid this error."
    )
}

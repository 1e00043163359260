//! Anthropic Claude API client for knowledge synthesis and the learner agent.
//!
//! Two jobs: reconstitute a finished chat log into the next generation of
//! knowledge, and produce the learner's replies during the explaining phase.
//! In both cases the model only sees the conversation, never the knowledge
//! entry itself. The drift between retellings is the game.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::db::{
    new_knowledge_id, new_session_tag, now_rfc3339, ChatMessage, ChatRole, Knowledge,
    CHATTING_TIME_SECS,
};
use crate::settings;

/// First JSON object embedded in a reply, fences already stripped.
static JSON_OBJECT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

/// Anthropic API message format
#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Anthropic API request format
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

/// Anthropic API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: String,
}

/// One learner chat bubble; `delay` is how long (ms) the client waits
/// before showing it. Pacing stays client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerMessage {
    pub text: String,
    #[serde(default = "default_delay")]
    pub delay: u64,
}

fn default_delay() -> u64 {
    800
}

/// Check if AI features are available (API key is set)
pub fn is_available() -> bool {
    settings::has_api_key()
}

/// POST a single-turn request and return the first content block's text.
async fn send_request(prompt: String, max_tokens: u32) -> Result<String, String> {
    let api_key = settings::get_api_key().ok_or("ANTHROPIC_API_KEY not set")?;

    let request = AnthropicRequest {
        model: settings::get_ai_model(),
        max_tokens,
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt,
        }],
    };

    let client = reqwest::Client::new();
    let response = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", &api_key)
        .header("anthropic-version", "2023-06-01")
        .header("content-type", "application/json")
        .json(&request)
        .send()
        .await
        .map_err(|e| format!("HTTP request failed: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("API error {}: {}", status, body));
    }

    let api_response: AnthropicResponse = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))?;

    // Track token usage
    if let Some(usage) = &api_response.usage {
        let _ = settings::add_token_usage(usage.input_tokens, usage.output_tokens);
    }

    Ok(api_response
        .content
        .first()
        .map(|c| c.text.clone())
        .unwrap_or_default())
}

/// Strip a markdown code fence the model sometimes wraps JSON in.
fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        trimmed
            .lines()
            .skip(1)
            .take_while(|l| !l.starts_with("```"))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        trimmed.to_string()
    }
}

// ==================== Knowledge Synthesis ====================

/// Reconstitute a finished chat log into the next generation of knowledge.
///
/// The prompt deliberately withholds the original entry: the model rebuilds
/// the knowledge from what was actually said, so every retelling drifts.
/// The result is NOT saved; callers persist it separately.
pub async fn synthesize_knowledge(
    original: &Knowledge,
    chat_log: &[ChatMessage],
) -> Result<Knowledge, String> {
    if chat_log.is_empty() {
        return Ok(silent_round_knowledge(original));
    }

    let chat_context = chat_log
        .iter()
        .map(|msg| {
            let speaker = match msg.role {
                ChatRole::Explainer => "Explainer",
                ChatRole::Learner => "Learner",
            };
            format!("{}: {}", speaker, msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        r#"You are creating a new piece of fictional knowledge based ONLY on a conversation you're about to read.

IMPORTANT CONTEXT:
- You do NOT know what the original knowledge was
- You must reconstruct the knowledge based SOLELY on what you can infer from the conversation
- The explainer was trying to explain some concept to the learner
- Your job is to create an encyclopedia entry about what YOU think was being discussed

===== CONVERSATION START =====
{}
===== CONVERSATION END =====

YOUR TASK:
Based ONLY on the conversation above, create a piece of knowledge that:
1. Directly uses the specific details, terms, and concepts mentioned in the conversation
2. Reflects what you understood from what was ACTUALLY SAID
3. Fills in gaps with creative interpretation based on conversation clues
4. Sounds like a legitimate encyclopedia entry

CRITICAL RULES:
- USE THE ACTUAL WORDS AND TERMS from the conversation
- If the explainer mentioned specific names, use those names
- If they described a process, describe that process
- If they gave examples, incorporate those examples
- DO NOT make up completely unrelated content

This is like the game "Telephone" - you're creating the "received" version of knowledge that was transmitted through conversation. The result should clearly be ABOUT what was discussed, even if some details are changed or misunderstood.

IMPORTANT:
- Keep the encyclopedia style
- The knowledge should be 2-3 paragraphs
- Create a title based on what was discussed
- Reference specific things mentioned in the conversation

You MUST respond in this EXACT JSON format (no other text, no markdown):
{{"title": "...", "description": "..."}}"#,
        chat_context
    );

    let reply = send_request(prompt, 1024).await?;
    knowledge_from_reply(&reply, original, chat_log)
}

/// Build the derived Knowledge from the raw model reply.
///
/// A reply that parses as a JSON object always yields knowledge, with
/// placeholders for missing fields; a reply containing no JSON object at
/// all is an error and nothing gets saved.
fn knowledge_from_reply(
    reply: &str,
    original: &Knowledge,
    chat_log: &[ChatMessage],
) -> Result<Knowledge, String> {
    let cleaned = strip_fences(reply);
    let object = JSON_OBJECT_RE
        .find(&cleaned)
        .map(|m| m.as_str())
        .unwrap_or(&cleaned);

    let parsed: serde_json::Value = serde_json::from_str(object)
        .map_err(|e| format!("Failed to parse model reply as JSON: {}", e))?;

    let title = parsed
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown Knowledge")
        .to_string();
    let description = parsed
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or("The retold knowledge could not be written down.")
        .to_string();

    Ok(Knowledge {
        id: new_knowledge_id(),
        title,
        category: original.category,
        description,
        parent_id: Some(original.id.clone()),
        generation: original.generation + 1,
        created_at: now_rfc3339(),
        created_by: new_session_tag(),
        chat_log: chat_log.to_vec(),
        times_shown: 0,
        children_count: 0,
    })
}

/// Fixed result for a round where the explainer never said anything.
/// Keeps the plain time-only id form, unlike synthesized entries.
fn silent_round_knowledge(original: &Knowledge) -> Knowledge {
    Knowledge {
        id: format!("gen-{}", chrono::Utc::now().timestamp_millis()),
        title: "Knowledge Passed in Silence".to_string(),
        category: original.category,
        description: "This knowledge was handed on without a real conversation.\n\n\
                      The explainer never spoke, so the learner had nothing to \
                      remember. Somewhere in the silence, the knowledge was lost."
            .to_string(),
        parent_id: Some(original.id.clone()),
        generation: original.generation + 1,
        created_at: now_rfc3339(),
        created_by: "session-empty".to_string(),
        chat_log: Vec::new(),
        times_shown: 0,
        children_count: 0,
    }
}

// ==================== Learner Agent ====================

/// Elapsed-time flavor for the learner prompt. The chatting window is 60 s;
/// the learner gets more anxious to wrap up as it runs out.
fn timing_context(elapsed_secs: Option<u64>) -> String {
    let Some(elapsed) = elapsed_secs else {
        return String::new();
    };
    let window = CHATTING_TIME_SECS as u64;
    if elapsed < window / 4 {
        format!(
            "\nTIMING CONTEXT: The round just started ({}s of {}s used).\n\
             - You are fresh and curious\n\
             - Greet briefly or dive straight into questions\n\
             - There is plenty of time to dig into details",
            elapsed, window
        )
    } else if elapsed < window * 2 / 3 {
        format!(
            "\nTIMING CONTEXT: The round is in full swing ({}s of {}s used).\n\
             - Stay focused on the explanation\n\
             - Ask about the parts you don't get yet\n\
             - Repeat key terms back to check you heard them right",
            elapsed, window
        )
    } else {
        format!(
            "\nTIMING CONTEXT: The round is almost over ({}s of {}s used).\n\
             - Time is running out, and you can feel it\n\
             - Push for the one thing you still don't understand\n\
             - Short urgent messages like \"wait, so what's the core bit?\"",
            elapsed, window
        )
    }
}

/// Produce the learner's next replies for the explaining phase.
///
/// The learner never sees the knowledge entry; everything it knows comes
/// from the explainer's messages. Returns one or more messages with
/// client-side display delays; an unparseable reply degrades to a single
/// truncated message rather than an error.
pub async fn learner_replies(
    message: &str,
    history: &[ChatMessage],
    elapsed_secs: Option<u64>,
) -> Result<Vec<LearnerMessage>, String> {
    let conversation_context = history
        .iter()
        .map(|msg| {
            let speaker = match msg.role {
                ChatRole::Explainer => "Them",
                ChatRole::Learner => "Me",
            };
            format!("{}: {}", speaker, msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let history_section = if conversation_context.is_empty() {
        String::new()
    } else {
        format!("Conversation so far:\n{}\n\n", conversation_context)
    };

    let prompt = format!(
        r#"You are pretending to be a real human in a chat on a knowledge-relay game website.

CONTEXT:
- A stranger has {chat_secs} seconds to explain a piece of fictional knowledge to you
- You have NOT read the knowledge yourself - everything you know comes from their messages
- After the round you must retell what you learned, so you genuinely want to understand

YOUR PERSONA:
- A curious, friendly player, quick to react
- You ask short clarifying questions and repeat terms back to check them
- Sometimes you mishear or half-understand - that's fine, keep going
- You never reveal that you are not human

CRITICAL CHAT STYLE:
- Send SHORT messages (1-20 words typically)
- React naturally: "oh", "wait", "huh", "the what now?", "got it"
- Sometimes use "..." for thinking
- DON'T write long paragraphs
- DON'T use brackets like [SYSTEM] or technical jargon

RESPONSE FORMAT:
You MUST respond with a JSON array of messages.
Include a "delay" field (in ms) for each message - the time to WAIT BEFORE showing it.

DELAY GUIDELINES:
- Short reactions ("oh", "wait"): 600-1200ms
- Medium messages: 1500-2500ms
- Longer/thoughtful messages: 2500-4000ms

MESSAGE COUNT:
- Often just 1 message
- Sometimes 2, occasionally 3
- Don't always split into multiple messages

Example - single response:
[
  {{"text": "so it's a kind of moss?", "delay": 1800}}
]

Example - quick reaction:
[
  {{"text": "wait", "delay": 800}},
  {{"text": "it does WHAT at night?", "delay": 2000}}
]

IMPORTANT:
- Always respond ONLY with a valid JSON array, nothing else
- Vary message count and delays naturally{timing}

{history}Them: {message}

Respond with JSON array only:"#,
        chat_secs = CHATTING_TIME_SECS,
        timing = timing_context(elapsed_secs),
        history = history_section,
        message = message
    );

    let reply = send_request(prompt, 512).await?;
    Ok(parse_learner_reply(&reply))
}

/// Parse the learner reply; a malformed reply becomes one plain message.
fn parse_learner_reply(reply: &str) -> Vec<LearnerMessage> {
    let cleaned = strip_fences(reply);
    match serde_json::from_str::<Vec<LearnerMessage>>(&cleaned) {
        Ok(messages) => messages,
        Err(_) => vec![LearnerMessage {
            text: cleaned.chars().take(100).collect(),
            delay: default_delay(),
        }],
    }
}

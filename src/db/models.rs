use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Science,
    Art,
    History,
    Nature,
    Philosophy,
    Misc,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Science => "science",
            Category::Art => "art",
            Category::History => "history",
            Category::Nature => "nature",
            Category::Philosophy => "philosophy",
            Category::Misc => "misc",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "science" => Some(Category::Science),
            "art" => Some(Category::Art),
            "history" => Some(Category::History),
            "nature" => Some(Category::Nature),
            "philosophy" => Some(Category::Philosophy),
            "misc" => Some(Category::Misc),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Science => "🔬",
            Category::Art => "🎨",
            Category::History => "🌍",
            Category::Nature => "🧬",
            Category::Philosophy => "🔮",
            Category::Misc => "🎲",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Science => "Science & Technology",
            Category::Art => "Art & Culture",
            Category::History => "History & Geography",
            Category::Nature => "Life & Nature",
            Category::Philosophy => "Philosophy & Concepts",
            Category::Misc => "Miscellany",
        }
    }
}

/// Speaker in a game round. Wire values are "explainer"/"learner";
/// the legacy "user"/"bot" strings are accepted on input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    #[serde(alias = "user")]
    Explainer,
    #[serde(alias = "bot")]
    Learner,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::Explainer => "explainer",
            ChatRole::Learner => "learner",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: i64, // epoch millis
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Knowledge {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub description: String,

    // Lineage
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>, // null marks a seed; never validated against the store
    pub generation: i32, // 0 = seed, else parent generation + 1

    // Provenance
    #[serde(rename = "createdAt")]
    pub created_at: String, // RFC 3339, immutable
    #[serde(rename = "createdBy")]
    pub created_by: String, // session tag
    #[serde(rename = "chatLog", default)]
    pub chat_log: Vec<ChatMessage>, // set once at creation; empty for seeds

    // Counters
    #[serde(rename = "timesShown", default)]
    pub times_shown: i32, // bumped each time a seed is dealt to a round
    #[serde(rename = "childrenCount", default)]
    pub children_count: i32, // cached; bumped once per fresh child insert
}

// Round timing, shared with clients so both sides agree on the clock
pub const READING_TIME_SECS: u32 = 20;
pub const CHATTING_TIME_SECS: u32 = 60;

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Fresh derived-knowledge id: time prefix plus a random base36 suffix.
pub fn new_knowledge_id() -> String {
    format!(
        "gen-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        random_suffix(ID_SUFFIX_LEN)
    )
}

/// Opaque per-round session tag used for `createdBy`.
pub fn new_session_tag() -> String {
    format!("session-{}", random_suffix(ID_SUFFIX_LEN))
}

/// Current time as an RFC 3339 string, the `createdAt` format.
pub fn now_rfc3339() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

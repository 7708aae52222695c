// src/services/notifier.rs

//! Outbound notifications for newly enriched postings.
//!
//! Messages use Telegram's legacy Markdown. Delivery is best effort: the
//! caller logs a failed send and moves on.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Locations, NotifierConfig, StructuredPosting};
use crate::utils::{truncate_utf16, utf16_len};

/// Telegram's limit on message length, in UTF-16 units.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// A single outbound channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Build the notifier described by `config`.
pub fn build_notifier(config: &NotifierConfig, client: reqwest::Client) -> Arc<dyn Notifier> {
    if config.enabled {
        Arc::new(TelegramNotifier::new(config, client))
    } else {
        log::info!("Notifier disabled, messages will only be logged");
        Arc::new(LogNotifier)
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends to one Telegram chat or channel through the Bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    channel_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &NotifierConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            channel_id: config.channel_id.clone(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SendMessage {
                chat_id: &self.channel_id,
                text,
                parse_mode: "Markdown",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!("{status}: {body}")));
        }

        let reply: TelegramResponse = response.json().await?;
        if !reply.ok {
            return Err(AppError::notify(
                reply.description.unwrap_or_else(|| "ok: false".into()),
            ));
        }
        Ok(())
    }
}

/// Writes messages to the log instead of sending them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        log::info!("Notification:\n{}", text);
        Ok(())
    }
}

/// Render a posting with the fixed message template.
///
/// If the message exceeds [`MAX_MESSAGE_LEN`] the summary is shortened
/// first; only if that is not enough is the message itself cut. Cuts always
/// fall between grapheme clusters.
pub fn render_message(posting: &StructuredPosting) -> String {
    let full = compose(posting, &posting.summary);
    let excess = utf16_len(&full).saturating_sub(MAX_MESSAGE_LEN);
    if excess == 0 {
        return full;
    }

    let mut budget = utf16_len(&posting.summary).saturating_sub(excess);
    loop {
        let message = compose(posting, &truncate_utf16(&posting.summary, budget));
        let excess = utf16_len(&message).saturating_sub(MAX_MESSAGE_LEN);
        if excess == 0 {
            return message;
        }
        if budget == 0 {
            return truncate_utf16(&message, MAX_MESSAGE_LEN);
        }
        budget = budget.saturating_sub(excess);
    }
}

fn compose(posting: &StructuredPosting, summary: &str) -> String {
    let location = match &posting.locations {
        Locations::Any => "Any".to_string(),
        Locations::Named(names) => names.join(", "),
    };
    let education = if posting.education_fields.is_empty() {
        posting.education_degree.to_string()
    } else {
        format!(
            "{} in {}",
            posting.education_degree,
            posting.education_fields.join(", ")
        )
    };

    [
        format!("{} at {}", bold(&posting.position), bold(&posting.company)),
        String::new(),
        format!("*Location:* {}", escape_markdown(&location)),
        format!("*Gender:* {}", posting.gender),
        format!("*Remaining Days:* {} Days", posting.remaining_days),
        format!("*Duration:* {}", escape_markdown(&posting.duration)),
        format!("*Education:* {}", escape_markdown(&education)),
        format!("*Experience:* {}", escape_markdown(&posting.experience_years)),
        format!(
            "*English Required:* {}",
            if posting.english_required { "Yes" } else { "No" }
        ),
        String::new(),
        "*Summary:*".to_string(),
        escape_markdown(summary),
        String::new(),
        "*Required Skills:*".to_string(),
        skill_lines(&posting.skills_required),
        String::new(),
        "*Optional Skills:*".to_string(),
        skill_lines(&posting.skills_optional),
        format!("*Link:* {}", posting.url),
    ]
    .join("\n")
}

fn skill_lines(skills: &[String]) -> String {
    skills
        .iter()
        .map(|s| format!("- #{}", escape_markdown(s)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap `text` in a bold entity.
///
/// Legacy Markdown has no escapes inside an entity, so a literal `*` closes
/// the entity, is escaped outside it, and a new entity is opened.
fn bold(text: &str) -> String {
    text.split('*')
        .map(|part| {
            if part.is_empty() {
                String::new()
            } else {
                format!("*{part}*")
            }
        })
        .collect::<Vec<_>>()
        .join(r"\*")
}

/// Escape the characters legacy Markdown treats as entity markers.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EducationDegree, Gender};

    fn posting() -> StructuredPosting {
        StructuredPosting {
            position: "Backend Developer".into(),
            company: "Acme_Tech".into(),
            remaining_days: 12,
            gender: Gender::Any,
            locations: Locations::Named(vec!["Kabul".into(), "Herat".into()]),
            summary: "Builds and runs APIs.".into(),
            duration: "1 year".into(),
            education_degree: EducationDegree::Bachelor,
            education_fields: vec!["Computer Science".into()],
            experience_years: "2 years".into(),
            english_required: true,
            skills_required: vec!["rust".into(), "react_native".into()],
            skills_optional: vec!["docker".into(), "kubernetes".into()],
            url: "https://jobs.example/jobs/backend-developer".into(),
        }
    }

    #[test]
    fn test_render_message_template() {
        let text = render_message(&posting());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "*Backend Developer* at *Acme_Tech*");
        assert!(text.contains("*Location:* Kabul, Herat"));
        assert!(text.contains("*Gender:* Any"));
        assert!(text.contains("*Remaining Days:* 12 Days"));
        assert!(text.contains("*Education:* Bachelor in Computer Science"));
        assert!(text.contains("*English Required:* Yes"));
        assert!(text.contains("- #rust\n- #react\\_native"));
        assert_eq!(
            lines.last().copied(),
            Some("*Link:* https://jobs.example/jobs/backend-developer")
        );
    }

    #[test]
    fn test_render_any_location_and_no_fields() {
        let mut p = posting();
        p.locations = Locations::Any;
        p.education_fields.clear();
        p.english_required = false;

        let text = render_message(&p);
        assert!(text.contains("*Location:* Any\n"));
        assert!(text.contains("*Education:* Bachelor\n"));
        assert!(text.contains("*English Required:* No"));
    }

    #[test]
    fn test_long_summary_is_shortened() {
        let mut p = posting();
        p.summary = "word ".repeat(2000);

        let text = render_message(&p);
        assert!(utf16_len(&text) <= MAX_MESSAGE_LEN);
        assert!(text.contains('…'));
        assert!(text.ends_with("*Link:* https://jobs.example/jobs/backend-developer"));
    }

    #[test]
    fn test_bold_reopens_around_asterisk() {
        let mut p = posting();
        p.position = "C* Developer".into();
        p.company = "*Star* Labs".into();

        let text = render_message(&p);
        let header = text.lines().next().unwrap();
        assert_eq!(header, r"*C*\** Developer* at \**Star*\** Labs*");
        // every unescaped marker is paired
        let unescaped = header.replace(r"\*", "");
        assert_eq!(unescaped.matches('*').count() % 2, 0);
    }

    #[test]
    fn test_summary_budget_counts_utf16_units() {
        let mut p = posting();
        p.summary = "e\u{301}".repeat(5000);

        let text = render_message(&p);
        assert!(text.encode_utf16().count() <= MAX_MESSAGE_LEN);
        assert!(text.contains('…'));
        assert!(!text.contains("…\u{301}"));
        assert!(text.ends_with("*Link:* https://jobs.example/jobs/backend-developer"));
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a_b*c`d[e]"), r"a\_b\*c\`d\[e]");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[tokio::test]
    async fn test_build_notifier_disabled_logs() {
        let notifier = build_notifier(&NotifierConfig::default(), reqwest::Client::new());
        assert!(notifier.send("hello").await.is_ok());
    }

    #[test]
    fn test_telegram_endpoint() {
        let config = NotifierConfig {
            enabled: true,
            api_base: "https://api.telegram.org/".into(),
            bot_token: "123:abc".into(),
            channel_id: "@jobs".into(),
        };
        let notifier = TelegramNotifier::new(&config, reqwest::Client::new());
        assert_eq!(
            notifier.endpoint,
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }
}

use crate::config::ReplyConfig;

/// Maximum characters in a single platform message.
pub const PLATFORM_MAX_LENGTH: usize = 2000;
pub const SAFETY_MARGIN: usize = 10;
pub const ELLIPSIS: &str = "...";

/// Turns raw search text into a reply that fits in one message.
///
/// Lengths are counted in characters. Truncation is a plain prefix cut and
/// does not look for word or sentence boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseFormatter {
    signature: String,
    max_length: usize,
}

impl ResponseFormatter {
    pub fn new(signature: impl Into<String>) -> Self {
        Self { signature: signature.into(), max_length: PLATFORM_MAX_LENGTH }
    }

    pub fn from_config(config: &ReplyConfig) -> Self {
        Self::new(config.signature.clone())
    }

    pub fn format(&self, raw_text: &str, is_direct_message: bool) -> String {
        let footer = if is_direct_message { self.signature.as_str() } else { "" };
        let max_body = self
            .max_length
            .saturating_sub(footer.chars().count())
            .saturating_sub(SAFETY_MARGIN);

        let mut reply = if raw_text.chars().count() > max_body {
            let mut body: String = raw_text.chars().take(max_body).collect();
            body.push_str(ELLIPSIS);
            body
        } else {
            raw_text.to_owned()
        };
        reply.push_str(footer);

        // only reachable when the signature alone nearly fills a message
        if reply.chars().count() > self.max_length {
            reply = reply.chars().take(self.max_length).collect();
        }

        reply
    }
}

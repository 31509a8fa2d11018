//! Interpretation of the chat-completion reply.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::DeobfuscateError;

const FENCE: &str = "```";
/// Checked in order, first match wins.
const OPENING_FENCES: [&str; 3] = ["```javascript", "```js", FENCE];

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    choices: Vec<Choice>,
}

/// Returns the first choice's content of a successful reply.
///
/// # Errors
///
/// - `Api` for a non-success status with a `{code, message, data}` body
/// - `ApiStatus` for a non-success status with any other body
/// - `InvalidResponse` if a success body is not a completion
/// - `EmptyResponse` if the completion carries no choices
pub fn parse_response(body: &[u8], status: u16) -> Result<String, DeobfuscateError> {
    if !(200..300).contains(&status) {
        return Err(match serde_json::from_slice::<ApiErrorBody>(body) {
            Ok(err) => {
                warn!("API returned code {} ({})", err.code, err.message);
                DeobfuscateError::Api {
                    code: err.code,
                    message: err.message,
                    data: err.data,
                }
            }
            Err(_) => DeobfuscateError::ApiStatus {
                status,
                body: String::from_utf8_lossy(body).into_owned(),
            },
        });
    }

    let completion: CompletionBody = serde_json::from_slice(body).map_err(|e| {
        DeobfuscateError::InvalidResponse(format!(
            "{e}, body: {}",
            String::from_utf8_lossy(body)
        ))
    })?;

    debug!("Completion carried {} choice(s)", completion.choices.len());

    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or(DeobfuscateError::EmptyResponse)
}

/// Strips one leading fence marker, one trailing fence and surrounding whitespace.
#[must_use]
pub fn clean_output(text: &str) -> String {
    let text = text.trim();
    let text = OPENING_FENCES
        .iter()
        .find_map(|fence| text.strip_prefix(fence))
        .unwrap_or(text);
    let text = text.strip_suffix(FENCE).unwrap_or(text);
    text.trim().to_string()
}

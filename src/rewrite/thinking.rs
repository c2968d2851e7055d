//! Extended-thinking body rewriting for Claude model-name suffixes.
//!
//! Model name pattern: `*-thinking-NUMBER` → custom token budget, e.g.
//! `claude-sonnet-4-5-20250929-thinking-5000` → a 5,000-token budget. The
//! suffix is stripped from `model` and a structured `thinking` field is
//! added to the JSON body before forwarding to the backend.
//!
//! # Responsibilities
//! - Detect the rightmost `-thinking-NUMBER` suffix on `claude-*` and
//!   `gemini-claude-*` models
//! - Clamp the budget and raise `max_tokens`/`max_output_tokens` so the
//!   output ceiling always exceeds the thinking budget
//! - Report whether the `anthropic-beta` header must carry the interleaved
//!   thinking flag
//!
//! # Design Decisions
//! - Invalid JSON or a missing `model` field is non-fatal: the original body
//!   is forwarded byte-identical
//! - `gemini-claude-*` models keep their trailing `-thinking` token; only the
//!   numeric part and its dash are stripped
//! - An already-clean alias that still contains "thinking" gets the beta
//!   header but an untouched body

use serde_json::{json, Value};

/// Upper bound on any thinking budget. Budgets at or above this are clamped
/// to one below it so the output ceiling can still exceed them.
pub const HARD_TOKEN_CAP: i64 = 32_000;

/// Minimum extra output allowance above the thinking budget.
pub const MINIMUM_HEADROOM: i64 = 1_024;

/// Fraction of the budget granted as extra output allowance.
pub const HEADROOM_RATIO: f64 = 0.1;

/// Beta flag enabling interleaved thinking upstream.
pub const INTERLEAVED_THINKING_BETA: &str = "interleaved-thinking-2025-05-14";

/// Marker separating the model name from the budget suffix.
const THINKING_MARKER: &str = "-thinking-";

/// Outcome of a body rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRewrite {
    /// The (possibly re-serialized) body to forward.
    pub body: Vec<u8>,
    /// Whether the forwarded request must carry the interleaved thinking beta flag.
    pub enable_beta: bool,
}

/// Rewrite a JSON request body according to the model-name thinking suffix.
///
/// Returns `None` when no transformation applies at all, in which case the
/// caller forwards the original body bytes untouched.
pub fn rewrite_thinking_body(body: &[u8]) -> Option<BodyRewrite> {
    let mut root: Value = serde_json::from_slice(body).ok()?;
    let model = root.get("model")?.as_str()?.to_string();

    // Only Claude models (including gemini-claude variants) are touched.
    if !model.starts_with("claude-") && !model.starts_with("gemini-claude-") {
        return None;
    }

    // Rightmost -thinking- occurrence with at least one character after it.
    let marker_pos = model
        .rfind(THINKING_MARKER)
        .filter(|pos| pos + THINKING_MARKER.len() < model.len());

    let Some(pos) = marker_pos else {
        if model.contains("thinking") {
            // Already-clean thinking alias (e.g. gemini-claude-opus-4-5-thinking):
            // enable the beta header but leave the body alone.
            tracing::debug!(%model, "Thinking model without budget suffix, enabling beta header");
            return Some(BodyRewrite {
                body: body.to_vec(),
                enable_beta: true,
            });
        }
        return None;
    };

    let budget_str = &model[pos + THINKING_MARKER.len()..];

    // gemini-claude-* keeps the trailing "-thinking" token; everything else
    // loses the suffix from the marker onward.
    let clean_model = if model.starts_with("gemini-claude-") {
        model[..pos + THINKING_MARKER.len() - 1].to_string()
    } else {
        model[..pos].to_string()
    };

    let object = root.as_object_mut()?;
    object.insert("model".to_string(), Value::String(clean_model.clone()));

    match budget_str.parse::<i64>() {
        Ok(budget) if budget > 0 => {
            let effective_budget = budget.min(HARD_TOKEN_CAP - 1);
            if effective_budget != budget {
                tracing::debug!(
                    requested = budget,
                    effective = effective_budget,
                    "Clamped thinking budget to stay within limits"
                );
            }

            object.insert(
                "thinking".to_string(),
                json!({ "type": "enabled", "budget_tokens": effective_budget }),
            );

            // The backend requires max output tokens strictly above the budget.
            let headroom = MINIMUM_HEADROOM.max((effective_budget as f64 * HEADROOM_RATIO) as i64);
            let mut required_max = (effective_budget + headroom).min(HARD_TOKEN_CAP);
            if required_max <= effective_budget {
                required_max = (effective_budget + 1).min(HARD_TOKEN_CAP);
            }

            let has_max_output_field = object.contains_key("max_output_tokens");
            let mut adjusted = false;

            if let Some(current) = object.get("max_tokens").and_then(Value::as_i64) {
                if current <= effective_budget {
                    object.insert("max_tokens".to_string(), json!(required_max));
                }
                adjusted = true;
            }

            if let Some(current) = object.get("max_output_tokens").and_then(Value::as_i64) {
                if current <= effective_budget {
                    object.insert("max_output_tokens".to_string(), json!(required_max));
                }
                adjusted = true;
            }

            if !adjusted {
                if has_max_output_field {
                    object.insert("max_output_tokens".to_string(), json!(required_max));
                } else {
                    object.insert("max_tokens".to_string(), json!(required_max));
                }
            }

            tracing::debug!(
                original_model = %model,
                clean_model = %clean_model,
                budget_tokens = effective_budget,
                "Transformed model with thinking budget"
            );

            Some(BodyRewrite {
                body: serde_json::to_vec(&root).ok()?,
                enable_beta: true,
            })
        }
        _ => {
            // Invalid budget: strip the suffix, nothing else changes.
            tracing::debug!(
                original_model = %model,
                clean_model = %clean_model,
                "Stripped invalid thinking suffix (no thinking enabled)"
            );
            Some(BodyRewrite {
                body: serde_json::to_vec(&root).ok()?,
                enable_beta: false,
            })
        }
    }
}

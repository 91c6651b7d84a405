//! Cost estimation from token counts
//!
//! Prices are per 1000 tokens, keyed by model-name substring. Entries are
//! checked in order and the first match wins, so more specific names come
//! before their prefixes (gpt-4-turbo before gpt-4). Token counts are split
//! heuristically 70% input / 30% output.

/// Per-1k-token pricing for one model family.
struct ModelPricing {
    pattern: &'static str,
    input_per_1k: f64,
    output_per_1k: f64,
}

/// Approximate prices as of 2025.
const PRICING_TABLE: &[ModelPricing] = &[
    ModelPricing {
        pattern: "gpt-4-turbo",
        input_per_1k: 0.01,
        output_per_1k: 0.03,
    },
    ModelPricing {
        pattern: "gpt-4",
        input_per_1k: 0.03,
        output_per_1k: 0.06,
    },
    ModelPricing {
        pattern: "gpt-3.5-turbo",
        input_per_1k: 0.0005,
        output_per_1k: 0.0015,
    },
    ModelPricing {
        pattern: "claude-3-opus",
        input_per_1k: 0.015,
        output_per_1k: 0.075,
    },
    ModelPricing {
        pattern: "claude-3-sonnet",
        input_per_1k: 0.003,
        output_per_1k: 0.015,
    },
    ModelPricing {
        pattern: "claude-3-haiku",
        input_per_1k: 0.000_25,
        output_per_1k: 0.001_25,
    },
    ModelPricing {
        pattern: "gemini-ultra",
        input_per_1k: 0.001,
        output_per_1k: 0.002,
    },
    ModelPricing {
        pattern: "gemini-pro",
        input_per_1k: 0.000_25,
        output_per_1k: 0.0005,
    },
];

/// Flat per-1k rate used when no table entry matches.
const DEFAULT_RATE_PER_1K: f64 = 0.002;

/// Estimate the cost in USD of a call that consumed `tokens` tokens.
pub fn estimate_cost(tokens: u32, model: &str) -> f64 {
    let model_lower = model.to_lowercase();
    let tokens = f64::from(tokens);

    for pricing in PRICING_TABLE {
        if model_lower.contains(pricing.pattern) {
            let input_tokens = tokens * 0.7;
            let output_tokens = tokens * 0.3;
            return input_tokens * pricing.input_per_1k / 1000.0
                + output_tokens * pricing.output_per_1k / 1000.0;
        }
    }

    tokens * DEFAULT_RATE_PER_1K / 1000.0
}

/// Whitespace-token approximation for backends that omit usage metadata.
/// A rough stand-in, not a metering guarantee.
pub fn approximate_tokens(reply: &str, diff: &str) -> u32 {
    let count = reply.split_whitespace().count() + diff.split_whitespace().count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

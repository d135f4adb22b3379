use serde::Serialize;

/// USD per 1000 prompt tokens.
pub const INPUT_COST_PER_1K: f64 = 0.0050;
/// USD per 1000 completion tokens.
pub const OUTPUT_COST_PER_1K: f64 = 0.0150;

/// Rough token and cost figures for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageEstimate {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

impl UsageEstimate {
    /// Whitespace-separated words stand in for tokens.
    pub fn estimate(input_text: &str, output_text: &str) -> Self {
        let input_tokens = count_tokens(input_text);
        let output_tokens = count_tokens(output_text);

        let input_cost = input_tokens as f64 / 1000.0 * INPUT_COST_PER_1K;
        let output_cost = output_tokens as f64 / 1000.0 * OUTPUT_COST_PER_1K;

        Self {
            input_tokens,
            output_tokens,
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
        }
    }
}

pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// USD per token, as (model, input price, output price).
///
/// Unknown models cost 0. That is a placeholder until real pricing for other
/// models is agreed, not a free tier.
const PRICE_TABLE: &[(&str, f64, f64)] = &[
    ("gpt-4o", 0.000005, 0.000015),
    ("gpt-4o-2024-08-06", 0.000005, 0.000015),
    ("gpt-4-turbo", 0.00001, 0.00003),
    ("gpt-4-turbo-preview", 0.00001, 0.00003),
    ("gpt-3.5-turbo", 0.0000005, 0.0000015),
];

/// Price of one generation call.
pub fn estimate_cost(model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
    PRICE_TABLE
        .iter()
        .find(|(name, _, _)| *name == model)
        .map(|(_, input, output)| {
            prompt_tokens as f64 * input + completion_tokens as f64 * output
        })
        .unwrap_or_else(|| {
            tracing::warn!(model, "No price configured for model, recording cost as 0");
            0.0
        })
}

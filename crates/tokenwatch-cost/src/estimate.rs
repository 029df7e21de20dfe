// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-call cost estimation and cross-model comparison.

use serde::Serialize;
use thiserror::Error;

use crate::pricing::PricingTable;

/// Estimated cost of a hypothetical call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub model: String,
    pub provider: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub estimated_cost_usd: f64,
    pub input_rate_per_1m: f64,
    pub output_rate_per_1m: f64,
}

/// Returned by [`estimate_cost`] for a model missing from the pricing table.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("unknown model: {model}")]
pub struct UnknownModel {
    pub model: String,
}

/// Cost of the same call on one model, as listed by [`compare_models`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelCost {
    pub model: String,
    pub provider: String,
    pub cost_usd: f64,
    pub input_rate_per_1m: f64,
    pub output_rate_per_1m: f64,
}

pub fn estimate_cost(
    table: &PricingTable,
    model: &str,
    input_tokens: i64,
    output_tokens: i64,
) -> Result<CostEstimate, UnknownModel> {
    let pricing = table.get(model).ok_or_else(|| UnknownModel {
        model: model.to_string(),
    })?;
    Ok(CostEstimate {
        model: pricing.name.clone(),
        provider: pricing.provider.clone(),
        input_tokens,
        output_tokens,
        estimated_cost_usd: pricing.rounded_cost(input_tokens, output_tokens),
        input_rate_per_1m: pricing.input_per_mtok,
        output_rate_per_1m: pricing.output_per_mtok,
    })
}

/// Every priced model, cheapest first. Equal costs keep table order.
pub fn compare_models(table: &PricingTable, input_tokens: i64, output_tokens: i64) -> Vec<ModelCost> {
    let mut costs: Vec<ModelCost> = table
        .iter()
        .map(|pricing| ModelCost {
            model: pricing.name.clone(),
            provider: pricing.provider.clone(),
            cost_usd: pricing.rounded_cost(input_tokens, output_tokens),
            input_rate_per_1m: pricing.input_per_mtok,
            output_rate_per_1m: pricing.output_per_mtok,
        })
        .collect();
    costs.sort_by(|a, b| a.cost_usd.total_cmp(&b.cost_usd));
    costs
}

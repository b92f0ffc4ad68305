use eyre::Result;
use serde::Serialize;

use super::Context;
use crate::ledger::DeploymentRecord;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSummary {
    pub success: bool,
    pub ledger: String,
    pub count: usize,
    pub deployments: Vec<DeploymentRecord>,
}

/// Every ledger entry, ordered by address
pub fn run(ctx: &Context) -> Result<ListSummary> {
    let deployments: Vec<_> = ctx.ledger.read()?.into_values().collect();

    Ok(ListSummary {
        success: true,
        ledger: ctx.ledger.path().display().to_string(),
        count: deployments.len(),
        deployments,
    })
}

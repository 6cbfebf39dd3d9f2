use anyhow::Result;

use crate::config::{initialize_app_state, AppConfig};
use crate::helpers::converters::status_to_dto;

/// Prints the status of one budget as pretty JSON.
pub async fn budget_status(config: &AppConfig, budget_id: i32) -> Result<()> {
    let state = initialize_app_state(config).await?;
    let status = state.engine.get_budget_status(budget_id).await?;

    println!("{}", serde_json::to_string_pretty(&status_to_dto(status))?);
    Ok(())
}

use anyhow::Result;
use tracing::{info, warn};

use crate::config::{initialize_app_state, AppConfig};

/// Recomputes every budget of a family and prints a summary line.
pub async fn recalculate(config: &AppConfig, family_id: i32) -> Result<()> {
    let state = initialize_app_state(config).await?;
    let summary = state.engine.recalculate_all(family_id).await?;

    if summary.failed > 0 {
        warn!("{} budgets of family {} could not be recalculated", summary.failed, family_id);
    }
    info!("Recalculation of family {} finished", family_id);

    println!(
        "checked: {}, rewritten: {}, failed: {}",
        summary.checked, summary.rewritten, summary.failed
    );
    Ok(())
}

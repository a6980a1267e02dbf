//! Background scheduled tasks for the application.
//!
//! Currently only the stock reconciliation check. Call `spawn_all` once during startup.

use crate::services::ReconcileService;

/// Spawn all background tasks.
///
/// `reconcile_interval_secs == 0` disables the reconciliation loop.
pub fn spawn_all(reconcile_service: ReconcileService, reconcile_interval_secs: u64) {
    // 定期对账: total - remaining 与中奖记录数不一致时告警, 由人工处理
    if reconcile_interval_secs > 0 {
        let svc = reconcile_service.clone();
        tokio::spawn(async move {
            let interval = std::time::Duration::from_secs(reconcile_interval_secs);
            loop {
                tokio::time::sleep(interval).await;
                match svc.report().await {
                    Ok(report) if report.is_consistent() => {
                        log::debug!(
                            "Stock reconciliation ok: {} prizes, {} allocations",
                            report.prizes_checked,
                            report.allocations_checked
                        );
                    }
                    Ok(report) => {
                        for d in &report.discrepancies {
                            log::error!(
                                "reconciliation: prize {} expected {} allocations, recorded {} (unknown prize: {})",
                                d.prize_id,
                                d.expected_allocated,
                                d.recorded,
                                d.unknown_prize
                            );
                        }
                    }
                    Err(e) => log::error!("Failed to run stock reconciliation: {e:?}"),
                }
            }
        });
    }
}

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use estate_api::AppStateInner;

/// Background task that prunes expired sessions.
///
/// Expired rows are already rejected by the auth middleware; this only keeps
/// the `sessions` table from growing without bound.
pub async fn run_cleanup_loop(state: Arc<AppStateInner>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let db_state = state.clone();
        let result = tokio::task::spawn_blocking(move || db_state.db.prune_expired_sessions()).await;
        match result {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Cleanup: pruned {} expired sessions", count);
                }
            }
            Ok(Err(e)) => warn!("Cleanup error: {}", e),
            Err(e) => warn!("Cleanup task join error: {}", e),
        }
    }
}

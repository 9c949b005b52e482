//! Match reward delivery.

use crate::services::collaborators::SharedLedger;

/// Credit a finished match's reward. Runs detached: a ledger failure is
/// logged and swallowed so it can never stall or kill a session.
pub fn report_match_reward(ledger: SharedLedger, user_id: String, amount: u32) {
    actix_web::rt::spawn(async move {
        if let Err(err) = ledger.credit_user_account(&user_id, amount).await {
            tracing::warn!(user_id, amount, error = %err, "failed to credit match reward");
        }
    });
}

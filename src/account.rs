use tracing::info;

use crate::app_state::AppState;
use crate::errors::ProfolioResult;
use crate::identity::Caller;

/// Remove everything the caller owns, then the account itself.
///
/// Children go before parents (remixes, results, requirements) so a failure
/// part-way never leaves remixes pointing at deleted results. The first
/// error stops the sequence.
pub async fn delete_account(state: &AppState, caller: &Caller) -> ProfolioResult<()> {
    let owner = caller.user_id;

    let remixes = state.remixes.delete_all(owner).await?;
    let results = state.results.delete_all(owner).await?;
    let requirements = state.requirements.delete_all(owner).await?;
    state.identity.delete_user(owner).await?;

    info!(
        "Deleted account {} ({} remixes, {} results, {} requirements)",
        owner, remixes, results, requirements
    );
    Ok(())
}

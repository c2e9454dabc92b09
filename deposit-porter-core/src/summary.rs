//! User contribution summary lookup.

use tracing::{error, info};

use crate::contract::PlatformApi;
use crate::error::{PorterError, PorterResult};

/// Fetches the profile summary for `orcid`. The document is returned as the
/// platform sent it.
pub async fn fetch_user_summary<A>(api: &A, orcid: &str) -> PorterResult<serde_json::Value>
where
    A: PlatformApi + ?Sized,
{
    let orcid = orcid.trim();
    if orcid.is_empty() {
        return Err(PorterError::Usage("orcid must not be empty".into()));
    }

    match api.user_summary(orcid).await {
        Ok(summary) => {
            info!(orcid, "Fetched user summary");
            Ok(summary)
        }
        Err(e) => {
            error!(error = %e, orcid, "Failed to fetch user summary");
            Err(e)
        }
    }
}

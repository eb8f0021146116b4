//! Log group enumeration.

use regex::Regex;

use crate::backend::LogsBackend;
use crate::error::ApiError;

/// List every log group whose name matches `filter`, in API order.
pub async fn list_log_groups<B: LogsBackend + ?Sized>(
    backend: &B,
    filter: &Regex,
) -> Result<Vec<String>, ApiError> {
    let mut names = Vec::new();
    let mut next_token = None;
    loop {
        let page = backend.describe_log_groups(next_token).await?;
        names.extend(
            page.group_names
                .into_iter()
                .filter(|name| filter.is_match(name)),
        );
        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }
    tracing::debug!(matched = names.len(), "listed log groups");
    Ok(names)
}

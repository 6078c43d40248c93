use std::collections::HashMap;

use wojtek_core::storage::StorageError;

/// Bytes used by all entries, counting keys and values like browsers do.
pub(crate) fn used_bytes(entries: &HashMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// Fails with `QuotaExceeded` when replacing `key` with `value` would overflow `quota`.
pub(crate) fn check_quota(
    entries: &HashMap<String, String>,
    key: &str,
    value: &str,
    quota: Option<usize>,
) -> Result<(), StorageError> {
    let Some(limit) = quota else {
        return Ok(());
    };

    let previous = entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
    let required = used_bytes(entries) - previous + key.len() + value.len();
    if required > limit {
        return Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            limit,
            required,
        });
    }
    Ok(())
}

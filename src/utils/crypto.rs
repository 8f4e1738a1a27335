use ring::digest::{Context, SHA256};

use crate::error::{LedgerError, Result};
use data_encoding::HEXLOWER;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch
pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LedgerError::Config(format!("System time error: {e}")))?
        .as_secs();

    i64::try_from(duration).map_err(|_| LedgerError::Config("Timestamp overflow".to_string()))
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// Lowercase hex SHA-256 of `data`
pub fn sha256_hex(data: &[u8]) -> String {
    HEXLOWER.encode(&sha256_digest(data))
}

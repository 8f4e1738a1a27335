use data_encoding::HEXLOWER;

/// Length of a compressed public key, the raw form of an address
pub const ADDRESS_BYTES: usize = 33;

/// Length of the textual address form
pub const ADDRESS_HEX_LEN: usize = ADDRESS_BYTES * 2;

/// True iff `address` is exactly 66 lowercase hex characters.
pub fn validate_address(address: &str) -> bool {
    if address.len() != ADDRESS_HEX_LEN {
        return false;
    }
    // HEXLOWER rejects upper-case digits
    matches!(HEXLOWER.decode(address.as_bytes()), Ok(bytes) if bytes.len() == ADDRESS_BYTES)
}

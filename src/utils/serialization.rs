// Bincode 2.x codec for block records kept in sled
use crate::error::{LedgerError, Result};

/// Serialize data using bincode 2.0 with standard configuration
pub fn serialize<T: bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::encode_to_vec(data, config)
        .map_err(|e| LedgerError::Serialization(format!("Failed to encode record: {e}")))
}

/// Deserialize data using bincode 2.0 with standard configuration
pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: bincode::Decode<()>,
{
    let config = bincode::config::standard();
    let (data, _) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| LedgerError::Serialization(format!("Failed to decode record: {e}")))?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
    struct Record {
        index: u64,
        previous_hash: String,
        signature: Option<Vec<u8>>,
    }

    #[test]
    fn test_serialize_deserialize() {
        let original = Record {
            index: 42,
            previous_hash: "00ab".to_string(),
            signature: Some(vec![1, 2, 3]),
        };

        let serialized = serialize(&original).expect("Serialization should work");
        let deserialized: Record = deserialize(&serialized).expect("Deserialization should work");

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_deserialize_invalid_data() {
        let invalid_bytes = vec![0xFF, 0xFF, 0xFF, 0xFF];
        let result: Result<Record> = deserialize(&invalid_bytes);
        assert!(result.is_err());
    }
}

/// The colors on a board, compact enough to hand across the wasm boundary
/// or keep between sessions. Animation state is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoardSnapshot {
    pub width: u32,
    pub height: u32,
    /// Row-major palette indices, `None` for an empty slot.
    pub colors: Vec<Option<u8>>,
}

impl BoardSnapshot {
    /// Deserializes a snapshot from bytes.
    pub fn from_bytes(bts: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the snapshot to bytes.
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_is_compact() {
        let snapshot = BoardSnapshot {
            width: 2,
            height: 2,
            colors: vec![Some(0), Some(5), None, Some(1)],
        };
        let bytes = snapshot.to_bytes().unwrap();
        // Two u32s, a length byte, and one or two bytes per slot
        assert_eq!(bytes.len(), 4 + 4 + 1 + 2 + 2 + 1 + 2);
        assert_eq!(BoardSnapshot::from_bytes(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(BoardSnapshot::from_bytes(&[1, 2, 3]).is_err());
        let mut bytes = BoardSnapshot {
            width: 1,
            height: 1,
            colors: vec![Some(2)],
        }
        .to_bytes()
        .unwrap();
        bytes.push(0);
        // Trailing bytes are not silently ignored
        assert!(BoardSnapshot::from_bytes(&bytes).is_err());
    }
}

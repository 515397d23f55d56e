use std::fmt;

/// Failure reported by a [`KeyValueStore`](crate::host::KeyValueStore).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage access denied: {0}")]
    Security(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOp {
    Read,
    Write,
    Remove,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreOp::Read => "read",
            StoreOp::Write => "write",
            StoreOp::Remove => "remove",
        })
    }
}

/// Error surfaced through a storage binding's `error` signal. Bindings never
/// return or panic with these; the last failure is simply recorded and
/// cleared by the next successful operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("stored value for `{key}` is not valid JSON: {message}")]
    Parse { key: String, message: String },
    #[error("value for `{key}` could not be serialized: {message}")]
    Serialize { key: String, message: String },
    #[error("failed to {op} `{key}`: {source}")]
    Persistence {
        key: String,
        op: StoreOp,
        #[source]
        source: StoreError,
    },
}

impl StorageError {
    pub fn key(&self) -> &str {
        match self {
            StorageError::Parse { key, .. }
            | StorageError::Serialize { key, .. }
            | StorageError::Persistence { key, .. } => key,
        }
    }

    pub(crate) fn parse(key: &str, err: serde_json::Error) -> Self {
        StorageError::Parse {
            key: key.to_owned(),
            message: err.to_string(),
        }
    }

    pub(crate) fn serialize(key: &str, err: serde_json::Error) -> Self {
        StorageError::Serialize {
            key: key.to_owned(),
            message: err.to_string(),
        }
    }

    pub(crate) fn persistence(key: &str, op: StoreOp, source: StoreError) -> Self {
        StorageError::Persistence {
            key: key.to_owned(),
            op,
            source,
        }
    }
}

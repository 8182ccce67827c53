mod namespaces {
    pub const OPERATION: &str = "op";
}

/// Cache key of a compiled operation, a document being compiled once per operation name.
pub(super) enum Key<'a> {
    Operation { name: Option<&'a str>, document: &'a str },
}

impl std::fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Operation { name, document } => {
                let mut hasher = blake3::Hasher::new();
                if let Some(name) = name {
                    hasher.update(name.as_bytes());
                }
                // NULL bytes acting as a separator as it cannot be present in the
                // operation name.
                hasher.update(&[0x00]);
                hasher.update(document.as_bytes());
                let hash = hasher.finalize();

                write!(f, "{}.blake3.{}", namespaces::OPERATION, hash.to_hex())
            }
        }
    }
}

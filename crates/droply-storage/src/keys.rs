//! Storage-key generation.

use uuid::Uuid;

/// Generate the storage key for a new upload: `transfers/{uuid}.{ext}`.
/// The original filename only contributes its extension; display names live
/// in the database, not the key.
pub fn object_key(file_name: &str) -> String {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 16 && !ext.contains('/'))
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());
    format!("transfers/{}.{}", Uuid::new_v4(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_keeps_lowercased_extension() {
        let key = object_key("Quarterly Report.PDF");
        assert!(key.starts_with("transfers/"));
        assert!(key.ends_with(".pdf"));
    }

    #[test]
    fn missing_or_bogus_extension_falls_back_to_bin() {
        assert!(object_key("README").ends_with(".bin"));
        assert!(object_key("archive.").ends_with(".bin"));
        assert!(object_key("weird.ext/with/slash").ends_with(".bin"));
    }

    #[test]
    fn keys_are_unique_per_call() {
        assert_ne!(object_key("a.txt"), object_key("a.txt"));
    }
}

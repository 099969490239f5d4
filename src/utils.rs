use crate::error::{BrandError, Result};
use crate::models::BrandConfig;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Loads a brand config from a JSON file. Fields missing from the file keep their defaults.
pub fn load_config(path: &Path) -> Result<BrandConfig> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| BrandError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Calculates the SHA256 hash of a file.
pub fn file_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 8192]; // 8KB buffer
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rgb;
    use std::fs;

    #[test]
    fn loads_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brand.json");
        fs::write(&path, r##"{ "text_color": "#000000", "ico_sizes": [16] }"##).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.text_color, Rgb(0, 0, 0));
        assert_eq!(config.ico_sizes, vec![16]);
        assert_eq!(config.label, "FT");
    }

    #[test]
    fn reports_bad_config_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brand.json");
        fs::write(&path, r#"{ "primary_color": "blue" }"#).unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, BrandError::Config { .. }));
        assert!(err.to_string().contains("brand.json"));
    }

    #[test]
    fn digests_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();
        assert_eq!(
            file_digest(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

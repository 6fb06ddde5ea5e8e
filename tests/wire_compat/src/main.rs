fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use polar_migrate_protocol::{
        FileCreate, FileRead, FileService, FileUpload, FileUploadCompleted,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Drops `null` object members.
    ///
    /// The API spells absent optionals as `null`; the Rust types omit them.
    /// Both mean the same thing.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Object(map) => {
                let normalized: serde_json::Map<String, serde_json::Value> = map
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect();
                serde_json::Value::Object(normalized)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent, null-normalized comparison).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        let norm_fixture = normalize_value(&fixture);
        let norm_reserialized = normalize_value(&reserialized);
        assert_eq!(
            norm_fixture, norm_reserialized,
            "roundtrip mismatch for {name}:\n  API:  {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    // --- Files API ---

    #[test]
    fn fixture_file_create() {
        let create: FileCreate = roundtrip_test("file_create.json");
        assert_eq!(create.service, FileService::Downloadable);

        // Parts tile [0, size) in order.
        let mut next = 0;
        for (i, part) in create.upload.parts.iter().enumerate() {
            assert_eq!(part.number as usize, i + 1);
            assert_eq!(part.chunk_start, next);
            next = part.chunk_end;
        }
        assert_eq!(next, create.size);
    }

    #[test]
    fn fixture_file_upload() {
        let upload: FileUpload = roundtrip_test("file_upload.json");
        assert_eq!(upload.upload.parts.len(), 3);
        let first = &upload.upload.parts[0];
        assert_eq!(
            first.headers.get("x-amz-checksum-sha256"),
            first.checksum_sha256_base64.as_ref()
        );
    }

    #[test]
    fn fixture_file_upload_completed() {
        let completed: FileUploadCompleted = roundtrip_test("file_upload_completed.json");
        let numbers: Vec<u32> = completed.parts.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(completed.parts.iter().all(|p| p.checksum_etag.starts_with('"')));
    }

    #[test]
    fn fixture_file_read() {
        let record: FileRead = roundtrip_test("file_read.json");
        assert!(record.is_uploaded);
        assert!(record.version.is_none());
    }

    #[test]
    fn upload_without_echoed_ranges_is_accepted() {
        let json = r#"{
            "id": "file_1",
            "upload": {
                "id": "mpu_1",
                "path": "org/file_1/a.bin",
                "parts": [{"number": 1, "url": "https://s3.test/1"}]
            }
        }"#;
        let upload: FileUpload = serde_json::from_str(json).unwrap();
        let part = &upload.upload.parts[0];
        assert_eq!(part.chunk_start, None);
        assert!(part.headers.is_empty());
        assert!(upload.name.is_empty());
    }

    #[test]
    fn fixture_checksum_matches_sha256_hex() {
        use base64::Engine as _;

        let record: FileRead = serde_json::from_value(load_fixture("file_read.json")).unwrap();
        let b64 = record.checksum_sha256_base64.unwrap();
        let raw = base64::engine::general_purpose::STANDARD
            .decode(&b64)
            .unwrap();
        let hex: String = raw.iter().map(|b| format!("{b:02x}")).collect();
        assert_eq!(Some(hex), record.checksum_sha256_hex);
    }
}

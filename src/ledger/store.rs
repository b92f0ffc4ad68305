use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use eyre::{Result, WrapErr, eyre};

use super::record::DeploymentRecord;

pub const LEDGER_FILE: &str = "deployments.json";

/// JSON file mapping lower-cased contract addresses to deployment records
///
/// Every read-modify-write cycle holds the store's lock, and the file is
/// replaced through a rename so readers never see a partial write. Separate
/// processes writing the same file still race; the last writer wins.
pub struct Ledger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Ledger at the conventional location inside a project directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(LEDGER_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record. A missing file is an empty ledger.
    pub fn read(&self) -> Result<BTreeMap<String, DeploymentRecord>> {
        let _guard = self.guard()?;
        self.load()
    }

    /// Look up a record regardless of the address casing
    pub fn get(&self, address: &str) -> Result<Option<DeploymentRecord>> {
        Ok(self.read()?.remove(&address.to_lowercase()))
    }

    /// Store `record` under the lower-cased `address`, replacing any previous entry
    pub fn write(&self, address: &str, mut record: DeploymentRecord) -> Result<()> {
        let _guard = self.guard()?;

        let key = address.to_lowercase();
        record.contract_address = key.clone();

        let mut entries = self.load()?;
        if entries.insert(key.clone(), record).is_some() {
            tracing::info!("Replacing ledger entry for {}", key);
        }
        self.persist(&entries)?;

        tracing::info!("Ledger updated: {} ({} entries)", self.path.display(), entries.len());
        Ok(())
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| eyre!("Ledger lock poisoned: {}", self.path.display()))
    }

    fn load(&self) -> Result<BTreeMap<String, DeploymentRecord>> {
        if !self.path.exists() {
            tracing::debug!("Ledger file does not exist yet: {:?}", self.path);
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .wrap_err_with(|| format!("Failed to read ledger {:?}", self.path))?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse ledger {:?}", self.path))
    }

    fn persist(&self, entries: &BTreeMap<String, DeploymentRecord>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(entries).wrap_err("Failed to serialize ledger")?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .wrap_err_with(|| format!("Failed to create ledger directory: {:?}", dir))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .wrap_err_with(|| format!("Failed to create temporary file in {:?}", dir))?;
        tmp.write_all(content.as_bytes())
            .wrap_err("Failed to write ledger contents")?;
        self.carry_permissions(tmp.as_file())?;
        tmp.persist(&self.path)
            .wrap_err_with(|| format!("Failed to replace ledger {:?}", self.path))?;

        Ok(())
    }

    /// Give the replacement file the mode of the ledger it replaces
    /// (0644 for a new ledger) instead of the temp file's 0600
    #[cfg(unix)]
    fn carry_permissions(&self, file: &fs::File) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let permissions = match fs::metadata(&self.path) {
            Ok(meta) => meta.permissions(),
            Err(_) => fs::Permissions::from_mode(0o644),
        };
        file.set_permissions(permissions)
            .wrap_err_with(|| format!("Failed to set permissions for {:?}", self.path))
    }

    #[cfg(not(unix))]
    fn carry_permissions(&self, file: &fs::File) -> Result<()> {
        if let Ok(meta) = fs::metadata(&self.path) {
            file.set_permissions(meta.permissions())
                .wrap_err_with(|| format!("Failed to set permissions for {:?}", self.path))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::DeploymentType;

    const ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn record(name: &str) -> DeploymentRecord {
        DeploymentRecord::new("localhost", name, ADDRESS, DeploymentType::Local)
            .with_transaction_hash("0xabc")
            .with_abi(serde_json::json!([]))
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::in_dir(dir.path());
        assert!(ledger.read().unwrap().is_empty());
        assert!(ledger.get(ADDRESS).unwrap().is_none());
    }

    #[test]
    fn test_write_lowercases_key() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::in_dir(dir.path());
        let original = record("Counter");

        ledger.write(ADDRESS, original.clone()).unwrap();

        let entries = ledger.read().unwrap();
        assert_eq!(entries.len(), 1);
        let stored = entries.get(&ADDRESS.to_lowercase()).unwrap();
        assert_eq!(stored, &original);

        // Lookup works with either casing
        let upper = ADDRESS.to_uppercase().replace("0X", "0x");
        assert_eq!(ledger.get(&upper).unwrap(), Some(original));
    }

    #[test]
    fn test_rewrite_replaces_whole_record() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::in_dir(dir.path());

        ledger.write(ADDRESS, record("Counter")).unwrap();

        let replacement = DeploymentRecord::new(
            "sepolia",
            "Token",
            &ADDRESS.to_lowercase(),
            DeploymentType::ExternalAbi,
        );
        ledger.write(&ADDRESS.to_lowercase(), replacement.clone()).unwrap();

        let entries = ledger.read().unwrap();
        assert_eq!(entries.len(), 1);
        let stored = entries.values().next().unwrap();
        assert_eq!(stored, &replacement);
        assert!(stored.transaction_hash.is_none());
        assert!(stored.abi.is_none());
    }

    #[test]
    fn test_file_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::in_dir(dir.path());
        ledger.write(ADDRESS, record("Counter")).unwrap();

        let content = fs::read_to_string(ledger.path()).unwrap();
        let key = "\"0x5fbdb2315678afecb367f032d93f642f64180aa3\"";
        assert!(content.starts_with(&format!("{{\n  {}: {{\n    ", key)));
        assert!(content.contains("\"artifactPath\": null"));
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::in_dir(dir.path());

        ledger.write(ADDRESS, record("Counter")).unwrap();
        let mode = fs::metadata(ledger.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);

        fs::set_permissions(ledger.path(), fs::Permissions::from_mode(0o640)).unwrap();
        ledger.write(ADDRESS, record("Token")).unwrap();
        let mode = fs::metadata(ledger.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::in_dir(dir.path());
        fs::write(ledger.path(), "{ not json").unwrap();
        assert!(ledger.read().is_err());
    }
}

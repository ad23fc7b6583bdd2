//! State file: a JSON `LedgerSnapshot` read before and written after each
//! invocation.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use notary_ledger::{InMemoryLedger, LedgerSnapshot};

/// Load the ledger from `path`, or start empty if the file does not exist.
pub fn load(path: &Path) -> anyhow::Result<InMemoryLedger> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no state file, starting empty");
        return Ok(InMemoryLedger::new());
    }
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot = LedgerSnapshot::from_json(&data)
        .with_context(|| format!("parsing state file {}", path.display()))?;
    Ok(InMemoryLedger::from_snapshot(snapshot))
}

/// Replace the file at `path` with the ledger's current state.
///
/// Writes to a sibling temporary file and renames it over `path`.
pub fn save(path: &Path, ledger: &InMemoryLedger) -> anyhow::Result<()> {
    let data = ledger.snapshot()?.to_json()?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    tmp.write_all(&data)?;
    tmp.persist(path)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "state saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_ledger::KeyValueLedger;

    #[test]
    fn missing_file_is_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = load(&dir.path().join("state.json")).unwrap();
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn save_then_load_keeps_state_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let ledger = InMemoryLedger::new();
        ledger.put("k", b"v1").unwrap();
        ledger.put("k", b"v2").unwrap();
        save(&path, &ledger).unwrap();

        let restored = load(&path).unwrap();
        assert_eq!(restored.get("k").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(restored.version_count("k").unwrap(), 2);
        assert_eq!(restored.snapshot().unwrap(), ledger.snapshot().unwrap());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"not json").unwrap();
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("parsing state file"));
    }
}

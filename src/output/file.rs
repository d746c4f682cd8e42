//! Shortlist persistence: one address per line, most preferred first.

use crate::error::PipelineError;
use std::fmt::Write as _;
use std::net::IpAddr;
use std::path::Path;

/// Create or truncate `path` and write `addresses` to it, one per line.
///
/// Returns the number of addresses written. An empty list produces an
/// empty file.
pub fn write_addresses(path: &Path, addresses: &[IpAddr]) -> Result<usize, PipelineError> {
    let mut body = String::with_capacity(addresses.len() * 40);
    for addr in addresses {
        // writing to a String cannot fail
        let _ = writeln!(body, "{addr}");
    }

    std::fs::write(path, body).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!(
        "Successfully wrote {} addresses to {}",
        addresses.len(),
        path.display()
    );
    Ok(addresses.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cfip-output-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_write_addresses() {
        let path = scratch("ranked.txt");
        let addresses: Vec<IpAddr> = vec!["104.16.0.0".parse().unwrap(), "2606:4700::1".parse().unwrap()];
        assert_eq!(write_addresses(&path, &addresses).unwrap(), 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "104.16.0.0\n2606:4700::1\n"
        );
    }

    #[test]
    fn test_write_truncates_existing() {
        let path = scratch("truncate.txt");
        std::fs::write(&path, "old\ncontent\nthat\nis\nlonger\n").unwrap();
        write_addresses(&path, &["192.0.2.0".parse().unwrap()]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "192.0.2.0\n");
    }

    #[test]
    fn test_write_empty_list() {
        let path = scratch("empty.txt");
        assert_eq!(write_addresses(&path, &[]).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_write_unwritable_path() {
        let path = scratch("no-such-dir").join("ranked.txt");
        let err = write_addresses(&path, &["192.0.2.0".parse().unwrap()]).unwrap_err();
        assert!(matches!(err, PipelineError::Write { .. }));
        assert!(err.to_string().contains("no-such-dir"), "got: {err}");
    }
}

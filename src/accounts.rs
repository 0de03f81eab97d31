//! Credential-file loading.
//!
//! Accounts come from a newline-delimited text file of session cookie
//! strings, one per account. Blank lines are ignored. The file is read at
//! startup and again each time the periodic claim-only sweep fires.

use crate::types::Account;
use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;

/// Load accounts from a cookie file. An unreadable or empty file is a
/// fatal startup condition.
pub fn load_accounts(path: impl AsRef<Path>) -> Result<Vec<Account>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read account file {}", path.display()))?;

    let accounts: Vec<Account> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, cookie)| Account::new(format!("account_{}", i + 1), cookie))
        .collect();

    if accounts.is_empty() {
        bail!("no accounts found in {}", path.display());
    }

    info!("loaded {} account(s) from {}", accounts.len(), path.display());
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_blank_lines_ignored_and_names_sequential() {
        let path = write_temp(
            "boxminer_accounts_ok.txt",
            "session=abc\n\n   \nsession=def  \n",
        );
        let accounts = load_accounts(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].name, "account_1");
        assert_eq!(accounts[0].cookie, "session=abc");
        assert_eq!(accounts[1].name, "account_2");
        assert_eq!(accounts[1].cookie, "session=def");
    }

    #[test]
    fn test_empty_file_is_fatal() {
        let path = write_temp("boxminer_accounts_empty.txt", "\n\n");
        let result = load_accounts(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        assert!(load_accounts("/definitely/not/a/real/cookie.txt").is_err());
    }
}

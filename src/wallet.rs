use alloy::signers::local::{LocalSigner, PrivateKeySigner};
use eyre::{Context, Result};
use std::fs;

use crate::config::PrivateKey;

impl PrivateKey {
    /// Resolves the local signer, if the user configured one.
    ///
    /// Returns `None` when no key source was given, in which case the node is
    /// expected to sign with one of its own accounts.
    pub fn wallet(&self) -> Result<Option<PrivateKeySigner>> {
        if let Some(key) = &self.private_key {
            let signer = key
                .trim()
                .parse::<PrivateKeySigner>()
                .wrap_err("could not parse private key")?;
            return Ok(Some(signer));
        }

        if let Some(file) = &self.private_key_path {
            let key = fs::read_to_string(file).wrap_err("could not open private key file")?;
            let signer = key
                .trim()
                .parse::<PrivateKeySigner>()
                .wrap_err("could not parse private key file")?;
            return Ok(Some(signer));
        }

        let Some(keystore) = &self.keystore_path else {
            return Ok(None);
        };
        let password = self
            .keystore_password_path
            .as_ref()
            .map(fs::read_to_string)
            .unwrap_or(Ok("".into()))
            .wrap_err("could not open keystore password file")?;

        LocalSigner::decrypt_keystore(keystore, password.trim_end())
            .map(Some)
            .wrap_err("could not decrypt keystore")
    }
}

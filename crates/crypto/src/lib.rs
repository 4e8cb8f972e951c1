//! Age decryption for environment configs. Production configs live in the
//! repo as `.yml.age`; anyone with a matching identity can render or deploy
//! them, nobody can read them off a laptop backup.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use secrecy::SecretVec;
use zeroize::Zeroize;

/// Reads an age identity file: one `AGE-SECRET-KEY-1...` per line, `#`
/// comments and blank lines ignored. The raw key text is wiped after
/// parsing.
pub fn load_identities(path: &Path) -> Result<Vec<age::x25519::Identity>> {
    let mut text = std::fs::read_to_string(path)
        .with_context(|| format!("open identity file {}", path.display()))?;
    let mut ids = Vec::new();
    let mut bad = None;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match age::x25519::Identity::from_str(line) {
            Ok(id) => ids.push(id),
            Err(e) => {
                bad = Some(anyhow::anyhow!("invalid identity in {}: {e}", path.display()));
                break;
            }
        }
    }
    text.zeroize();
    if let Some(err) = bad {
        return Err(err);
    }
    if ids.is_empty() {
        anyhow::bail!("no identities found in {}", path.display());
    }
    Ok(ids)
}

/// Decrypts an age stream with the first matching identity. The plaintext
/// stays wrapped in a `SecretVec` so it is zeroized on drop.
pub fn decrypt_age_bytes(rdr: impl Read, ids: &[age::x25519::Identity]) -> Result<SecretVec<u8>> {
    let decryptor = age::Decryptor::new(rdr).context("read age header")?;
    let mut reader = decryptor
        .decrypt(ids.iter().map(|id| id as &dyn age::Identity))
        .context("no identity matched the encrypted file")?;
    let mut out = Vec::new();
    reader.read_to_end(&mut out).context("read decrypted stream")?;
    Ok(SecretVec::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    // The identity string comes back as age's own secret type; its trait has
    // to come from age's re-export to line up.
    use age::secrecy::ExposeSecret as _;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn encrypt(to: &age::x25519::Recipient, plaintext: &[u8]) -> Vec<u8> {
        let mut ciphertext = Vec::new();
        let mut writer = age::Encryptor::with_recipients(std::iter::once(to as &dyn age::Recipient))
            .expect("encryptor")
            .wrap_output(&mut ciphertext)
            .expect("wrap");
        writer.write_all(plaintext).expect("encrypt");
        writer.finish().expect("finish");
        ciphertext
    }

    #[test]
    fn roundtrip_with_matching_identity() {
        let id = age::x25519::Identity::generate();
        let ciphertext = encrypt(&id.to_public(), b"project: demo\n");

        let dir = tempfile::tempdir().expect("tempdir");
        let key_path = dir.path().join("keys.txt");
        let mut f = std::fs::File::create(&key_path).expect("create identity file");
        writeln!(f, "# test identity").expect("write");
        writeln!(f, "{}", id.to_string().expose_secret()).expect("write");

        let ids = load_identities(&key_path).expect("load");
        assert_eq!(ids.len(), 1);
        let plain = decrypt_age_bytes(&ciphertext[..], &ids).expect("decrypt");
        assert_eq!(plain.expose_secret().as_slice(), b"project: demo\n");
    }

    #[test]
    fn wrong_identity_is_rejected() {
        let sender = age::x25519::Identity::generate();
        let ciphertext = encrypt(&sender.to_public(), b"secret");

        let other = age::x25519::Identity::generate();
        assert!(decrypt_age_bytes(&ciphertext[..], &[other]).is_err());
    }

    #[test]
    fn empty_identity_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("keys.txt");
        std::fs::write(&path, "# nothing here\n").expect("write");
        assert!(load_identities(&path).is_err());
    }
}

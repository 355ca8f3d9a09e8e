//! CredentialStore: username -> encrypted password, on top of `HashTable`.
//!
//! Plaintext passwords never reach the table. Every password passes through
//! an [`Encrypt`] implementation first, and verification compares encrypted
//! forms with [`HashTable::matches`].

use crate::config::{StoreConfig, DEFAULT_SALT};
use crate::error::{CredentialError, EncryptionError};
use crate::hash_table::{Dump, FixedState, HashTable};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Deterministic one-way transform from a plaintext password to the
/// representation kept in the store.
///
/// The output must be non-empty and free of whitespace, since the store's
/// file format separates username and credential by whitespace.
/// `CredentialStore` rejects any other output with
/// [`EncryptionError::Rejected`].
pub trait Encrypt {
    fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError>;
}

/// Salted SHA-256, hex encoded. The salt is fixed per store, so equal
/// passwords encrypt to equal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sha256Crypt {
    salt: String,
}

impl Sha256Crypt {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }
}

impl Default for Sha256Crypt {
    fn default() -> Self {
        Self::new(DEFAULT_SALT)
    }
}

impl Encrypt for Sha256Crypt {
    fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(plaintext.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

pub struct CredentialStore<E = Sha256Crypt> {
    table: HashTable<String, String>,
    encryptor: E,
}

impl CredentialStore {
    /// Store with `prime_below(capacity)` buckets and the default encryptor.
    pub fn new(capacity: usize) -> Result<Self, CredentialError> {
        Self::with_encryptor(capacity, Sha256Crypt::default())
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, CredentialError> {
        Self::with_encryptor(config.capacity, Sha256Crypt::new(config.salt.as_str()))
    }
}

impl<E: Encrypt> CredentialStore<E> {
    pub fn with_encryptor(capacity: usize, encryptor: E) -> Result<Self, CredentialError> {
        Ok(Self {
            table: HashTable::with_capacity(capacity)?,
            encryptor,
        })
    }

    /// Loads `username credential` lines. Credentials are taken as already
    /// encrypted and stored verbatim.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, CredentialError> {
        Ok(self.table.load(path)?)
    }

    /// Encrypts `password` and upserts it for `user`.
    pub fn add_user(&mut self, user: &str, password: &str) -> Result<bool, CredentialError> {
        let encrypted = self.encrypt_checked(password)?;
        Ok(self.table.insert(user.to_string(), encrypted))
    }

    pub fn remove_user(&mut self, user: &str) -> bool {
        self.table.remove(user)
    }

    /// Replaces `user`'s password after checking `old` against the store.
    ///
    /// `Ok(false)` when `new` equals `old`, when `user` is unknown, or when
    /// `old` does not match. An encryption failure is an error and leaves the
    /// stored credential untouched.
    pub fn change_password(
        &mut self,
        user: &str,
        old: &str,
        new: &str,
    ) -> Result<bool, CredentialError> {
        if new == old {
            tracing::debug!(user, "password change rejected: new password equals old");
            return Ok(false);
        }
        let encrypted_old = self.encrypt_checked(old)?;
        let encrypted_new = self.encrypt_checked(new)?;
        if !self.table.matches(user, &encrypted_old) {
            tracing::debug!(user, "password change rejected: credential mismatch");
            return Ok(false);
        }
        Ok(self.table.insert(user.to_string(), encrypted_new))
    }

    // Output that could not be written and reloaded line by line is refused.
    fn encrypt_checked(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let encrypted = self.encryptor.encrypt(plaintext)?;
        if encrypted.is_empty() || encrypted.contains(char::is_whitespace) {
            return Err(EncryptionError::Rejected(
                "credential must be non-empty and contain no whitespace".into(),
            ));
        }
        Ok(encrypted)
    }

    pub fn find(&self, user: &str) -> bool {
        self.table.contains(user)
    }

    pub fn dump(&self) -> Dump<'_, String, String, FixedState> {
        self.table.dump()
    }

    pub fn size(&self) -> usize {
        self.table.size()
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CredentialError> {
        Ok(self.table.write_to_file(path)?)
    }
}

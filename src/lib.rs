//! prime-chain: a single-threaded, separate-chaining hash table whose bucket
//! count is always prime, and a credential store layered on it.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small key-value table whose growth policy and bucket layout are
//!   explicit and inspectable, plus a username/password adaptor on top.
//! - Layers:
//!   - `prime`: picks bucket counts. `prime_below(n)` sieves for the largest
//!     prime `<= n` within `[2, MAX_PRIME]`.
//!   - `bucket`: one chain of `(key, value, hash)` entries with unique keys,
//!     kept in insertion order.
//!   - `HashTable<K, V, S>`: hashes a key, selects `hash % capacity`, and
//!     scans that chain. Upserts, removes, grows, loads and writes files.
//!   - `CredentialStore<E>`: usernames to encrypted passwords via a
//!     pluggable one-way `Encrypt`.
//!
//! Constraints
//! - Single-threaded; every mutation takes `&mut self`.
//! - Keys are unique; `insert` overwrites an existing key's value and always
//!   returns `true`.
//! - `size() == Σ chain lengths` outside of a single call.
//! - Capacity is prime. A zero-bucket table cannot be constructed; bad
//!   requests fail with `SizingError`.
//!
//! Growth
//! - After an insert adds a new key, if `size > capacity` the table moves
//!   every entry into `grow_capacity(capacity)` buckets: the largest prime
//!   `<= 2 * capacity`, with the request clamped to `MAX_PRIME`. At
//!   `MAX_PRIME` the table stops growing and chains simply lengthen.
//! - Removal and `clear` never shrink the table.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its precomputed `u64` hash; rehashing recomputes only
//!   the modulus and never calls `K: Hash` or `insert`, so it cannot nest.
//! - The default `FixedState` hasher holds no per-instance state, so bucket
//!   layout and dumps are reproducible.
//!
//! File format
//! - One `key value` pair per line, whitespace separated, using `Display`
//!   to write and `FromStr` to read. Keys and values containing whitespace
//!   are not supported. Loading stops at the first malformed line.
//!
//! Non-goals
//! - No crash-safe writes, no concurrent access, no sharding.
//! - `Sha256Crypt` is a fixed-salt digest, not a password KDF.

mod bucket;
mod config;
pub mod credential;
mod error;
pub mod hash_table;
mod hash_table_proptest;
pub mod prime;

// Public surface
pub use config::{StoreConfig, DEFAULT_SALT};
pub use credential::{CredentialStore, Encrypt, Sha256Crypt};
pub use error::{ConfigError, CredentialError, EncryptionError, SizingError, TableError};
pub use hash_table::{Dump, FixedState, HashTable, Iter};
pub use prime::{prime_below, DEFAULT_CAPACITY, MAX_PRIME};

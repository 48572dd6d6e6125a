//! The signing key pair used both to derive funding addresses and to sign
//! every redemption input.

use crate::error::Error;
use bitcoin::{Address, Network, PubkeyHash, PublicKey, ScriptBuf};
use secp256k1::{PublicKey as RawPublicKey, Secp256k1, SecretKey};

/// A secp256k1 key pair, generated once per injection and persisted by the
/// caller (see spec §3, "PrivateKey"). The public key is always treated as
/// compressed: every script in this crate pushes the 33-byte compressed
/// form.
#[derive(Clone, Debug)]
pub struct Keypair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl Keypair {
    /// Generates a new random key pair.
    pub fn new_random() -> Self {
        let secret_key = SecretKey::new(&mut rand::thread_rng());
        Self::from_secret_key(secret_key)
    }

    /// Loads a key pair from a raw 32-byte secret.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let secret_key = SecretKey::from_slice(bytes).map_err(Error::Crypto)?;
        Ok(Self::from_secret_key(secret_key))
    }

    fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let raw_public_key = RawPublicKey::from_secret_key(&secp, &secret_key);
        let public_key = PublicKey {
            compressed: true,
            inner: raw_public_key,
        };

        Self {
            secret_key,
            public_key,
        }
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// The P2PKH address derived from this key pair's public key. Used as
    /// the default payout destination when the caller does not supply a
    /// change address.
    pub fn p2pkh_address(&self, network: Network) -> Result<Address, Error> {
        let script_pubkey = self.p2pkh_script_pubkey();
        Address::from_script(&script_pubkey, network).map_err(Error::Address)
    }

    pub fn p2pkh_script_pubkey(&self) -> ScriptBuf {
        let pubkey_hash: PubkeyHash = self.public_key.pubkey_hash();
        ScriptBuf::new_p2pkh(&pubkey_hash)
    }
}

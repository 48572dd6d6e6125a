//! Derives the ordered set of P2SH funding addresses a payload requires.
//!
//! Grounded in `P2SHScriptAddr` (original_source/injection/p2sh.go, which
//! chunks the payload, builds a redeem script and hashes it into a
//! script-hash address) and in the anchoring reference's
//! `RedeemScript::to_address`/`script_pubkey`, generalized from one
//! multisig redeem script to one redeem script per funding slot.

use crate::chunker;
use crate::config::MAX_PARTS;
use crate::error::Error;
use crate::keys::Keypair;
use crate::script::build_redeem_script;
use bitcoin::{Address, Network, ScriptBuf};

/// One funding slot: the chunks it must encode, the redeem script derived
/// from them, and the P2SH address a payer sends coins to.
#[derive(Clone, Debug)]
pub struct FundingSlot<'a> {
    pub chunks: Vec<&'a [u8]>,
    pub redeem_script: ScriptBuf,
    pub address: Address,
}

/// The ordered set of funding slots a payload requires, plus the network
/// they were derived for.
#[derive(Clone, Debug)]
pub struct FundingPlan<'a> {
    pub network: Network,
    pub slots: Vec<FundingSlot<'a>>,
}

impl<'a> FundingPlan<'a> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Splits `payload` into parts, builds one redeem script and P2SH address
/// per part, and returns them in payload order.
pub fn derive_funding_plan<'a>(
    payload: &'a [u8],
    keypair: &Keypair,
    network: Network,
) -> Result<FundingPlan<'a>, Error> {
    if payload.is_empty() {
        return Err(Error::EmptyPayload);
    }

    let parts = chunker::parts(payload)?;
    if parts.len() > MAX_PARTS {
        return Err(Error::TooManyParts {
            parts: parts.len(),
            max: MAX_PARTS,
        });
    }

    let pubkey = keypair.public_key();
    let mut slots = Vec::with_capacity(parts.len());

    for part in parts {
        let chunks = chunker::chunks_of_part(part)?;
        let redeem_script = build_redeem_script(&pubkey, &chunks)?;
        let script_pubkey = ScriptBuf::new_p2sh(&redeem_script.script_hash());
        let address = Address::from_script(&script_pubkey, network).map_err(Error::Address)?;

        slots.push(FundingSlot {
            chunks,
            redeem_script,
            address,
        });
    }

    Ok(FundingPlan { network, slots })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_rejected() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        assert!(matches!(
            derive_funding_plan(b"", &key, Network::Testnet),
            Err(Error::EmptyPayload)
        ));
    }

    #[test]
    fn one_slot_per_part() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let payload = vec![0u8; 1462];
        let plan = derive_funding_plan(&payload, &key, Network::Testnet).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn same_payload_and_key_derive_the_same_addresses() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let payload = b"hello world".to_vec();
        let a = derive_funding_plan(&payload, &key, Network::Testnet).unwrap();
        let b = derive_funding_plan(&payload, &key, Network::Testnet).unwrap();
        assert_eq!(
            a.slots[0].address.to_string(),
            b.slots[0].address.to_string()
        );
    }

    #[test]
    fn different_networks_derive_different_addresses() {
        let key = Keypair::from_secret_bytes(&[0x01; 32]).unwrap();
        let payload = b"hello world".to_vec();
        let mainnet = derive_funding_plan(&payload, &key, Network::Bitcoin).unwrap();
        let testnet = derive_funding_plan(&payload, &key, Network::Testnet).unwrap();
        assert_ne!(
            mainnet.slots[0].address.to_string(),
            testnet.slots[0].address.to_string()
        );
    }
}

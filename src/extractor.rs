//! Reverses the encoding: reads a raw transaction's input signature scripts
//! back into the original payload bytes.
//!
//! Grounded in `retrieval/p2sh.go`'s `P2SHRetrieveData`, the legacy (no
//! index-byte) variant: each input's signature script splits into
//! `[signature, chunk_0, ..., chunk_n, redeem_script]`; dropping the first
//! and last pushes and concatenating the rest in input order recovers the
//! payload. Disassembly uses `bitcoin::script::Instruction` iteration
//! rather than the original's string-based disassemble-then-split, the
//! same way the anchoring reference material's `RedeemScript::compressed`
//! walks a script's instructions.

use crate::error::Error;
use bitcoin::blockdata::script::Instruction;
use bitcoin::{consensus, Transaction};

/// Deserializes a raw transaction and recovers the payload embedded across
/// its inputs. The entry point a caller holding only transaction bytes (as
/// opposed to an already-parsed [`Transaction`]) uses.
pub fn extract_from_bytes(bytes: &[u8]) -> Result<Vec<u8>, Error> {
    let tx: Transaction = consensus::deserialize(bytes).map_err(Error::MalformedTransaction)?;
    extract(&tx)
}

/// Recovers the payload embedded across every input of `tx`, in input
/// order.
pub fn extract(tx: &Transaction) -> Result<Vec<u8>, Error> {
    let mut data = Vec::new();

    for (index, input) in tx.input.iter().enumerate() {
        let pushes = collect_pushes(&input.script_sig, index)?;

        if pushes.len() < 3 {
            return Err(Error::TooFewPushes { index });
        }

        for chunk in &pushes[1..pushes.len() - 1] {
            data.extend_from_slice(chunk);
        }
    }

    Ok(data)
}

fn collect_pushes<'a>(
    script_sig: &'a bitcoin::Script,
    index: usize,
) -> Result<Vec<&'a [u8]>, Error> {
    let mut pushes = Vec::new();

    for instruction in script_sig.instructions() {
        match instruction.map_err(|_| Error::UnexpectedOpcode { index })? {
            Instruction::PushBytes(bytes) => pushes.push(bytes.as_bytes()),
            Instruction::Op(_) => return Err(Error::UnexpectedOpcode { index }),
        }
    }

    Ok(pushes)
}

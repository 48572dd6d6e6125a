//! Watches the funding addresses produced by [`crate::address::derive_funding_plan`]
//! for incoming payments, binding each discovered UTXO to its slot.
//!
//! `ChainIndex` generalizes the original source's synchronous Electrum
//! client (`electrum.Client.GetHistory`/`GetRawTransaction`) into an
//! `async_trait`, the way the teacher crate's `NewAddress` and
//! `BroadcastSignedTransaction` traits wrap the caller's wallet and node
//! access. The per-slot polling loop, its one-second backoff, and its
//! `paymentsReceived`-under-a-mutex bookkeeping are carried over directly
//! from `injector.go`'s `WaitPayments`, which computes the slot's Electrum
//! scripthash once per loop iteration before calling `GetHistory` — this
//! worker does the same via [`crate::config::electrum_script_hash`].

use crate::address::FundingPlan;
use crate::config::electrum_script_hash;
use crate::error::Error;
use crate::transaction::{estimate_cost, BoundUtxo};
use bitcoin::{Amount, OutPoint, Transaction, Txid};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

/// Interval between polling attempts for a single funding slot, matching
/// the original source's `time.Sleep(time.Second)`.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// External collaborator giving the watcher read access to a Bitcoin
/// indexing server (an Electrum server or equivalent). Modeled as a trait
/// so the watcher itself never depends on a transport.
#[async_trait::async_trait]
pub trait ChainIndex: Send + Sync {
    /// Returns the txids of every transaction that has ever touched the
    /// history of the scriptPubKey hashing to `script_hash_hex` — the
    /// Electrum "scripthash" convention (`config::electrum_script_hash`),
    /// not a raw script, since that is the key the wire protocol subscribes
    /// and queries with.
    async fn history(&self, script_hash_hex: &str) -> anyhow::Result<Vec<Txid>>;

    /// Fetches and decodes a previously-seen transaction.
    async fn transaction(&self, txid: Txid) -> anyhow::Result<Transaction>;

    /// Broadcasts a fully signed transaction to the network.
    async fn broadcast(&self, transaction: &Transaction) -> anyhow::Result<()>;
}

/// Outcome of [`broadcast`]. `AlreadyInjected` is not an error: it means a
/// prior run already broadcast this exact transaction, and the injection is
/// idempotent.
#[derive(Clone, Copy, Debug)]
pub enum BroadcastOutcome {
    Broadcast(Txid),
    AlreadyInjected(Txid),
}

/// Broadcasts `transaction`, first probing the index for a transaction
/// already bound to its txid. The probe makes the whole injection
/// idempotent: a caller that re-runs after a crash, once the transaction
/// has already landed, gets told so instead of hitting a double-spend
/// error.
pub async fn broadcast(
    index: &impl ChainIndex,
    transaction: &Transaction,
) -> Result<BroadcastOutcome, Error> {
    let txid = transaction.txid();

    if index.transaction(txid).await.is_ok() {
        return Ok(BroadcastOutcome::AlreadyInjected(txid));
    }

    index
        .broadcast(transaction)
        .await
        .map_err(Error::Index)?;

    Ok(BroadcastOutcome::Broadcast(txid))
}

/// Watches every funding slot of a [`FundingPlan`] concurrently until each
/// has received a UTXO of at least the required value.
pub struct PaymentWatcher<'a, I> {
    plan: &'a FundingPlan<'a>,
    index: I,
    required_value: Amount,
}

impl<'a, I> fmt::Debug for PaymentWatcher<'a, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentWatcher")
            .field("plan", &self.plan)
            .field("required_value", &self.required_value)
            .finish_non_exhaustive()
    }
}

impl<'a, I: ChainIndex> PaymentWatcher<'a, I> {
    /// Builds a watcher whose per-slot payment threshold is the §4.4 cost
    /// estimate's `per_slot_sats`, derived from an estimate-mode transaction
    /// and a fee rate rather than taken as an opaque caller-supplied amount.
    pub fn new(
        plan: &'a FundingPlan<'a>,
        index: I,
        estimate_tx: &Transaction,
        fee_rate: u64,
    ) -> Result<Self, Error> {
        let (_, required_value, _) = estimate_cost(estimate_tx, fee_rate, plan.len())?;

        Ok(Self {
            plan,
            index,
            required_value,
        })
    }

    /// Spawns one worker task per funding slot and waits for all of them to
    /// bind a UTXO, invoking `on_payment` under a shared mutex each time a
    /// slot binds — exactly the contract `injector.go`'s `onPayment`
    /// callback honors, generalized from a single counter-and-print to an
    /// arbitrary caller-supplied closure.
    pub async fn wait<F>(self, on_payment: F) -> Result<Vec<BoundUtxo>, Error>
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        let received = std::sync::Arc::new(Mutex::new(0usize));
        let on_payment = std::sync::Arc::new(on_payment);
        let index = std::sync::Arc::new(self.index);

        let total = self.plan.len();
        let mut tasks = Vec::with_capacity(total);

        for (slot_index, slot) in self.plan.slots.iter().enumerate() {
            let script_pubkey = slot.address.script_pubkey();
            let index = index.clone();
            let received = received.clone();
            let on_payment = on_payment.clone();
            let required_value = self.required_value;

            tasks.push(tokio::spawn(async move {
                watch_slot(
                    slot_index,
                    script_pubkey,
                    required_value,
                    index,
                    received,
                    on_payment,
                )
                .await
            }));
        }

        let mut utxos = vec![None; total];
        for task in tasks {
            let (slot_index, utxo) = task.await.map_err(|e| Error::Index(e.into()))??;
            utxos[slot_index] = Some(utxo);
        }

        utxos
            .into_iter()
            .enumerate()
            .map(|(slot_index, utxo)| utxo.ok_or(Error::UnboundSlot { index: slot_index }))
            .collect()
    }
}

async fn watch_slot<I: ChainIndex>(
    slot_index: usize,
    script_pubkey: bitcoin::ScriptBuf,
    required_value: Amount,
    index: std::sync::Arc<I>,
    received: std::sync::Arc<Mutex<usize>>,
    on_payment: std::sync::Arc<dyn Fn(usize, usize) + Send + Sync>,
) -> Result<(usize, BoundUtxo), Error> {
    let script_hash = electrum_script_hash(&script_pubkey);

    loop {
        match poll_once(&script_hash, &script_pubkey, required_value, &index).await {
            Ok(Some(utxo)) => {
                let count = {
                    let mut guard = received.lock().unwrap();
                    *guard += 1;
                    *guard
                };
                on_payment(slot_index, count);
                tracing::info!(slot_index, txid = %utxo.outpoint.txid, "funding slot bound");
                return Ok((slot_index, utxo));
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(slot_index, error = %err, "chain index poll failed, retrying");
            }
        }

        sleep(POLL_INTERVAL).await;
    }
}

async fn poll_once<I: ChainIndex>(
    script_hash: &str,
    script_pubkey: &bitcoin::ScriptBuf,
    required_value: Amount,
    index: &I,
) -> anyhow::Result<Option<BoundUtxo>> {
    let history = index.history(script_hash).await?;

    for txid in history {
        let tx = index.transaction(txid).await?;

        for (vout, output) in tx.output.iter().enumerate() {
            if &output.script_pubkey == script_pubkey && output.value >= required_value {
                return Ok(Some(BoundUtxo {
                    outpoint: OutPoint {
                        txid,
                        vout: vout as u32,
                    },
                    value: output.value,
                }));
            }
        }
    }

    Ok(None)
}

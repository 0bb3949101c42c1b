use std::collections::HashSet;

use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use tracing::{info, warn};

use crate::address::AddressCodec;
use crate::config::{UtxoPolicy, ZcashParams};
use crate::error::UtxoError;
use crate::input::{FeeRate, MultiTransferInput, TransferInput};
use crate::network::ChainParams;
use crate::transaction::{Recipient, UnsignedTransaction};
use crate::utxo::{self, UnspentOutput};

/// Arguments of a single-sender transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferArgs {
    pub from: String,
    pub to: String,
    pub amount: u64,
    /// Token contract. UTXO chains have none, so any value is rejected.
    pub contract: Option<String>,
}

impl TransferArgs {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: u64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
            contract: None,
        }
    }

    pub fn with_contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }
}

/// Assembles unsigned transactions for one chain.
#[derive(Debug, Clone)]
pub struct TransferBuilder {
    codec: AddressCodec,
    policy: UtxoPolicy,
}

impl TransferBuilder {
    pub fn new(params: ChainParams) -> Self {
        Self {
            codec: AddressCodec::new(params),
            policy: UtxoPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: UtxoPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn codec(&self) -> &AddressCodec {
        &self.codec
    }

    pub fn policy(&self) -> &UtxoPolicy {
        &self.policy
    }

    pub fn transfer(
        &self,
        args: &TransferArgs,
        input: &TransferInput,
    ) -> Result<UnsignedTransaction, UtxoError> {
        if args.contract.is_some() {
            return Err(UtxoError::UnsupportedOperation(format!(
                "token transfers are not supported on {}",
                self.codec.chain()
            )));
        }
        self.native_transfer(&args.from, &args.to, args.amount, input)
    }

    /// Spend every coin in `input`, paying `amount` to `to` and the
    /// remainder back to `from`.
    pub fn native_transfer(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        input: &TransferInput,
    ) -> Result<UnsignedTransaction, UtxoError> {
        let coins = input.unspent_outputs.clone();
        let fee = self.fee(input.fee_rate, coins.len(), 1);
        let change = self.change(utxo::sum_utxo(&coins), amount, fee)?;

        let mut recipients = vec![Recipient::new(to, amount)];
        if change > 0 {
            recipients.push(Recipient::new(from, change));
        }
        self.assemble(coins, recipients, fee, change, input.zcash)
    }

    /// Fund `receivers` from several spenders.
    ///
    /// Coins belonging to an address outside `spenders` are ignored.
    /// Spenders are drawn on in the order given until the receivers and the
    /// fee are covered; the last one drawn on receives the change.
    pub fn multi_transfer(
        &self,
        spenders: &[String],
        receivers: &[Recipient],
        input: &MultiTransferInput,
    ) -> Result<UnsignedTransaction, UtxoError> {
        if spenders.is_empty() {
            return Err(UtxoError::InvalidTransaction("no spenders".into()));
        }
        if receivers.is_empty() {
            return Err(UtxoError::InvalidTransaction("no receivers".into()));
        }
        let amount = receivers.iter().try_fold(0u64, |acc, r| {
            acc.checked_add(r.value)
                .ok_or_else(|| UtxoError::InvalidTransaction("receiver total overflows".into()))
        })?;

        for group in &input.inputs {
            if !spenders.contains(&group.address) {
                warn!(
                    address = %group.address,
                    utxos = group.unspent_outputs.len(),
                    "ignoring inputs of undeclared spender"
                );
            }
        }

        let mut coins: Vec<UnspentOutput> = Vec::new();
        let mut total: u64 = 0;
        let mut change_to: Option<&str> = None;
        for spender in spenders {
            let owned: Vec<&UnspentOutput> = input
                .inputs
                .iter()
                .filter(|group| &group.address == spender)
                .flat_map(|group| group.unspent_outputs.iter())
                .collect();
            if owned.is_empty() {
                continue;
            }
            for coin in owned {
                total = total.saturating_add(coin.value);
                let mut coin = coin.clone();
                coin.owning_address = Some(spender.clone());
                coins.push(coin);
            }
            change_to = Some(spender.as_str());

            let fee = self.fee(input.fee_rate, coins.len(), receivers.len());
            if total >= amount.saturating_add(fee) {
                break;
            }
        }

        let fee = self.fee(input.fee_rate, coins.len(), receivers.len());
        let change = self.change(total, amount, fee)?;

        let mut recipients = receivers.to_vec();
        if let Some(spender) = change_to.filter(|_| change > 0) {
            recipients.push(Recipient::new(spender, change));
        }
        self.assemble(coins, recipients, fee, change, input.zcash)
    }

    fn fee(&self, rate: FeeRate, inputs: usize, receivers: usize) -> u64 {
        rate.fee(self.codec.chain(), inputs, receivers, &self.policy)
    }

    fn change(&self, available: u64, amount: u64, fee: u64) -> Result<u64, UtxoError> {
        let needed = amount
            .checked_add(fee)
            .ok_or_else(|| UtxoError::InvalidTransaction("amount plus fee overflows".into()))?;
        available
            .checked_sub(needed)
            .ok_or_else(|| UtxoError::InsufficientFunds {
                needed,
                available,
                shortfall: needed - available,
            })
    }

    fn assemble(
        &self,
        coins: Vec<UnspentOutput>,
        recipients: Vec<Recipient>,
        fee: u64,
        change: u64,
        zcash: Option<ZcashParams>,
    ) -> Result<UnsignedTransaction, UtxoError> {
        if coins.is_empty() {
            return Err(UtxoError::InvalidTransaction("no coins to spend".into()));
        }

        let mut seen = HashSet::with_capacity(coins.len());
        let mut inputs = Vec::with_capacity(coins.len());
        for coin in &coins {
            if !seen.insert(coin.outpoint) {
                return Err(UtxoError::InvalidTransaction(format!(
                    "outpoint {} spent twice",
                    coin.outpoint
                )));
            }
            inputs.push(TxIn {
                previous_output: OutPoint::from(coin.outpoint),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            });
        }

        let outputs = recipients
            .iter()
            .map(|recipient| {
                Ok(TxOut {
                    value: Amount::from_sat(recipient.value),
                    script_pubkey: self.codec.script_pubkey(&recipient.address)?,
                })
            })
            .collect::<Result<Vec<_>, UtxoError>>()?;

        let tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: inputs,
            output: outputs,
        };

        info!(
            chain = %self.codec.chain(),
            inputs = tx.input.len(),
            outputs = tx.output.len(),
            fee,
            change,
            "built transfer"
        );
        Ok(UnsignedTransaction::new(
            *self.codec.params(),
            tx,
            coins,
            recipients,
            fee,
            zcash,
        ))
    }
}

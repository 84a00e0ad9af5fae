//! # Transfer Protocol
//!
//! The single-shot transfer transaction and issuance.
//!
//! ```text
//! authorize ──→ pre hooks ──→ balance check ──→ debit/credit ──→ post hooks ──→ events
//!  (operator      (sender,       (after hooks,      (ledger          (to-strategy or
//!   or allowance)  from-strategy)  reentrancy)       state)           unmanaged prefix,
//!                                                                     recipient)
//! ```
//!
//! Every step may fail. The caller runs this inside [`Amp::transact`], so a
//! failure anywhere, including a veto after balances moved, leaves no trace.

use super::Amp;
use crate::domain::entities::{HookKind, TransferContext, TransferKind};
use crate::domain::services::{destination_partition, interface_hash, labels};
use crate::domain::value_objects::{Address, Partition, PartitionPrefix, U256};
use crate::errors::{AmpError, HookError};
use crate::events::AmpEvent;
use crate::ports::outbound::KeyValueStore;
use amp_telemetry::{log_hook_event, log_transfer_event, HOOK_REJECTIONS};
use tracing::debug;

impl<S: KeyValueStore> Amp<S> {
    // =========================================================================
    // TRANSFER
    // =========================================================================

    /// Move `value` of `from`'s `from_partition` to `to`, returning the
    /// partition credited.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn execute_transfer(
        &mut self,
        kind: TransferKind,
        from_partition: Partition,
        operator: Address,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
        operator_data: &[u8],
    ) -> Result<Partition, AmpError> {
        if to.is_zero() {
            return Err(AmpError::InvalidReceiver);
        }

        if operator != from {
            self.authorize_transfer(from_partition, operator, from, value)?;
        }

        // The destination is a pure function of `data`; resolving it early
        // lets the pre-transfer hooks see where the tokens are headed.
        let to_partition = destination_partition(data, from_partition);
        let ctx = TransferContext {
            kind,
            from_partition,
            to_partition,
            operator,
            from,
            to,
            value,
            data: data.to_vec(),
            operator_data: operator_data.to_vec(),
        };

        self.call_pre_transfer_hooks(&ctx)?;

        // Hooks may have moved tokens out of the partition.
        let available = self.state.balance_of_by_partition(from_partition, from)?;
        if available < value {
            return Err(AmpError::InsufficientBalance {
                required: value,
                available,
            });
        }

        self.state.debit(from, from_partition, value)?;
        self.state.credit(to, to_partition, value)?;

        self.call_post_transfer_hooks(&ctx)?;

        self.emit(AmpEvent::Transfer { from, to, value });
        self.emit(AmpEvent::TransferByPartition {
            from_partition,
            operator,
            from,
            to,
            value,
            data: ctx.data.clone(),
            operator_data: ctx.operator_data.clone(),
        });
        if ctx.changes_partition() {
            self.emit(AmpEvent::ChangedPartition {
                from_partition,
                to_partition,
                value,
            });
        }

        log_transfer_event!(
            debug,
            "Transfer applied",
            from,
            to,
            value,
            kind = %kind,
            from_partition = %from_partition,
            to_partition = %to_partition
        );
        Ok(to_partition)
    }

    // =========================================================================
    // MINT
    // =========================================================================

    /// Issue `value` into the default partition of `to`.
    ///
    /// The issuer is privileged: no sender hook and no from-partition
    /// validation run. The post-transfer dispatch is the regular one.
    pub(crate) fn execute_mint(
        &mut self,
        operator: Address,
        to: Address,
        value: U256,
    ) -> Result<(), AmpError> {
        self.require_owner(operator)?;
        if to.is_zero() {
            return Err(AmpError::InvalidReceiver);
        }

        self.state.credit(to, Partition::DEFAULT, value)?;
        self.state.increase_total_supply(value)?;

        let ctx = TransferContext {
            kind: TransferKind::Mint,
            from_partition: Partition::DEFAULT,
            to_partition: Partition::DEFAULT,
            operator,
            from: Address::ZERO,
            to,
            value,
            data: Vec::new(),
            operator_data: Vec::new(),
        };
        self.call_post_transfer_hooks(&ctx)?;

        self.emit(AmpEvent::Minted {
            operator,
            to,
            value,
        });
        self.emit(AmpEvent::Transfer {
            from: Address::ZERO,
            to,
            value,
        });
        self.emit(AmpEvent::TransferByPartition {
            from_partition: Partition::DEFAULT,
            operator,
            from: Address::ZERO,
            to,
            value,
            data: Vec::new(),
            operator_data: Vec::new(),
        });

        log_transfer_event!(debug, "Tokens minted", Address::ZERO, to, value);
        Ok(())
    }

    // =========================================================================
    // HOOK DISPATCH
    // =========================================================================

    fn call_pre_transfer_hooks(&mut self, ctx: &TransferContext) -> Result<(), AmpError> {
        let sender_interface = interface_hash(labels::AMP_TOKENS_SENDER);
        if let Some(implementer) = self.implementer_of(ctx.from, sender_interface)? {
            let hook = self
                .directory
                .tokens_sender(implementer)?
                .ok_or_else(|| self.unresolved_implementer(HookKind::Sender, implementer))?;

            log_hook_event!(debug, "Calling sender hook", HookKind::Sender, implementer);
            hook.tokens_to_transfer(self, ctx)
                .map_err(|err| self.hook_failure(HookKind::Sender, implementer, err))?;
        }

        if let Some((implementer, validator)) =
            self.strategy_validator(ctx.from_partition.prefix(), HookKind::FromPartition)?
        {
            log_hook_event!(
                debug,
                "Validating source partition",
                HookKind::FromPartition,
                implementer
            );
            validator
                .validate_from_partition(self, ctx)
                .map_err(|err| self.hook_failure(HookKind::FromPartition, implementer, err))?;
        }
        Ok(())
    }

    fn call_post_transfer_hooks(&mut self, ctx: &TransferContext) -> Result<(), AmpError> {
        let to_prefix = ctx.to_partition.prefix();
        if self.is_strategy_prefix(to_prefix)? {
            if let Some((implementer, validator)) =
                self.strategy_validator(to_prefix, HookKind::ToPartition)?
            {
                log_hook_event!(
                    debug,
                    "Validating destination partition",
                    HookKind::ToPartition,
                    implementer
                );
                validator
                    .validate_to_partition(self, ctx)
                    .map_err(|err| self.hook_failure(HookKind::ToPartition, implementer, err))?;
            }
        } else if !to_prefix.is_zero() {
            return Err(AmpError::PartitionReserved(to_prefix));
        }

        let recipient_interface = interface_hash(labels::AMP_TOKENS_RECIPIENT);
        if let Some(implementer) = self.implementer_of(ctx.to, recipient_interface)? {
            let hook = self
                .directory
                .tokens_recipient(implementer)?
                .ok_or_else(|| self.unresolved_implementer(HookKind::Recipient, implementer))?;

            log_hook_event!(debug, "Calling recipient hook", HookKind::Recipient, implementer);
            hook.tokens_received(self, ctx)
                .map_err(|err| self.hook_failure(HookKind::Recipient, implementer, err))?;
        }
        Ok(())
    }

    fn is_strategy_prefix(&self, prefix: PartitionPrefix) -> Result<bool, AmpError> {
        if prefix.is_zero() {
            return Ok(false);
        }
        Ok(self
            .state
            .set_contains(super::SetId::PartitionStrategies, prefix.as_bytes())?)
    }

    /// Attribute a hook failure to its call site and count it.
    pub(crate) fn hook_failure(
        &self,
        hook: HookKind,
        implementer: Address,
        err: HookError,
    ) -> AmpError {
        HOOK_REJECTIONS.with_label_values(&[hook.as_str()]).inc();
        log_hook_event!(
            warn,
            "Hook rejected transfer",
            hook,
            implementer,
            reason = %err,
            depth = self.depth()
        );
        err.into_ledger_error(hook)
    }

    /// A directory entry that does not resolve to a callable instance.
    pub(crate) fn unresolved_implementer(&self, hook: HookKind, implementer: Address) -> AmpError {
        debug!(%hook, implementer = %implementer, "Implementer has no instance");
        self.hook_failure(
            hook,
            implementer,
            HookError::rejected(format!("implementer {implementer:?} cannot be called")),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

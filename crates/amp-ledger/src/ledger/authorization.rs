//! # Authorization Engine
//!
//! Decides whether an actor may move a holder's tokens, and manages the
//! operator grants and allowances it consults.
//!
//! An actor is authorized for `(partition, holder)` if any of:
//! 1. it is the holder, or a global operator of the holder
//! 2. it is a partition-scoped operator of the holder
//! 3. the strategy validator of the partition prefix grants it scope
//!
//! Failing that, an allowance covering the amount authorizes the transfer
//! and is consumed by it.

use super::Amp;
use crate::domain::entities::HookKind;
use crate::domain::value_objects::{Address, Partition, U256};
use crate::errors::AmpError;
use crate::events::AmpEvent;
use crate::ports::outbound::KeyValueStore;
use tracing::debug;

impl<S: KeyValueStore> Amp<S> {
    // =========================================================================
    // OPERATOR CHECKS
    // =========================================================================

    pub(crate) fn check_operator(&self, operator: Address, holder: Address) -> Result<bool, AmpError> {
        if operator == holder {
            return Ok(true);
        }
        Ok(self.state.operator_flag(holder, operator)?)
    }

    /// Global or partition-scoped grant, without strategy delegation.
    fn check_direct_partition_operator(
        &self,
        partition: Partition,
        operator: Address,
        holder: Address,
    ) -> Result<bool, AmpError> {
        if self.check_operator(operator, holder)? {
            return Ok(true);
        }
        Ok(self
            .state
            .partition_operator_flag(holder, partition, operator)?)
    }

    pub(crate) fn check_operator_for_partition(
        &self,
        partition: Partition,
        operator: Address,
        holder: Address,
    ) -> Result<bool, AmpError> {
        if self.check_direct_partition_operator(partition, operator, holder)? {
            return Ok(true);
        }

        let Some((implementer, validator)) =
            self.strategy_validator(partition.prefix(), HookKind::OperatorScope)?
        else {
            return Ok(false);
        };

        validator
            .is_operator_for_partition_scope(self, partition, operator, holder)
            .map_err(|err| self.hook_failure(HookKind::OperatorScope, implementer, err))
    }

    pub(crate) fn check_operator_for_collateral_manager(
        &self,
        partition: Partition,
        operator: Address,
        collateral_manager: Address,
    ) -> Result<bool, AmpError> {
        if !self
            .state
            .set_contains(super::SetId::CollateralManagers, collateral_manager.as_bytes())?
        {
            return Ok(false);
        }
        self.check_direct_partition_operator(partition, operator, collateral_manager)
    }

    pub(crate) fn can_move_by_allowance(
        &self,
        partition: Partition,
        holder: Address,
        operator: Address,
        amount: U256,
    ) -> Result<bool, AmpError> {
        Ok(self.state.allowance(partition, holder, operator)? >= amount)
    }

    /// Require `operator` to be authorized for `amount` of `holder`'s
    /// `partition`, consuming allowance when that is the only authorization.
    pub(crate) fn authorize_transfer(
        &mut self,
        partition: Partition,
        operator: Address,
        holder: Address,
        amount: U256,
    ) -> Result<(), AmpError> {
        if self.check_operator_for_partition(partition, operator, holder)? {
            return Ok(());
        }

        let allowance = self.state.allowance(partition, holder, operator)?;
        if !self.can_move_by_allowance(partition, holder, operator, amount)? {
            return Err(AmpError::InsufficientAllowance {
                required: amount,
                available: allowance,
            });
        }

        self.state
            .set_allowance(partition, holder, operator, allowance - amount)?;
        debug!(
            %partition,
            holder = %holder,
            spender = %operator,
            remaining = %(allowance - amount),
            "Allowance consumed"
        );
        Ok(())
    }

    // =========================================================================
    // ALLOWANCE MANAGEMENT
    // =========================================================================

    pub(crate) fn set_allowance_checked(
        &mut self,
        partition: Partition,
        owner: Address,
        spender: Address,
        value: U256,
    ) -> Result<(), AmpError> {
        if owner.is_zero() {
            return Err(AmpError::InvalidSender);
        }
        if spender.is_zero() {
            return Err(AmpError::InvalidOperator);
        }

        self.state.set_allowance(partition, owner, spender, value)?;
        self.emit(AmpEvent::ApprovalByPartition {
            partition,
            owner,
            spender,
            value,
        });
        if partition.is_default() {
            self.emit(AmpEvent::Approval {
                owner,
                spender,
                value,
            });
        }
        Ok(())
    }

    pub(crate) fn increase_allowance_in(
        &mut self,
        partition: Partition,
        owner: Address,
        spender: Address,
        added_value: U256,
    ) -> Result<(), AmpError> {
        let current = self.state.allowance(partition, owner, spender)?;
        let updated = current
            .checked_add(added_value)
            .ok_or(AmpError::ArithmeticOverflow)?;
        self.set_allowance_checked(partition, owner, spender, updated)
    }

    pub(crate) fn decrease_allowance_in(
        &mut self,
        partition: Partition,
        owner: Address,
        spender: Address,
        subtracted_value: U256,
    ) -> Result<(), AmpError> {
        let current = self.state.allowance(partition, owner, spender)?;
        let updated = current
            .checked_sub(subtracted_value)
            .ok_or(AmpError::InsufficientAllowance {
                required: subtracted_value,
                available: current,
            })?;
        self.set_allowance_checked(partition, owner, spender, updated)
    }

    // =========================================================================
    // OPERATOR MANAGEMENT
    // =========================================================================

    fn check_operator_target(holder: Address, operator: Address) -> Result<(), AmpError> {
        if holder.is_zero() {
            return Err(AmpError::InvalidSender);
        }
        if operator.is_zero() || operator == holder {
            return Err(AmpError::InvalidOperator);
        }
        Ok(())
    }

    pub(crate) fn grant_operator(&mut self, holder: Address, operator: Address) -> Result<(), AmpError> {
        Self::check_operator_target(holder, operator)?;
        self.state.set_operator_flag(holder, operator, true)?;
        self.emit(AmpEvent::AuthorizedOperator { operator, holder });
        Ok(())
    }

    pub(crate) fn withdraw_operator(&mut self, holder: Address, operator: Address) -> Result<(), AmpError> {
        Self::check_operator_target(holder, operator)?;
        self.state.set_operator_flag(holder, operator, false)?;
        self.emit(AmpEvent::RevokedOperator { operator, holder });
        Ok(())
    }

    pub(crate) fn grant_partition_operator(
        &mut self,
        holder: Address,
        partition: Partition,
        operator: Address,
    ) -> Result<(), AmpError> {
        Self::check_operator_target(holder, operator)?;
        self.state
            .set_partition_operator_flag(holder, partition, operator, true)?;
        self.emit(AmpEvent::AuthorizedOperatorByPartition {
            partition,
            operator,
            holder,
        });
        Ok(())
    }

    pub(crate) fn withdraw_partition_operator(
        &mut self,
        holder: Address,
        partition: Partition,
        operator: Address,
    ) -> Result<(), AmpError> {
        Self::check_operator_target(holder, operator)?;
        self.state
            .set_partition_operator_flag(holder, partition, operator, false)?;
        self.emit(AmpEvent::RevokedOperatorByPartition {
            partition,
            operator,
            holder,
        });
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

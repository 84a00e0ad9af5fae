//! # Ownership
//!
//! Two-phase ownership transfer. The owner is the issuer and the only
//! account allowed to bind partition strategies.
//!
//! ```text
//! owner ──authorize_ownership_transfer(x)──→ [x nominated] ──assume_ownership (by x)──→ owner = x
//! ```

use super::{Amp, LedgerKey};
use crate::domain::value_objects::Address;
use crate::errors::AmpError;
use crate::events::AmpEvent;
use crate::ports::outbound::KeyValueStore;
use amp_telemetry::log_event;

impl<S: KeyValueStore> Amp<S> {
    /// Fail with `Unauthorized` unless `caller` is the current owner.
    pub(crate) fn require_owner(&self, caller: Address) -> Result<(), AmpError> {
        let owner = self.state.get_address(&LedgerKey::Owner)?;
        if owner.is_zero() || caller != owner {
            return Err(AmpError::Unauthorized(caller));
        }
        Ok(())
    }

    pub(crate) fn nominate_owner(
        &mut self,
        caller: Address,
        authorized_address: Address,
    ) -> Result<(), AmpError> {
        self.require_owner(caller)?;
        self.state
            .put_address(&LedgerKey::AuthorizedNewOwner, authorized_address)?;
        self.emit(AmpEvent::OwnershipTransferAuthorization { authorized_address });
        Ok(())
    }

    pub(crate) fn accept_ownership(&mut self, caller: Address) -> Result<(), AmpError> {
        let nominated = self.state.get_address(&LedgerKey::AuthorizedNewOwner)?;
        if nominated.is_zero() || caller != nominated {
            return Err(AmpError::Unauthorized(caller));
        }

        let old_value = self.state.get_address(&LedgerKey::Owner)?;
        self.state.put_address(&LedgerKey::Owner, caller)?;
        self.state
            .put_address(&LedgerKey::AuthorizedNewOwner, Address::ZERO)?;
        self.emit(AmpEvent::OwnerUpdate {
            old_value,
            new_value: caller,
        });
        log_event!(info, "ownership", "Ownership assumed", old = %old_value, new = %caller);
        Ok(())
    }
}

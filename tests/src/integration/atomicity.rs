//! # Atomicity and Reentrancy
//!
//! Every operation either commits in full or leaves the store byte-for-byte
//! unchanged, including when hooks re-enter the ledger.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{
        account, lock_partition, plain_partition, Forwarder, Harness, Refuse, ISSUER,
    };
    use amp_ledger::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    // =============================================================================
    // HOOK VETOES
    // =============================================================================

    #[test]
    fn test_recipient_veto_leaves_state_untouched() {
        let a = account(1);
        let b = account(2);
        let spender = account(3);
        let mut h = Harness::new(&[(a, 500)]);
        h.amp.approve(a, spender, U256::from(100)).unwrap();
        h.register_recipient(b, account(0xb0), Arc::new(Refuse));
        let before = h.amp.store().snapshot();
        let published = h.events.len();

        let err = h
            .amp
            .transfer_by_partition(
                spender,
                Partition::DEFAULT,
                a,
                b,
                U256::from(60),
                &change_partition_data(plain_partition(1)),
                &[],
            )
            .unwrap_err();

        assert!(matches!(
            err,
            AmpError::HookRejected {
                hook: HookKind::Recipient,
                ..
            }
        ));
        // Balances, allowance and partition sets are all restored
        assert_eq!(h.amp.store().snapshot(), before);
        assert_eq!(h.amp.allowance(a, spender).unwrap(), U256::from(100));
        assert_eq!(h.events.len(), published);
    }

    #[test]
    fn test_sender_veto_blocks_every_entry_point() {
        let a = account(1);
        let b = account(2);
        let mut h = Harness::new(&[(a, 500)]);
        h.amp.authorize_operator(a, b).unwrap();
        h.register_sender(a, account(0xa0), Arc::new(Refuse));

        assert!(h.amp.transfer(a, b, U256::one()).is_err());
        assert!(h.amp.transfer_from(b, a, b, U256::one()).is_err());
        assert!(h
            .amp
            .transfer_by_partition(b, Partition::DEFAULT, a, b, U256::one(), &[], &[])
            .is_err());
        assert_eq!(h.amp.balance_of(a).unwrap(), U256::from(500));

        // Opting out restores transfers
        h.directory
            .set_interface_implementer(a, interface_hash(labels::AMP_TOKENS_SENDER), Address::ZERO)
            .unwrap();
        assert!(h.amp.transfer(a, b, U256::one()).unwrap());
    }

    #[test]
    fn test_mint_rolls_back_on_recipient_veto() {
        let b = account(2);
        let mut h = Harness::new(&[]);
        h.register_recipient(b, account(0xb0), Arc::new(Refuse));

        assert!(h.amp.mint(ISSUER, b, U256::from(10)).is_err());
        assert_eq!(h.amp.total_supply().unwrap(), U256::zero());
        assert!(h.amp.partitions_of(b).unwrap().is_empty());
    }

    /// Zero-value transfers move nothing but still run hooks and emit events.
    #[test]
    fn test_zero_value_transfer_is_observable() {
        let a = account(1);
        let b = account(2);
        let mut h = Harness::new(&[(a, 5)]);
        let before = h.amp.store().snapshot();
        h.events.clear();

        h.amp
            .transfer_by_partition(a, Partition::DEFAULT, a, b, U256::zero(), &[], &[])
            .unwrap();
        assert_eq!(h.amp.store().snapshot(), before);
        assert_eq!(h.events.len(), 2);

        h.register_recipient(b, account(0xb0), Arc::new(Refuse));
        assert!(h
            .amp
            .transfer_by_partition(a, Partition::DEFAULT, a, b, U256::zero(), &[], &[])
            .is_err());
    }

    // =============================================================================
    // REENTRANCY
    // =============================================================================

    #[test]
    fn test_reentrant_recipient_forwards_in_one_transaction() {
        let a = account(1);
        let vault = account(2);
        let sink = account(3);
        let mut h = Harness::new(&[(a, 100)]);
        h.register_recipient(vault, account(0xf0), Arc::new(Forwarder { sink }));
        h.events.clear();

        h.amp.transfer(a, vault, U256::from(40)).unwrap();

        assert_eq!(h.amp.balance_of(vault).unwrap(), U256::zero());
        assert_eq!(h.amp.balance_of(sink).unwrap(), U256::from(40));
        assert_eq!(h.amp.depth(), 0);
        // Inner transfer commits with the outer one, and its events come first
        let transfers = h.events.with_name(topics::TRANSFER);
        assert_eq!(transfers.len(), 2);
        assert!(matches!(
            &transfers[0],
            AmpEvent::Transfer { from, to, .. } if *from == vault && *to == sink
        ));
        h.assert_invariants(&[a, vault, sink]);
    }

    #[test]
    fn test_reentrant_failure_unwinds_outer_transfer() {
        let a = account(1);
        let vault = account(2);
        let sink = account(3);
        let mut h = Harness::new(&[(a, 100)]);
        h.register_recipient(vault, account(0xf0), Arc::new(Forwarder { sink }));
        h.register_recipient(sink, account(0xf1), Arc::new(Refuse));
        let before = h.amp.store().snapshot();

        let err = h.amp.transfer(a, vault, U256::from(40)).unwrap_err();

        // The vault's hook saw the sink's veto through its own reentrant call
        assert!(matches!(
            err,
            AmpError::HookRejected {
                hook: HookKind::Recipient,
                ..
            }
        ));
        assert_eq!(h.amp.store().snapshot(), before);
        assert_eq!(h.amp.depth(), 0);
    }

    // =============================================================================
    // RANDOMIZED INVARIANTS
    // =============================================================================

    /// Random mix of transfers, partition moves, approvals and locks; every
    /// step either fails cleanly or keeps the accounting consistent.
    #[test]
    fn test_random_operations_preserve_invariants() {
        let holders: Vec<_> = (1..=6).map(account).collect();
        let manager = account(60);
        let allocations: Vec<_> = holders.iter().map(|h| (*h, 1_000)).collect();
        let (mut h, _) = Harness::new(&allocations).with_lock_strategy();
        h.amp.register_collateral_manager(manager).unwrap();

        let mut everyone = holders.clone();
        everyone.push(manager);
        let partitions = [
            Partition::DEFAULT,
            plain_partition(1),
            plain_partition(2),
            lock_partition(manager),
        ];

        let mut rng = StdRng::seed_from_u64(0xA4D);
        let mut committed = 0;
        for _ in 0..400 {
            let from = holders[rng.gen_range(0..holders.len())];
            let to = everyone[rng.gen_range(0..everyone.len())];
            let value = U256::from(rng.gen_range(0..300u64));
            let before = h.amp.store().snapshot();

            let result = match rng.gen_range(0..4) {
                0 => h.amp.transfer(from, to, value).map(|_| ()),
                1 => {
                    let source = partitions[rng.gen_range(0..partitions.len())];
                    let target = partitions[rng.gen_range(0..partitions.len())];
                    h.amp
                        .transfer_by_partition(
                            from,
                            source,
                            from,
                            to,
                            value,
                            &change_partition_data(target),
                            &[],
                        )
                        .map(|_| ())
                }
                2 => h.amp.approve(from, to, value).map(|_| ()),
                _ => {
                    let spender = everyone[rng.gen_range(0..everyone.len())];
                    h.amp.transfer_from(spender, from, to, value).map(|_| ())
                }
            };

            match result {
                Ok(()) => committed += 1,
                Err(_) => assert_eq!(h.amp.store().snapshot(), before),
            }
            h.assert_invariants(&everyone);
        }

        assert!(committed > 0);
        assert_eq!(h.amp.total_supply().unwrap(), U256::from(6_000));
        assert_eq!(h.amp.depth(), 0);
    }
}

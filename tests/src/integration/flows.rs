//! # Integration Test Flows
//!
//! End-to-end transfer scenarios across the ledger, the directory and the
//! service wrapper.
//!
//! ## Flows Tested:
//!
//! 1. **Issuance → partition change → return**: partition lifecycle in the active set
//! 2. **ERC-20 surface**: default-partition parity of `transfer`/`transferFrom`/allowances
//! 3. **Operators**: global and partition-scoped grants and revocations
//! 4. **Service**: request payloads through `AmpService` under the single-writer lock

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{account, plain_partition, Harness, ISSUER};
    use amp_ledger::prelude::*;
    use std::time::Duration;
    use uuid::Uuid;

    // =============================================================================
    // PARTITION LIFECYCLE
    // =============================================================================

    /// Mint, move 300 into a fresh partition for another holder, move it back.
    #[test]
    fn test_partition_lifecycle_scenario() {
        let a = account(1);
        let b = account(2);
        let p = plain_partition(7);
        let mut h = Harness::new(&[]);

        // Mint 1000 to A
        h.amp.mint(ISSUER, a, U256::from(1000)).unwrap();
        assert_eq!(h.amp.balance_of(a).unwrap(), U256::from(1000));
        assert_eq!(
            h.amp.total_supply_by_partition(Partition::DEFAULT).unwrap(),
            U256::from(1000)
        );
        assert_eq!(h.amp.total_partitions().unwrap(), vec![Partition::DEFAULT]);

        // A → B, default → P
        let to = h
            .amp
            .transfer_by_partition(
                a,
                Partition::DEFAULT,
                a,
                b,
                U256::from(300),
                &change_partition_data(p),
                &[],
            )
            .unwrap();
        assert_eq!(to, p);
        assert_eq!(
            h.amp.balance_of_by_partition(Partition::DEFAULT, a).unwrap(),
            U256::from(700)
        );
        assert_eq!(h.amp.balance_of_by_partition(p, b).unwrap(), U256::from(300));
        let active = h.amp.total_partitions().unwrap();
        assert!(active.contains(&Partition::DEFAULT));
        assert!(active.contains(&p));
        h.assert_invariants(&[a, b]);

        // B moves all 300 back to default
        h.amp
            .transfer_by_partition(
                b,
                p,
                b,
                b,
                U256::from(300),
                &change_partition_data(Partition::DEFAULT),
                &[],
            )
            .unwrap();
        assert!(!h.amp.total_partitions().unwrap().contains(&p));
        assert!(!h.amp.partitions_of(b).unwrap().contains(&p));
        assert_eq!(h.amp.balance_of(b).unwrap(), U256::from(300));
        h.assert_invariants(&[a, b]);
    }

    /// Event stream for a partition-changing transfer.
    #[test]
    fn test_partition_change_events() {
        let a = account(1);
        let b = account(2);
        let p = plain_partition(3);
        let mut h = Harness::new(&[(a, 50)]);
        h.events.clear();

        h.amp
            .transfer_by_partition(
                a,
                Partition::DEFAULT,
                a,
                b,
                U256::from(20),
                &change_partition_data(p),
                b"memo",
            )
            .unwrap();

        let names: Vec<_> = h.events.events().iter().map(AmpEvent::name).collect();
        assert_eq!(
            names,
            vec![
                topics::TRANSFER,
                topics::TRANSFER_BY_PARTITION,
                topics::CHANGED_PARTITION
            ]
        );
        match &h.events.with_name(topics::TRANSFER_BY_PARTITION)[0] {
            AmpEvent::TransferByPartition {
                from_partition,
                operator,
                operator_data,
                ..
            } => {
                assert_eq!(*from_partition, Partition::DEFAULT);
                assert_eq!(*operator, a);
                assert_eq!(operator_data, b"memo");
            }
            other => panic!("Expected TransferByPartition, got {other:?}"),
        }
    }

    /// Data shorter than the flag plus a partition never changes partition.
    #[test]
    fn test_short_flag_data_keeps_partition() {
        let a = account(1);
        let b = account(2);
        let mut h = Harness::new(&[(a, 10)]);

        let data = change_partition_data(plain_partition(9));
        let to = h
            .amp
            .transfer_by_partition(a, Partition::DEFAULT, a, b, U256::one(), &data[..63], &[])
            .unwrap();
        assert_eq!(to, Partition::DEFAULT);
        assert_eq!(h.amp.total_partitions().unwrap(), vec![Partition::DEFAULT]);
    }

    // =============================================================================
    // ERC-20 SURFACE
    // =============================================================================

    #[test]
    fn test_erc20_surface_on_default_partition() {
        let a = account(1);
        let b = account(2);
        let spender = account(3);
        let mut h = Harness::new(&[(a, 1000)]);

        assert_eq!(h.amp.name(), "Amp");
        assert_eq!(h.amp.decimals(), 18);
        assert_eq!(h.amp.granularity(), U256::one());

        assert!(h.amp.transfer(a, b, U256::from(100)).unwrap());
        assert!(h.amp.approve(a, spender, U256::from(250)).unwrap());
        assert_eq!(
            h.amp
                .allowance_by_partition(Partition::DEFAULT, a, spender)
                .unwrap(),
            U256::from(250)
        );

        assert!(h.amp.transfer_from(spender, a, b, U256::from(200)).unwrap());
        assert_eq!(h.amp.allowance(a, spender).unwrap(), U256::from(50));
        assert_eq!(h.amp.balance_of(a).unwrap(), U256::from(700));
        assert_eq!(h.amp.balance_of(b).unwrap(), U256::from(300));

        assert!(h.amp.increase_allowance(a, spender, U256::from(25)).unwrap());
        assert!(h.amp.decrease_allowance(a, spender, U256::from(75)).unwrap());
        assert_eq!(h.amp.allowance(a, spender).unwrap(), U256::zero());
        h.assert_invariants(&[a, b, spender]);
    }

    /// 200-unit allowance, 300-unit attempt: fails, allowance unchanged.
    #[test]
    fn test_allowance_shortfall_scenario() {
        let a = account(1);
        let spender = account(3);
        let mut h = Harness::new(&[(a, 1000)]);
        h.amp.approve(a, spender, U256::from(200)).unwrap();

        let err = h
            .amp
            .transfer_from(spender, a, spender, U256::from(300))
            .unwrap_err();
        assert_eq!(
            err,
            AmpError::InsufficientAllowance {
                required: U256::from(300),
                available: U256::from(200)
            }
        );
        assert_eq!(h.amp.allowance(a, spender).unwrap(), U256::from(200));
        assert_eq!(h.amp.balance_of(a).unwrap(), U256::from(1000));
    }

    #[test]
    fn test_partition_allowance_is_isolated() {
        let a = account(1);
        let spender = account(3);
        let p = plain_partition(1);
        let mut h = Harness::new(&[(a, 100)]);
        h.amp
            .transfer_by_partition(
                a,
                Partition::DEFAULT,
                a,
                a,
                U256::from(40),
                &change_partition_data(p),
                &[],
            )
            .unwrap();
        h.amp
            .approve_by_partition(a, p, spender, U256::from(40))
            .unwrap();

        // Partition allowance does not cover the default partition
        assert!(h.amp.transfer_from(spender, a, spender, U256::one()).is_err());

        h.amp
            .transfer_by_partition(spender, p, a, spender, U256::from(40), &[], &[])
            .unwrap();
        assert_eq!(
            h.amp.allowance_by_partition(p, a, spender).unwrap(),
            U256::zero()
        );
        assert_eq!(h.amp.balance_of_by_partition(p, spender).unwrap(), U256::from(40));
    }

    // =============================================================================
    // OPERATORS
    // =============================================================================

    #[test]
    fn test_operator_grants_and_revocations() {
        let a = account(1);
        let op = account(4);
        let p = plain_partition(2);
        let mut h = Harness::new(&[(a, 100)]);
        h.amp
            .transfer_by_partition(
                a,
                Partition::DEFAULT,
                a,
                a,
                U256::from(30),
                &change_partition_data(p),
                &[],
            )
            .unwrap();

        // Partition-scoped grant
        h.amp.authorize_operator_by_partition(a, p, op).unwrap();
        assert!(h.amp.is_operator_for_partition(p, op, a).unwrap());
        assert!(!h.amp.is_operator(op, a).unwrap());
        h.amp
            .transfer_by_partition(op, p, a, op, U256::from(10), &[], &[])
            .unwrap();
        assert!(h
            .amp
            .transfer_by_partition(op, Partition::DEFAULT, a, op, U256::one(), &[], &[])
            .is_err());

        // Global grant covers every partition
        h.amp.authorize_operator(a, op).unwrap();
        h.amp
            .transfer_by_partition(op, Partition::DEFAULT, a, op, U256::from(5), &[], &[])
            .unwrap();

        h.amp.revoke_operator(a, op).unwrap();
        h.amp.revoke_operator_by_partition(a, p, op).unwrap();
        assert!(!h.amp.is_operator_for_partition(p, op, a).unwrap());
        assert_eq!(h.amp.balance_of(op).unwrap(), U256::from(15));

        let names: Vec<_> = h.events.events().iter().map(AmpEvent::name).collect();
        assert!(names.contains(&topics::AUTHORIZED_OPERATOR_BY_PARTITION));
        assert!(names.contains(&topics::REVOKED_OPERATOR));
    }

    #[test]
    fn test_self_operator_is_rejected() {
        let a = account(1);
        let mut h = Harness::new(&[(a, 1)]);
        assert_eq!(
            h.amp.authorize_operator(a, a).unwrap_err(),
            AmpError::InvalidOperator
        );
        assert!(h.amp.is_operator(a, a).unwrap());
    }

    // =============================================================================
    // ADMINISTRATION
    // =============================================================================

    #[test]
    fn test_ownership_handover_moves_issuance_rights() {
        let a = account(1);
        let successor = account(9);
        let mut h = Harness::new(&[]);

        h.amp
            .authorize_ownership_transfer(ISSUER, successor)
            .unwrap();
        assert_eq!(h.amp.authorized_new_owner().unwrap(), successor);
        assert!(h.amp.assume_ownership(a).is_err());
        h.amp.assume_ownership(successor).unwrap();

        assert_eq!(h.amp.owner().unwrap(), successor);
        assert_eq!(
            h.amp.mint(ISSUER, a, U256::one()).unwrap_err(),
            AmpError::Unauthorized(ISSUER)
        );
        h.amp.mint(successor, a, U256::one()).unwrap();
        assert_eq!(h.amp.total_supply().unwrap(), U256::one());
    }

    // =============================================================================
    // TELEMETRY
    // =============================================================================

    #[test]
    fn test_committed_activity_is_exported() {
        let a = account(1);
        let mut h = Harness::new(&[(a, 10)]);
        let _handle = amp_telemetry::register_metrics();

        h.amp
            .transfer_by_partition(
                a,
                Partition::DEFAULT,
                a,
                a,
                U256::one(),
                &change_partition_data(plain_partition(8)),
                &[],
            )
            .unwrap();

        let text = amp_telemetry::encode_metrics().unwrap();
        assert!(text.contains("amp_ledger_transfers_total"));
        assert!(text.contains("amp_ledger_partition_changes_total"));
        assert!(text.contains("amp_supply_active_partitions"));
    }

    // =============================================================================
    // SERVICE
    // =============================================================================

    fn service(allocations: &[(Address, u64)]) -> AmpService<InMemoryStore> {
        AmpService::new(Harness::new(allocations).amp, ServiceConfig::default())
    }

    #[tokio::test]
    async fn test_service_request_flow() {
        let a = account(1);
        let b = account(2);
        let p = plain_partition(5);
        let svc = service(&[]);

        svc.handle_mint(
            Uuid::new_v4(),
            MintRequestPayload {
                caller: ISSUER,
                to: a,
                value: U256::from(500),
            },
        )
        .await
        .unwrap();

        let response = svc
            .handle_transfer_by_partition(
                Uuid::new_v4(),
                TransferByPartitionRequestPayload {
                    caller: a,
                    partition: Partition::DEFAULT,
                    from: a,
                    to: b,
                    value: U256::from(120),
                    data: change_partition_data(p),
                    operator_data: Vec::new(),
                },
            )
            .await
            .unwrap();
        assert_eq!(response.to_partition, p);

        svc.handle_transfer(
            Uuid::new_v4(),
            TransferRequestPayload {
                caller: a,
                to: b,
                value: U256::from(80),
            },
        )
        .await
        .unwrap();

        assert_eq!(svc.balance_of(a).await.unwrap(), U256::from(300));
        assert_eq!(svc.balance_of_by_partition(p, b).await.unwrap(), U256::from(120));
        assert_eq!(svc.partitions_of(b).await.unwrap().len(), 2);
        assert_eq!(svc.total_supply().await.unwrap(), U256::from(500));

        let stats = svc.stats().await;
        assert_eq!(stats.operations, 3);
        assert_eq!(stats.successful_operations, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_service_concurrent_holders_keep_supply() {
        let holders: Vec<_> = (1..=8).map(account).collect();
        let allocations: Vec<_> = holders.iter().map(|h| (*h, 100)).collect();
        let svc = service(&allocations);

        let mut tasks = Vec::new();
        for (i, from) in holders.iter().enumerate() {
            let svc = svc.clone();
            let from = *from;
            let to = holders[(i + 1) % holders.len()];
            tasks.push(tokio::spawn(async move {
                for _ in 0..10 {
                    svc.handle_transfer(
                        Uuid::new_v4(),
                        TransferRequestPayload {
                            caller: from,
                            to,
                            value: U256::from(3),
                        },
                    )
                    .await
                    .unwrap();
                }
            }));
        }
        for task in tasks {
            tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .expect("transfer task timed out")
                .unwrap();
        }

        assert_eq!(svc.total_supply().await.unwrap(), U256::from(800));
        let ring_balances = svc
            .query("invariants", |amp| check_all_invariants(amp, &holders))
            .await
            .unwrap();
        assert!(ring_balances.is_valid());
        for holder in &holders {
            assert_eq!(svc.balance_of(*holder).await.unwrap(), U256::from(100));
        }
    }
}

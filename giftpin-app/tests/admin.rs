use giftpin_app::{AdminDashboard, FlowError, WalletSession};
use giftpin_contract::{GiftContractClient, U256};
use giftpin_core::{hash_pin, Error, GiftId};
use giftpin_test_fixtures::{admin, alice, bob, contract_address, FakeGiftContract};

fn ether(n: u64) -> U256 {
    U256::exp10(18) * U256::from(n)
}

fn seeded() -> FakeGiftContract {
    let fake = FakeGiftContract::default();
    fake.seed_gift(alice(), ether(1), "1111", "one");
    fake.seed_gift(alice(), ether(2), "2222", "two");
    fake.seed_gift(bob(), ether(3), "3333", "three");
    fake
}

fn admin_client(fake: &FakeGiftContract) -> GiftContractClient<FakeGiftContract> {
    GiftContractClient::new(fake.connect(admin()), contract_address())
}

#[tokio::test]
async fn non_admin_is_denied() {
    let fake = seeded();
    let client = GiftContractClient::new(fake.connect(alice()), contract_address());
    let session = WalletSession::connected(alice());

    let err = AdminDashboard::open(&client, &session).await.err();
    assert_eq!(err, Some(FlowError::AccessDenied));
}

#[tokio::test]
async fn disconnected_wallet_is_denied() {
    let fake = seeded();
    let client = GiftContractClient::new(fake.disconnected(), contract_address());
    let session = WalletSession::disconnected();

    let err = AdminDashboard::open(&client, &session).await.err();
    assert_eq!(err, Some(FlowError::WalletNotConnected));
    assert!(fake.recorded_calls().is_empty());
}

#[tokio::test]
async fn overview_reports_stats() {
    let fake = seeded();
    let client = admin_client(&fake);
    let session = WalletSession::connected(admin());
    let dashboard = AdminDashboard::open(&client, &session).await.unwrap();
    assert_eq!(dashboard.account(), admin());

    let overview = dashboard.overview().await.unwrap();
    assert_eq!(overview.admin, admin());
    assert!(!overview.paused);
    assert_eq!(overview.balance, ether(6));
    assert_eq!(overview.stats.total_gifts_created, U256::from(3));
    assert_eq!(overview.stats.total_gifts_claimed, U256::zero());
    assert_eq!(overview.stats.total_value_locked, ether(6));
    assert_eq!(overview.stats.total_creators, U256::from(2));
    assert_eq!(overview.stats.unclaimed_gifts, U256::from(3));
}

#[tokio::test]
async fn toggle_pause_flips_state() {
    let fake = seeded();
    let client = admin_client(&fake);
    let session = WalletSession::connected(admin());
    let dashboard = AdminDashboard::open(&client, &session).await.unwrap();

    assert!(dashboard.toggle_pause().await.unwrap());
    assert!(dashboard.overview().await.unwrap().paused);
    assert!(!dashboard.toggle_pause().await.unwrap());
    assert_eq!(fake.send_count(), 2);
}

#[tokio::test]
async fn emergency_withdraw_moves_balance() {
    let fake = seeded();
    let client = admin_client(&fake);
    let session = WalletSession::connected(admin());
    let dashboard = AdminDashboard::open(&client, &session).await.unwrap();

    let recipient = format!("{:?}", bob());
    dashboard.emergency_withdraw(&recipient).await.unwrap();
    assert_eq!(fake.balance(), U256::zero());
    assert_eq!(fake.paid_to(bob()), ether(6));
}

#[tokio::test]
async fn invalid_addresses_are_rejected_before_sending() {
    let fake = seeded();
    let client = admin_client(&fake);
    let session = WalletSession::connected(admin());
    let dashboard = AdminDashboard::open(&client, &session).await.unwrap();

    for input in ["", "0x1234", "not-an-address", "1234567890123456789012345678901234567890"] {
        let err = dashboard.emergency_withdraw(input).await.unwrap_err();
        assert!(
            matches!(err, FlowError::Validation(Error::InvalidAddress(_))),
            "{input}: {err:?}"
        );
        let err = dashboard.change_admin(input).await.unwrap_err();
        assert!(matches!(err, FlowError::Validation(Error::InvalidAddress(_))));
    }
    assert_eq!(fake.send_count(), 0);
}

#[tokio::test]
async fn change_admin_hands_over_the_role() {
    let fake = seeded();
    let client = admin_client(&fake);
    let session = WalletSession::connected(admin());
    let dashboard = AdminDashboard::open(&client, &session).await.unwrap();

    dashboard.change_admin(&format!("{:?}", alice())).await.unwrap();
    assert_eq!(fake.current_admin(), alice());

    // The old admin no longer gets in.
    let err = AdminDashboard::open(&client, &session).await.err();
    assert_eq!(err, Some(FlowError::AccessDenied));

    let alice_client = GiftContractClient::new(fake.connect(alice()), contract_address());
    let alice_session = WalletSession::connected(alice());
    assert!(AdminDashboard::open(&alice_client, &alice_session).await.is_ok());
}

#[tokio::test]
async fn privileged_gift_lookup_includes_pin_hash() {
    let fake = seeded();
    let client = admin_client(&fake);
    let session = WalletSession::connected(admin());
    let dashboard = AdminDashboard::open(&client, &session).await.unwrap();

    let record = dashboard.gift(GiftId(2)).await.unwrap();
    assert_eq!(record.record.id, GiftId(2));
    assert_eq!(record.record.amount, ether(2));
    assert_eq!(record.record.message, "two");
    assert_eq!(record.pin_hash, hash_pin("2222"));

    assert_eq!(dashboard.gift(GiftId(99)).await.unwrap_err(), FlowError::NotFound);
}

#[tokio::test]
async fn batch_skips_absent_ids() {
    let fake = seeded();
    let client = admin_client(&fake);
    let session = WalletSession::connected(admin());
    let dashboard = AdminDashboard::open(&client, &session).await.unwrap();

    let records = dashboard.batch(GiftId(2), 5).await.unwrap();
    let ids: Vec<GiftId> = records.iter().map(|r| r.record.id).collect();
    assert_eq!(ids, vec![GiftId(2), GiftId(3)]);
    assert_eq!(records[1].record.creator, bob());

    assert_eq!(
        dashboard.batch(GiftId(1), 0).await.unwrap_err(),
        FlowError::EmptyBatch
    );
}

use ethers::signers::{LocalWallet, Signer};
use giftpin_app::{
    CodeRegistry, CodeScheme, CreateFlow, CreateStep, FlowError, GiftCodeBook, GiftDraft,
    WalletSession,
};
use giftpin_contract::{ContractError, GetGift, GiftContractClient, U256};
use giftpin_core::{encode_gift_id, is_valid_random_code, Error, GiftId};
use giftpin_test_fixtures::{contract_address, CallKind, FakeGiftContract};
use rand::{rngs::StdRng, SeedableRng};

const BASE_URL: &str = "https://giftpin.app";

fn ether_tenth() -> U256 {
    U256::from(100_000_000_000_000_000u64)
}

fn wallet() -> LocalWallet {
    LocalWallet::new(&mut StdRng::seed_from_u64(42))
}

async fn signed_in(wallet: &LocalWallet) -> WalletSession {
    let mut session = WalletSession::connected(wallet.address());
    session.sign_in(wallet).await.unwrap();
    session
}

#[tokio::test]
async fn invalid_drafts_never_reach_the_contract() {
    let wallet = wallet();
    let fake = FakeGiftContract::default();
    let client = GiftContractClient::new(fake.connect(wallet.address()), contract_address());
    let session = signed_in(&wallet).await;
    let mut book = GiftCodeBook::deterministic();
    let mut flow = CreateFlow::new(&client, &mut book, &session, BASE_URL);

    let err = flow.submit(&GiftDraft::new("0", "1234", "")).await.unwrap_err();
    assert!(matches!(err, FlowError::Validation(Error::InvalidAmount(_))));

    let err = flow.submit(&GiftDraft::new("0.1", "123", "")).await.unwrap_err();
    assert!(matches!(err, FlowError::Validation(Error::PinTooShort(4))));

    let err = flow
        .submit(&GiftDraft::new("0.1", "1234", "x".repeat(201)))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Validation(Error::MessageTooLong(_))));

    assert_eq!(flow.step(), &CreateStep::Draft);
    assert!(flow.error().is_some());
    assert!(fake.recorded_calls().is_empty());
}

#[tokio::test]
async fn creation_requires_sign_in() {
    let wallet = wallet();
    let fake = FakeGiftContract::default();
    let client = GiftContractClient::new(fake.connect(wallet.address()), contract_address());
    let session = WalletSession::connected(wallet.address());
    let mut book = GiftCodeBook::deterministic();
    let mut flow = CreateFlow::new(&client, &mut book, &session, BASE_URL);

    let err = flow
        .submit(&GiftDraft::new("0.1", "1234", ""))
        .await
        .unwrap_err();
    assert_eq!(err, FlowError::NotSignedIn);
    assert!(fake.recorded_calls().is_empty());
}

#[tokio::test]
async fn disconnected_session_is_rejected() {
    let fake = FakeGiftContract::default();
    let client = GiftContractClient::new(fake.disconnected(), contract_address());
    let session = WalletSession::disconnected();
    let mut book = GiftCodeBook::deterministic();
    let mut flow = CreateFlow::new(&client, &mut book, &session, BASE_URL);

    let err = flow
        .submit(&GiftDraft::new("0.1", "1234", ""))
        .await
        .unwrap_err();
    assert_eq!(err, FlowError::WalletNotConnected);
    assert_eq!(fake.send_count(), 0);
}

#[tokio::test]
async fn creates_gift_with_deterministic_code() {
    let wallet = wallet();
    let fake = FakeGiftContract::default().with_next_id(100);
    let client = GiftContractClient::new(fake.connect(wallet.address()), contract_address());
    let session = signed_in(&wallet).await;
    let mut book = GiftCodeBook::deterministic();
    let mut flow = CreateFlow::new(&client, &mut book, &session, BASE_URL);

    let draft = GiftDraft::new("0.1", "1234", "  Merry Christmas  ");
    let tx_hash = flow.submit(&draft).await.unwrap();
    assert!(matches!(flow.step(), CreateStep::Confirming { .. }));

    let created = flow.confirm().await.unwrap();
    assert_eq!(created.id, GiftId(100));
    assert_eq!(created.code.as_str(), "00002s");
    assert_eq!(created.link, "https://giftpin.app/claim/00002s");
    assert_eq!(created.amount, ether_tenth());
    assert_eq!(created.amount_ether(), "0.1");
    assert_eq!(created.tx_hash, tx_hash);
    assert_eq!(flow.step(), &CreateStep::Created(created.clone()));

    let sends: Vec<_> = fake
        .recorded_calls()
        .into_iter()
        .filter(|c| c.kind == CallKind::Send)
        .collect();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].function, "createGift");
    assert_eq!(sends[0].value, ether_tenth());
    assert_eq!(sends[0].from, Some(wallet.address()));

    let gift = client.read(&GetGift { id: created.id }).await.unwrap().unwrap();
    assert_eq!(gift.creator, wallet.address());
    assert_eq!(gift.amount, ether_tenth());
    assert_eq!(gift.message, "Merry Christmas");
    assert!(!gift.is_claimed());
}

#[tokio::test]
async fn random_code_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("codes.json");

    let wallet = wallet();
    let fake = FakeGiftContract::default();
    let client = GiftContractClient::new(fake.connect(wallet.address()), contract_address());
    let session = signed_in(&wallet).await;
    let mut book = GiftCodeBook::new(CodeScheme::Random, CodeRegistry::open(&path).unwrap());

    let created = {
        let mut flow = CreateFlow::new(&client, &mut book, &session, BASE_URL);
        flow.submit(&GiftDraft::new("0.25", "secret", ""))
            .await
            .unwrap();
        flow.confirm_with_rng(&mut StdRng::seed_from_u64(3))
            .await
            .unwrap()
    };
    assert!(is_valid_random_code(created.code.as_str()));
    assert_ne!(created.code, encode_gift_id(created.id));
    assert_eq!(book.resolve(&created.code), Some(created.id));

    let reopened = CodeRegistry::open(&path).unwrap();
    assert_eq!(reopened.lookup(&created.code), Some(created.id));
    assert_eq!(reopened.code_for(created.id), Some(created.code));
}

#[tokio::test]
async fn second_submit_is_rejected_while_confirming() {
    let wallet = wallet();
    let fake = FakeGiftContract::default();
    let client = GiftContractClient::new(fake.connect(wallet.address()), contract_address());
    let session = signed_in(&wallet).await;
    let mut book = GiftCodeBook::deterministic();
    let mut flow = CreateFlow::new(&client, &mut book, &session, BASE_URL);

    let draft = GiftDraft::new("0.1", "1234", "");
    flow.submit(&draft).await.unwrap();
    assert!(matches!(
        flow.submit(&draft).await.unwrap_err(),
        FlowError::WrongStep { .. }
    ));
    assert_eq!(fake.send_count(), 1);
}

#[tokio::test]
async fn reverted_creation_returns_to_draft() {
    let wallet = wallet();
    let fake = FakeGiftContract::default();
    let client = GiftContractClient::new(fake.connect(wallet.address()), contract_address());
    let session = signed_in(&wallet).await;
    let mut book = GiftCodeBook::deterministic();
    let mut flow = CreateFlow::new(&client, &mut book, &session, BASE_URL);

    fake.set_paused(true);
    flow.submit(&GiftDraft::new("0.1", "1234", "")).await.unwrap();
    let err = flow.confirm().await.unwrap_err();
    assert!(matches!(
        err,
        FlowError::Contract(ContractError::Reverted(_))
    ));
    assert_eq!(flow.step(), &CreateStep::Draft);
    assert_eq!(fake.balance(), U256::zero());

    fake.set_paused(false);
    let created = flow
        .create(&GiftDraft::new("0.1", "1234", ""))
        .await
        .unwrap();
    assert_eq!(created.id, GiftId(1));
}

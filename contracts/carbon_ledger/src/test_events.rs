extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    token, vec, Address, Env, IntoVal, String, TryIntoVal,
};

use crate::events::{ClaimApproved, ClaimSubmitted, CreditsPurchased, CreditsRetired, SaleCancelled};
use crate::{CarbonLedger, CarbonLedgerClient, ONE_TON};

fn setup_with_init() -> (Env, CarbonLedgerClient<'static>, Address, Address) {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register(CarbonLedger, ());
    let client = CarbonLedgerClient::new(&env, &contract_id);
    let super_admin = Address::generate(&env);
    let payment = env.register_stellar_asset_contract_v2(Address::generate(&env));
    client.init(&super_admin, &payment.address());
    let auditor = Address::generate(&env);
    client.add_auditor(&super_admin, &auditor);
    (env, client, auditor, payment.address())
}

fn pending_claim(env: &Env, client: &CarbonLedgerClient, tons: i128) -> (Address, u64) {
    let owner = Address::generate(env);
    let project = client.register_project(&owner, &String::from_str(env, "Kariba REDD+"), &0);
    let claim_id = client.submit_claim(&owner, &project.id, &tons, &1, &2, &String::from_str(env, "cid"));
    (owner, claim_id)
}

#[test]
fn test_claim_submitted_event() {
    let (env, client, _auditor, _) = setup_with_init();
    let (owner, claim_id) = pending_claim(&env, &client, 12 * ONE_TON);

    let last_event = env.events().all().last().expect("No events found");
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![&env, symbol_short!("claim_sub").into_val(&env), claim_id.into_val(&env)];
    assert_eq!(last_event.1, expected_topics);

    let data: ClaimSubmitted = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(data.owner, owner);
    assert_eq!(data.tons, 12 * ONE_TON);
}

#[test]
fn test_claim_approved_event() {
    let (env, client, auditor, _) = setup_with_init();
    let (_owner, claim_id) = pending_claim(&env, &client, 5 * ONE_TON);

    let batch_id = client.audit_approve(&auditor, &claim_id, &String::from_str(&env, "audit"));

    let last_event = env.events().all().last().expect("No events found");
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![&env, symbol_short!("approved").into_val(&env), claim_id.into_val(&env)];
    assert_eq!(last_event.1, expected_topics);

    let data: ClaimApproved = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        ClaimApproved {
            claim_id,
            batch_id,
            auditor,
            tons: 5 * ONE_TON,
        }
    );
}

#[test]
fn test_credits_purchased_event() {
    let (env, client, auditor, payment) = setup_with_init();
    let (seller, claim_id) = pending_claim(&env, &client, 10 * ONE_TON);
    let batch_id = client.audit_approve(&auditor, &claim_id, &String::from_str(&env, "audit"));

    client.approve(&seller, &client.address, &(10 * ONE_TON));
    client.open_sale(&seller, &batch_id, &(10 * ONE_TON), &250);

    let buyer = Address::generate(&env);
    token::StellarAssetClient::new(&env, &payment).mint(&buyer, &1_000);
    client.buy(&buyer, &batch_id, &(4 * ONE_TON), &1_000);

    let last_event = env.events().all().last().expect("No events found");
    let expected_topics = vec![&env, symbol_short!("purchase").into_val(&env), batch_id.into_val(&env)];
    assert_eq!(last_event.1, expected_topics);

    let data: CreditsPurchased = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        CreditsPurchased {
            batch_id,
            buyer,
            units: 4 * ONE_TON,
            amount_paid: 1_000,
        }
    );
}

#[test]
fn test_sale_cancelled_event_reports_unsold_units() {
    let (env, client, auditor, _) = setup_with_init();
    let (seller, claim_id) = pending_claim(&env, &client, 3 * ONE_TON);
    let batch_id = client.audit_approve(&auditor, &claim_id, &String::from_str(&env, "audit"));

    client.approve(&seller, &client.address, &(3 * ONE_TON));
    client.open_sale(&seller, &batch_id, &(3 * ONE_TON), &1);
    client.cancel_sale(&seller, &batch_id);

    let last_event = env.events().all().last().expect("No events found");
    let expected_topics = vec![&env, symbol_short!("sale_stop").into_val(&env), batch_id.into_val(&env)];
    assert_eq!(last_event.1, expected_topics);

    let data: SaleCancelled = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(data.seller, seller);
    assert_eq!(data.units_unsold, 3 * ONE_TON);
}

#[test]
fn test_credits_retired_event() {
    let (env, client, auditor, _) = setup_with_init();
    let (owner, claim_id) = pending_claim(&env, &client, 8 * ONE_TON);
    client.audit_approve(&auditor, &claim_id, &String::from_str(&env, "audit"));

    let certificate_id = client.retire(
        &owner,
        &(2 * ONE_TON),
        &String::from_str(&env, "Event travel 2024"),
        &String::from_str(&env, "ipfs://bafycert"),
    );

    let last_event = env.events().all().last().expect("No events found");
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![&env, symbol_short!("retired").into_val(&env), certificate_id.into_val(&env)];
    assert_eq!(last_event.1, expected_topics);

    let data: CreditsRetired = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        data,
        CreditsRetired {
            certificate_id,
            owner,
            units: 2 * ONE_TON,
        }
    );
}

#[test]
fn test_pause_event_carries_caller() {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register(CarbonLedger, ());
    let client = CarbonLedgerClient::new(&env, &contract_id);
    let super_admin = Address::generate(&env);
    let payment = env.register_stellar_asset_contract_v2(Address::generate(&env));
    client.init(&super_admin, &payment.address());

    client.pause(&super_admin);

    let last_event = env.events().all().last().expect("No events found");
    let expected_topics = vec![&env, symbol_short!("paused").into_val(&env)];
    assert_eq!(last_event.1, expected_topics);
    let caller: Address = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(caller, super_admin);
}

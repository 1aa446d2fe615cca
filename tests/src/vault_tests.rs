use crate::setup::{address_of, units, World, ONE_YEAR_MS};
use cspr_lyf_contracts::errors::LyfError;
use cspr_lyf_contracts::interest::{accrue_interest, InterestModelParams, SECONDS_PER_YEAR};
use cspr_lyf_contracts::math::wad;
use cspr_lyf_contracts::vault::{Vault, VaultInitArgs};
use odra::casper_types::U256;
use odra::host::Deployer;
use pretty_assertions::assert_eq;

/// Interest the default curve charges on `debt` out of a `total` vault over a year
fn yearly_interest(debt: U256, total: U256) -> U256 {
    let rate = InterestModelParams::default_kink()
        .borrow_rate(debt, total - debt)
        .unwrap();
    accrue_interest(debt, rate, SECONDS_PER_YEAR).unwrap().interest_accrued
}

/// Vault balance must equal deposits minus what is lent out
fn assert_conserved(world: &World) {
    let state = world.vault0.get_state();
    let held = world.token0.balance_of(address_of(&world.vault0));
    assert_eq!(held, state.total_token - state.total_debt);
}

#[test]
fn test_deposit_and_withdraw_round_trip() {
    let mut world = World::new();
    let user = world.user;
    world.fund(user, units(500));
    world.env.set_caller(user);

    let before = world.token0.balance_of(user);
    let shares = world.vault0.deposit(units(500));
    assert_eq!(shares, units(500));
    assert_eq!(world.vault0.balance_of(user), units(500));
    assert_eq!(world.vault0.exchange_rate(), wad());

    let paid = world.vault0.withdraw(shares);
    assert_eq!(paid, units(500));
    assert_eq!(world.token0.balance_of(user), before);
    assert_eq!(world.vault0.balance_of(user), U256::zero());
    assert_conserved(&world);
}

#[test]
fn test_zero_amounts_rejected() {
    let mut world = World::new();
    world.whitelist_borrower();
    world.env.set_caller(world.lp);
    assert_eq!(world.vault0.try_deposit(U256::zero()), Err(LyfError::ZeroAmount.into()));
    assert_eq!(world.vault0.try_withdraw(U256::zero()), Err(LyfError::ZeroAmount.into()));

    world.env.set_caller(world.borrower);
    assert_eq!(world.vault0.try_borrow(U256::zero()), Err(LyfError::ZeroAmount.into()));
    assert_eq!(world.vault0.try_repay(U256::zero()), Err(LyfError::ZeroAmount.into()));
}

#[test]
fn test_withdraw_more_shares_than_held() {
    let mut world = World::new();
    world.env.set_caller(world.lp);
    assert_eq!(
        world.vault0.try_withdraw(units(10_001)),
        Err(LyfError::InsufficientShares.into())
    );
}

#[test]
fn test_borrow_requires_whitelist() {
    let mut world = World::new();
    let borrower = world.borrower;

    world.env.set_caller(borrower);
    assert_eq!(world.vault0.try_borrow(units(1)), Err(LyfError::Unauthorized.into()));

    // Whitelisting needs registry authorization first
    world.env.set_caller(world.admin);
    assert_eq!(world.vault0.try_add_borrower(borrower), Err(LyfError::Unauthorized.into()));

    world.env.set_caller(borrower);
    assert_eq!(world.vault0.try_add_borrower(borrower), Err(LyfError::NotAdmin.into()));

    world.whitelist_borrower();
    assert!(world.vault0.is_borrower(borrower));
    world.env.set_caller(borrower);
    assert_eq!(world.vault0.borrow(units(1)), units(1));

    world.env.set_caller(world.admin);
    world.vault0.remove_borrower(borrower);
    world.env.set_caller(borrower);
    assert_eq!(world.vault0.try_borrow(units(1)), Err(LyfError::Unauthorized.into()));
}

#[test]
fn test_borrow_beyond_free_liquidity() {
    let mut world = World::new();
    world.whitelist_borrower();
    world.env.set_caller(world.borrower);
    assert_eq!(
        world.vault0.try_borrow(units(10_001)),
        Err(LyfError::InsufficientLiquidity.into())
    );
}

#[test]
fn test_withdraw_limited_by_outstanding_debt() {
    let mut world = World::new();
    world.whitelist_borrower();
    world.env.set_caller(world.borrower);
    world.vault0.borrow(units(9_500));
    assert_eq!(world.vault0.free_liquidity(), units(500));

    world.env.set_caller(world.lp);
    assert_eq!(
        world.vault0.try_withdraw(units(10_000)),
        Err(LyfError::InsufficientLiquidity.into())
    );
    assert_eq!(world.vault0.withdraw(units(500)), units(500));
    assert_eq!(world.vault0.free_liquidity(), U256::zero());
    assert_conserved(&world);
}

#[test]
fn test_interest_accrues_on_the_curve() {
    let mut world = World::new();
    world.whitelist_borrower();
    world.env.set_caller(world.borrower);
    world.vault0.borrow(units(100));

    let expected = yearly_interest(units(100), units(10_000));
    assert!(!expected.is_zero());
    assert_eq!(world.vault0.pending_interest(SECONDS_PER_YEAR), expected);
    assert_eq!(
        world.vault0.current_borrow_rate(),
        InterestModelParams::default_kink()
            .borrow_rate(units(100), units(9_900))
            .unwrap()
    );

    world.env.advance_block_time(ONE_YEAR_MS);
    assert_eq!(world.vault0.pending_interest(0), expected);
    // Views project pending interest without writing it
    assert_eq!(world.vault0.get_state().total_debt, units(100));
    assert_eq!(world.vault0.debt_share_value(units(100)), units(100) + expected);

    world.vault0.accrue();
    let state = world.vault0.get_state();
    assert_eq!(state.total_debt, units(100) + expected);
    assert_eq!(state.total_token, units(10_000) + expected);
    assert_eq!(world.vault0.pending_interest(0), U256::zero());
    assert!(world.env.emitted(&world.vault0, "InterestAccrued"));
}

#[test]
fn test_full_repay_clears_debt() {
    let mut world = World::new();
    let borrower = world.borrower;
    world.whitelist_borrower();
    world.fund(borrower, units(100));

    world.env.set_caller(borrower);
    let debt_shares = world.vault0.borrow(units(100));
    assert_eq!(world.vault0.debt_shares_of(borrower), debt_shares);

    world.env.advance_block_time(ONE_YEAR_MS);
    let interest = yearly_interest(units(100), units(10_000));
    let paid = world.vault0.repay(debt_shares);
    assert_eq!(paid, units(100) + interest);

    let state = world.vault0.get_state();
    assert_eq!(state.total_debt, U256::zero());
    assert_eq!(state.total_debt_shares, U256::zero());
    assert_eq!(world.vault0.debt_shares_of(borrower), U256::zero());
    assert!(world.vault0.exchange_rate() > wad());

    // Lenders keep all the interest
    assert_eq!(world.vault0.share_value(units(10_000)), units(10_000) + interest);
    world.env.set_caller(world.lp);
    assert_eq!(world.vault0.withdraw(units(10_000)), units(10_000) + interest);
    assert_conserved(&world);
}

#[test]
fn test_repay_more_than_owed() {
    let mut world = World::new();
    world.whitelist_borrower();
    world.env.set_caller(world.borrower);
    let debt_shares = world.vault0.borrow(units(10));
    assert_eq!(
        world.vault0.try_repay(debt_shares + 1),
        Err(LyfError::InsufficientDebtShares.into())
    );
}

#[test]
fn test_debt_value_rounds_up() {
    let mut world = World::new();
    world.whitelist_borrower();
    world.env.set_caller(world.borrower);
    let debt_shares = world.vault0.borrow(units(100));

    world.env.advance_block_time(ONE_YEAR_MS);
    world.vault0.accrue();
    let state = world.vault0.get_state();
    assert!(state.total_debt > state.total_debt_shares);

    // One debt share is worth a little over one unit, so it rounds up to two
    assert_eq!(world.vault0.debt_share_value(U256::one()), U256::from(2u64));
    assert_eq!(world.vault0.debt_share_value(debt_shares), state.total_debt);

    // New debt shares are minted rounding up as well
    let minted = world.vault0.borrow(U256::one());
    assert_eq!(minted, U256::one());
}

#[test]
fn test_exchange_rate_never_decreases() {
    let mut world = World::new();
    let (user, borrower) = (world.user, world.borrower);
    world.whitelist_borrower();
    world.fund(borrower, units(1_000));

    let mut last = world.vault0.exchange_rate();
    let mut check = |world: &World| {
        let rate = world.vault0.exchange_rate();
        assert!(rate >= last);
        last = rate;
        assert_conserved(world);
    };

    world.env.set_caller(borrower);
    let debt_shares = world.vault0.borrow(units(3_000));
    check(&world);

    world.env.advance_block_time(ONE_YEAR_MS / 12);
    world.env.set_caller(user);
    world.token0.approve(address_of(&world.vault0), U256::max_value());
    world.vault0.deposit(U256::from(1_234_567u64));
    check(&world);

    world.env.advance_block_time(ONE_YEAR_MS / 12);
    world.env.set_caller(borrower);
    world.vault0.repay(debt_shares / 3);
    check(&world);

    world.env.set_caller(world.lp);
    world.vault0.withdraw(U256::from(777u64));
    check(&world);

    world.env.advance_block_time(ONE_YEAR_MS / 4);
    world.env.set_caller(borrower);
    let remaining = world.vault0.debt_shares_of(borrower);
    world.vault0.repay(remaining);
    check(&world);

    assert_eq!(world.vault0.get_state().total_debt, U256::zero());
}

#[test]
fn test_share_token_transfers() {
    let mut world = World::new();
    let (lp, user) = (world.lp, world.user);
    world.env.set_caller(lp);
    assert!(world.vault0.transfer(user, units(1_000)));
    assert_eq!(world.vault0.balance_of(lp), units(9_000));
    assert_eq!(world.vault0.total_supply(), units(10_000));

    world.env.set_caller(user);
    let before = world.token0.balance_of(user);
    assert_eq!(world.vault0.withdraw(units(1_000)), units(1_000));
    assert_eq!(world.token0.balance_of(user), before + units(1_000));
}

#[test]
fn test_vault_without_interest_model() {
    let mut world = World::new();
    let borrower = world.borrower;
    let mut bare = Vault::deploy(
        &world.env,
        VaultInitArgs {
            registry: address_of(&world.registry),
            token: address_of(&world.token0),
            name: "Unpriced Vault".to_string(),
            symbol: "ibX".to_string(),
            decimals: 18,
        },
    );
    world.env.set_caller(world.admin);
    world.registry.set_borrower_authorization(borrower, true);
    bare.add_borrower(borrower);

    world.env.set_caller(world.lp);
    world.token0.approve(address_of(&bare), U256::max_value());
    world.token0.mint(world.lp, units(100));
    bare.deposit(units(100));

    // Borrowing is fine until interest has to be computed
    world.env.set_caller(borrower);
    bare.borrow(units(10));
    world.env.advance_block_time(ONE_YEAR_MS);
    assert_eq!(bare.try_accrue(), Err(LyfError::InterestModelMissing.into()));
    assert_eq!(
        bare.try_current_borrow_rate(),
        Err(LyfError::InterestModelMissing.into())
    );
}

#[test]
fn test_frequent_accrual_keeps_dust_interest() {
    let mut world = World::new();
    world.whitelist_borrower();
    world.env.set_caller(world.borrower);
    let dust = U256::from(1_000_000_000_000_000u64);
    world.vault0.borrow(dust);
    let start = world.vault0.get_state().last_accrual_timestamp;

    let rate = InterestModelParams::default_kink()
        .borrow_rate(dust, units(10_000) - dust)
        .unwrap();
    assert!(!rate.is_zero());
    assert!(accrue_interest(dust, rate, 1).unwrap().interest_accrued.is_zero());

    // Accruing every second would round each step to nothing
    for _ in 0..10 {
        world.env.advance_block_time(1_000);
        world.vault0.accrue();
        let state = world.vault0.get_state();
        assert_eq!(state.last_accrual_timestamp, start);
        assert_eq!(state.total_debt, dust);
    }

    world.env.advance_block_time(86_400_000);
    let elapsed = 86_410;
    let owed = accrue_interest(dust, rate, elapsed).unwrap().interest_accrued;
    assert!(!owed.is_zero());
    assert_eq!(world.vault0.pending_interest(0), owed);

    world.vault0.accrue();
    let state = world.vault0.get_state();
    assert_eq!(state.last_accrual_timestamp, start + elapsed);
    assert_eq!(state.total_debt, dust + owed);
    assert!(world.env.emitted(&world.vault0, "InterestAccrued"));
}

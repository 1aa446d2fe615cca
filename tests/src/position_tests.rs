use crate::setup::{address_of, units, wide_range, World, ONE_HOUR_MS};
use cspr_lyf_contracts::errors::LyfError;
use cspr_lyf_contracts::math::{mul_div_rounding_up, to_usd, wad, Rounding};
use cspr_lyf_contracts::mocks::range_executor::ReentryMode;
use cspr_lyf_contracts::mocks::test_token::{TestToken, TestTokenInitArgs};
use cspr_lyf_contracts::types::{PositionStatus, PriceRange, VaultSpec};
use odra::casper_types::U256;
use odra::host::Deployer;
use pretty_assertions::assert_eq;

const DAY_MS: u64 = 86_400_000;

fn price0() -> U256 {
    U256::from(200_000_000u64)
}

fn price1() -> U256 {
    U256::from(100_000_000u64)
}

/// 1000 of collateral and 2000 borrowed on each side, placed in the wide range
fn open_leveraged(world: &mut World) -> u64 {
    let side0 = VaultSpec { vault: address_of(&world.vault0), debt_amount: units(2_000) };
    let side1 = VaultSpec { vault: address_of(&world.vault1), debt_amount: units(2_000) };
    let executor = world.executor_address();
    world.env.set_caller(world.user);
    world
        .manager
        .create_dual_vault_position(executor, units(1_000), units(1_000), side0, side1, wide_range())
}

/// `actual` is at most `tolerance` units below `expected` and never above it
fn assert_close_below(actual: U256, expected: U256, tolerance: u64) {
    assert!(actual <= expected, "{} > {}", actual, expected);
    assert!(actual + tolerance >= expected, "{} too far below {}", actual, expected);
}

#[test]
fn test_leveraged_round_trip() {
    let mut world = World::new();
    let user = world.user;
    let id = open_leveraged(&mut world);
    assert_eq!(id, 1);
    assert_eq!(world.manager.get_next_position_id(), 2);

    let position = world.manager.get_position(id).unwrap();
    assert_eq!(position.owner, user);
    assert_eq!(position.status, PositionStatus::Open);
    assert_eq!(position.vault0, Some(address_of(&world.vault0)));
    assert_eq!(position.vault1, Some(address_of(&world.vault1)));
    assert_eq!(position.range, Some(wide_range()));
    assert_eq!(position.debt_shares0, units(2_000));
    assert_eq!(position.debt_shares1, units(2_000));
    assert!(!position.liquidity.is_zero());

    assert_eq!(world.token0.balance_of(user), units(9_000));
    assert_eq!(world.token1.balance_of(user), units(9_000));
    assert_eq!(world.vault0.get_state().total_debt, units(2_000));
    assert_eq!(world.vault1.get_state().total_debt, units(2_000));
    assert_eq!(world.vault0.debt_shares_of(world.manager_address()), units(2_000));

    world.manager.close_position(id);

    let closed = world.manager.get_position(id).unwrap();
    assert_eq!(closed.status, PositionStatus::Closed);
    assert_eq!(closed.debt_shares0, U256::zero());
    assert_eq!(closed.debt_shares1, U256::zero());
    assert_eq!(closed.liquidity, U256::zero());

    // Liquidity rounding costs the owner at most a unit or two per side
    assert_close_below(world.token0.balance_of(user), units(10_000), 2);
    assert_close_below(world.token1.balance_of(user), units(10_000), 2);

    for vault in [&world.vault0, &world.vault1] {
        let state = vault.get_state();
        assert_eq!(state.total_debt, U256::zero());
        assert_eq!(state.total_debt_shares, U256::zero());
        assert_eq!(state.total_token, units(10_000));
    }
    assert_eq!(world.token0.balance_of(world.manager_address()), U256::zero());
    assert_eq!(world.token1.balance_of(world.manager_address()), U256::zero());

    let slot = world.executor.get_slot(closed.handle).unwrap();
    assert!(!slot.open);

    assert!(world.env.emitted(&world.manager, "PositionOpened"));
    assert!(world.env.emitted(&world.manager, "PositionClosed"));
    assert!(world.env.emitted(&world.vault0, "Borrowed"));
    assert!(world.env.emitted(&world.vault0, "Repaid"));
}

#[test]
fn test_position_ids_and_owner_index() {
    let mut world = World::new();
    let user = world.user;
    let first = open_leveraged(&mut world);
    let second = open_leveraged(&mut world);
    assert_eq!((first, second), (1, 2));

    assert_eq!(world.manager.get_owner_position_count(user), 2);
    assert_eq!(world.manager.get_owner_position_id_at(user, 0), Some(1));
    assert_eq!(world.manager.get_owner_position_id_at(user, 1), Some(2));
    assert_eq!(world.manager.get_owner_position_id_at(user, 2), None);
    assert_eq!(world.manager.get_owner_position_count(world.lp), 0);

    // Closed ids are never reused
    world.manager.close_position(first);
    assert_eq!(open_leveraged(&mut world), 3);
}

#[test]
fn test_debt_and_position_valuation() {
    let mut world = World::new();
    let id = open_leveraged(&mut world);
    let executor = world.executor_address();

    let debt = world.manager.get_debt_usd_value(executor, id);
    assert_eq!(debt.debt0_usd, units(4_000));
    assert_eq!(debt.debt1_usd, units(2_000));
    assert_eq!(debt.debt_usd, units(6_000));

    let amounts = world.manager.get_position_amounts(id);
    assert_eq!(amounts, world.executor.amounts_for(world.manager.get_position(id).unwrap().handle));
    assert_close_below(amounts.amount0, units(3_000), 1);
    assert_close_below(amounts.amount1, units(3_000), 1);

    let value = world.manager.get_position_value_usd(id);
    let expected = to_usd(amounts.amount0, 18, price0(), 8, Rounding::Down).unwrap()
        + to_usd(amounts.amount1, 18, price1(), 8, Rounding::Down).unwrap();
    assert_eq!(value, expected);

    assert_eq!(
        world.manager.get_debt_ratio(id),
        mul_div_rounding_up(units(6_000), wad(), value).unwrap()
    );

    world.manager.close_position(id);
    assert_eq!(world.manager.get_debt_ratio(id), U256::zero());
    assert_eq!(world.manager.get_position_amounts(id).amount0, U256::zero());
}

#[test]
fn test_debt_value_requires_matching_executor() {
    let mut world = World::new();
    let id = open_leveraged(&mut world);
    let executor = world.executor_address();
    assert_eq!(
        world.manager.try_get_debt_usd_value(world.lp, id),
        Err(LyfError::Unauthorized.into())
    );
    assert_eq!(
        world.manager.try_get_debt_usd_value(executor, 42),
        Err(LyfError::PositionNotFound.into())
    );
}

#[test]
fn test_debt_value_grows_with_interest() {
    let mut world = World::new();
    let id = open_leveraged(&mut world);
    let executor = world.executor_address();
    let position = world.manager.get_position(id).unwrap();

    world.env.advance_block_time(30 * DAY_MS);
    world.set_prices();

    let owed0 = world.vault0.debt_share_value(position.debt_shares0);
    let owed1 = world.vault1.debt_share_value(position.debt_shares1);
    assert!(owed0 > units(2_000));

    let debt = world.manager.get_debt_usd_value(executor, id);
    assert_eq!(debt.debt0_usd, to_usd(owed0, 18, price0(), 8, Rounding::Up).unwrap());
    assert_eq!(debt.debt1_usd, to_usd(owed1, 18, price1(), 8, Rounding::Up).unwrap());
    assert!(debt.debt_usd > units(6_000));

    // Closing repays principal plus interest
    world.env.set_caller(world.user);
    world.manager.close_position(id);
    assert_eq!(world.vault0.get_state().total_debt, U256::zero());
    assert!(world.vault0.get_state().total_token > units(10_000));
    assert!(world.token0.balance_of(world.user) < units(10_000));
}

#[test]
fn test_stale_price_blocks_valuation() {
    let mut world = World::new();
    let id = open_leveraged(&mut world);
    let executor = world.executor_address();

    world.env.advance_block_time(2 * ONE_HOUR_MS);
    assert!(world.manager.try_get_debt_usd_value(executor, id).is_err());
    assert!(world.manager.try_get_position_value_usd(id).is_err());
    assert_eq!(
        world.oracle.try_price(address_of(&world.token0)),
        Err(LyfError::PriceStale.into())
    );

    world.set_prices();
    assert!(world.manager.get_debt_usd_value(executor, id).debt_usd >= units(6_000));
}

#[test]
fn test_single_vault_position() {
    let mut world = World::new();
    let user = world.user;
    let (token0, token1) = (address_of(&world.token0), address_of(&world.token1));
    let executor = world.executor_address();

    world.env.set_caller(user);
    let id = world
        .manager
        .create_position(token0, token1, units(1_000), units(1_000), units(1_000), executor);

    let position = world.manager.get_position(id).unwrap();
    assert_eq!(position.token0, token0);
    assert_eq!(position.token1, token1);
    assert_eq!(position.vault0, None);
    assert_eq!(position.vault1, Some(address_of(&world.vault1)));
    assert_eq!(position.range, None);
    assert_eq!(position.debt_shares0, U256::zero());
    assert_eq!(position.debt_shares1, units(1_000));

    let debt = world.manager.get_debt_usd_value(executor, id);
    assert_eq!(debt.debt0_usd, U256::zero());
    assert_eq!(debt.debt1_usd, units(1_000));

    world.manager.close_position(id);
    assert_close_below(world.token0.balance_of(user), units(10_000), 2);
    assert_close_below(world.token1.balance_of(user), units(10_000), 2);
    assert_eq!(world.vault1.get_state().total_debt, U256::zero());
}

#[test]
fn test_create_rejects_bad_requests() {
    let mut world = World::new();
    let (vault0, vault1) = (address_of(&world.vault0), address_of(&world.vault1));
    let (token0, token1) = (address_of(&world.token0), address_of(&world.token1));
    let executor = world.executor_address();
    let side = |vault, debt_amount| VaultSpec { vault, debt_amount };
    world.env.set_caller(world.user);

    assert_eq!(
        world.manager.try_create_dual_vault_position(
            world.lp,
            units(1),
            units(1),
            side(vault0, U256::zero()),
            side(vault1, U256::zero()),
            wide_range()
        ),
        Err(LyfError::Unauthorized.into())
    );
    assert_eq!(
        world.manager.try_create_dual_vault_position(
            executor,
            units(1),
            units(1),
            side(vault0, units(10_001)),
            side(vault1, U256::zero()),
            wide_range()
        ),
        Err(LyfError::ExceedsCapacity.into())
    );
    assert_eq!(
        world.manager.try_create_dual_vault_position(
            executor,
            units(1),
            units(1),
            side(vault0, U256::zero()),
            side(vault0, U256::zero()),
            wide_range()
        ),
        Err(LyfError::SameToken.into())
    );

    let range = wide_range();
    let flat = PriceRange { sqrt_price_lower: range.sqrt_price_upper, sqrt_price_upper: range.sqrt_price_upper };
    assert_eq!(
        world.manager.try_create_dual_vault_position(
            executor,
            units(1),
            units(1),
            side(vault0, U256::zero()),
            side(vault1, U256::zero()),
            flat
        ),
        Err(LyfError::InvalidRange.into())
    );

    assert_eq!(
        world.manager.try_create_position(token0, token0, units(1), units(1), units(1), executor),
        Err(LyfError::SameToken.into())
    );

    let stray = TestToken::deploy(
        &world.env,
        TestTokenInitArgs { name: "Stray".to_string(), symbol: "STRAY".to_string(), decimals: 18 },
    );
    assert_eq!(
        world.manager.try_create_position(token0, address_of(&stray), units(1), units(1), units(1), executor),
        Err(LyfError::VaultNotRegistered.into())
    );
    assert_eq!(
        world.manager.try_create_position(token0, token1, U256::zero(), U256::zero(), U256::zero(), executor),
        Err(LyfError::ZeroAmount.into())
    );

    // Nothing was opened
    assert_eq!(world.manager.get_next_position_id(), 1);
    assert_eq!(world.vault0.get_state().total_debt, U256::zero());
}

#[test]
fn test_close_rejects_unknown_and_foreign_positions() {
    let mut world = World::new();
    let id = open_leveraged(&mut world);

    assert_eq!(world.manager.try_close_position(99), Err(LyfError::PositionNotFound.into()));

    world.env.set_caller(world.lp);
    assert_eq!(world.manager.try_close_position(id), Err(LyfError::NotOwner.into()));

    world.env.set_caller(world.user);
    world.manager.close_position(id);
    assert_eq!(world.manager.try_close_position(id), Err(LyfError::PositionNotFound.into()));
}

#[test]
fn test_close_reverts_when_proceeds_cannot_cover_debt() {
    let mut world = World::new();
    let id = open_leveraged(&mut world);

    world.env.set_caller(world.admin);
    world.executor.set_loss_bps(5_000);

    world.env.set_caller(world.user);
    assert_eq!(world.manager.try_close_position(id), Err(LyfError::InsufficientReturn.into()));

    let position = world.manager.get_position(id).unwrap();
    assert_eq!(position.status, PositionStatus::Open);
    assert_eq!(position.debt_shares0, units(2_000));
    assert_eq!(world.vault0.get_state().total_debt, units(2_000));

    // A smaller haircut still covers the debt
    world.env.set_caller(world.admin);
    world.executor.set_loss_bps(100);
    world.env.set_caller(world.user);
    world.manager.close_position(id);
    assert_eq!(world.vault0.get_state().total_debt, U256::zero());
    assert_eq!(world.vault1.get_state().total_debt, U256::zero());
}

#[test]
fn test_reentrant_close_fails() {
    let mut world = World::new();
    let id = open_leveraged(&mut world);

    world.env.set_caller(world.admin);
    world.executor.set_reentry(ReentryMode::CloseAgain, id);

    world.env.set_caller(world.user);
    assert!(world.manager.try_close_position(id).is_err());

    let position = world.manager.get_position(id).unwrap();
    assert_eq!(position.status, PositionStatus::Open);
    assert_eq!(world.vault0.get_state().total_debt, units(2_000));
    assert_eq!(world.vault1.get_state().total_debt, units(2_000));

    world.env.set_caller(world.admin);
    world.executor.set_reentry(ReentryMode::Off, 0);
    world.env.set_caller(world.user);
    world.manager.close_position(id);
    assert_eq!(world.manager.get_position(id).unwrap().status, PositionStatus::Closed);
}

#[test]
fn test_executor_sees_settled_record_during_close() {
    let mut world = World::new();
    let id = open_leveraged(&mut world);

    world.env.set_caller(world.admin);
    world.executor.set_reentry(ReentryMode::Observe, id);

    world.env.set_caller(world.user);
    world.manager.close_position(id);

    let seen = world.executor.get_observed().unwrap();
    assert_eq!(seen.id, id);
    assert_eq!(seen.status, PositionStatus::Closed);
    assert_eq!(seen.debt_shares0, U256::zero());
    assert_eq!(seen.debt_shares1, U256::zero());
    assert_eq!(seen.liquidity, U256::zero());
}

#[test]
fn test_only_admin_tunes_executor() {
    let mut world = World::new();
    world.env.set_caller(world.user);
    assert_eq!(world.executor.try_set_loss_bps(10), Err(LyfError::NotAdmin.into()));

    world.env.set_caller(world.admin);
    assert_eq!(world.executor.try_set_loss_bps(10_001), Err(LyfError::InvalidConfig.into()));
}

#[test]
fn test_debt_value_rounds_up_on_inexact_prices() {
    let mut world = World::new();
    let executor = world.executor_address();
    let token1 = address_of(&world.token1);
    let third = U256::from(33_333_333u64);
    world.env.set_caller(world.admin);
    world.oracle.set_price(token1, third, 8);

    let scale = U256::from(100_000_000u64);
    for extra in [1u64, 2, 7] {
        let borrowed = units(2_000) + U256::from(extra);
        let side0 = VaultSpec { vault: address_of(&world.vault0), debt_amount: units(1_000) };
        let side1 = VaultSpec { vault: address_of(&world.vault1), debt_amount: borrowed };
        world.env.set_caller(world.user);
        let id = world.manager.create_dual_vault_position(
            executor,
            units(1_000),
            units(1_000),
            side0,
            side1,
            wide_range(),
        );

        // 18-decimal token at an 8-decimal price: usd = amount * price / 10^8
        let exact_numerator = borrowed * third;
        let floor = exact_numerator / scale;
        assert!(!(exact_numerator % scale).is_zero());

        let debt = world.manager.get_debt_usd_value(executor, id);
        assert!(debt.debt1_usd * scale >= exact_numerator);
        assert_eq!(debt.debt1_usd, floor + 1);
        assert_eq!(debt.debt0_usd, units(2_000));
        assert_eq!(debt.debt_usd, units(2_000) + floor + 1);
    }
}

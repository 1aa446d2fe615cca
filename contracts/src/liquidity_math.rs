//! Concentrated-liquidity amount math.
//!
//! Converts between a liquidity amount placed over a price range and the
//! token0/token1 amounts it represents. Prices are square roots in Q64.96
//! fixed point (`sqrt(token1 / token0) * 2^96`), the same convention AMM
//! pools store on chain.
//!
//! ## Rounding
//!
//! - `liquidity_for_amounts` rounds down, so the liquidity it returns is
//!   always fully backed by the supplied amounts.
//! - `amounts_for_liquidity` rounds down (the value a position can be
//!   withdrawn for). `amounts_for_liquidity_rounding_up` rounds up (what a
//!   pool charges to mint that liquidity).
//!
//! Round trip tolerance: for a price inside the range, feeding the output of
//! `liquidity_for_amounts` back into `amounts_for_liquidity` returns amounts
//! that never exceed the inputs. On the binding side the shortfall is at most
//! the amount backing one unit of liquidity on that side plus two base units.

use odra::casper_types::{U256, U512};
use crate::errors::{LyfError, LyfResult};
use crate::math::{self, div_rounding_up, mul_div, mul_div_rounding_up, narrow, widen};

/// Number of fractional bits in a Q64.96 square-root price
pub const RESOLUTION: u32 = 96;

/// `2^96`
pub fn q96() -> U256 {
    U256::from(2u64).pow(U256::from(RESOLUTION))
}

/// Largest liquidity value a pool position can hold
pub fn max_liquidity() -> U256 {
    U256::from(u128::MAX)
}

fn ordered(sqrt_price_a: U256, sqrt_price_b: U256) -> LyfResult<(U256, U256)> {
    if sqrt_price_a.is_zero() || sqrt_price_b.is_zero() || sqrt_price_a == sqrt_price_b {
        return Err(LyfError::InvalidRange);
    }
    if sqrt_price_a < sqrt_price_b {
        Ok((sqrt_price_a, sqrt_price_b))
    } else {
        Ok((sqrt_price_b, sqrt_price_a))
    }
}

/// Reject ranges where `lower >= upper` or either bound is zero
pub fn validate_range(sqrt_price_lower: U256, sqrt_price_upper: U256) -> LyfResult<()> {
    if sqrt_price_lower.is_zero() || sqrt_price_lower >= sqrt_price_upper {
        return Err(LyfError::InvalidRange);
    }
    Ok(())
}

/// Fail with `ArithmeticOverflow` if `liquidity` does not fit in 128 bits
pub fn liquidity_to_u128(liquidity: U256) -> LyfResult<U256> {
    if liquidity > max_liquidity() {
        return Err(LyfError::ArithmeticOverflow);
    }
    Ok(liquidity)
}

/// Liquidity backed by `amount0` between two prices:
/// `amount0 * (a * b / 2^96) / (b - a)`
pub fn liquidity_for_amount0(sqrt_price_a: U256, sqrt_price_b: U256, amount0: U256) -> LyfResult<U256> {
    let (a, b) = ordered(sqrt_price_a, sqrt_price_b)?;
    let intermediate = mul_div(a, b, q96())?;
    mul_div(amount0, intermediate, b - a)
}

/// Liquidity backed by `amount1` between two prices:
/// `amount1 * 2^96 / (b - a)`
pub fn liquidity_for_amount1(sqrt_price_a: U256, sqrt_price_b: U256, amount1: U256) -> LyfResult<U256> {
    let (a, b) = ordered(sqrt_price_a, sqrt_price_b)?;
    mul_div(amount1, q96(), b - a)
}

/// Maximum liquidity that both amounts can back for the given range at the
/// current price.
pub fn liquidity_for_amounts(
    sqrt_price_current: U256,
    sqrt_price_lower: U256,
    sqrt_price_upper: U256,
    amount0: U256,
    amount1: U256,
) -> LyfResult<U256> {
    validate_range(sqrt_price_lower, sqrt_price_upper)?;

    let liquidity = if sqrt_price_current <= sqrt_price_lower {
        liquidity_for_amount0(sqrt_price_lower, sqrt_price_upper, amount0)?
    } else if sqrt_price_current < sqrt_price_upper {
        let liquidity0 = liquidity_for_amount0(sqrt_price_current, sqrt_price_upper, amount0)?;
        let liquidity1 = liquidity_for_amount1(sqrt_price_lower, sqrt_price_current, amount1)?;
        liquidity0.min(liquidity1)
    } else {
        liquidity_for_amount1(sqrt_price_lower, sqrt_price_upper, amount1)?
    };

    liquidity_to_u128(liquidity)
}

fn shifted_liquidity(liquidity: U256) -> LyfResult<U256> {
    liquidity.checked_mul(q96()).ok_or(LyfError::ArithmeticOverflow)
}

/// token0 represented by `liquidity` between two prices, rounded down
pub fn amount0_for_liquidity(sqrt_price_a: U256, sqrt_price_b: U256, liquidity: U256) -> LyfResult<U256> {
    let (a, b) = ordered(sqrt_price_a, sqrt_price_b)?;
    Ok(mul_div(shifted_liquidity(liquidity)?, b - a, b)? / a)
}

/// token1 represented by `liquidity` between two prices, rounded down
pub fn amount1_for_liquidity(sqrt_price_a: U256, sqrt_price_b: U256, liquidity: U256) -> LyfResult<U256> {
    let (a, b) = ordered(sqrt_price_a, sqrt_price_b)?;
    mul_div(liquidity, b - a, q96())
}

/// token0 needed to mint `liquidity` between two prices, rounded up
pub fn amount0_for_liquidity_rounding_up(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: U256,
) -> LyfResult<U256> {
    let (a, b) = ordered(sqrt_price_a, sqrt_price_b)?;
    div_rounding_up(mul_div_rounding_up(shifted_liquidity(liquidity)?, b - a, b)?, a)
}

/// token1 needed to mint `liquidity` between two prices, rounded up
pub fn amount1_for_liquidity_rounding_up(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: U256,
) -> LyfResult<U256> {
    let (a, b) = ordered(sqrt_price_a, sqrt_price_b)?;
    mul_div_rounding_up(liquidity, b - a, q96())
}

/// Token amounts currently represented by `liquidity` placed over
/// `[lower, upper]`, rounded down.
pub fn amounts_for_liquidity(
    sqrt_price_current: U256,
    sqrt_price_lower: U256,
    sqrt_price_upper: U256,
    liquidity: U256,
) -> LyfResult<(U256, U256)> {
    validate_range(sqrt_price_lower, sqrt_price_upper)?;

    if sqrt_price_current <= sqrt_price_lower {
        Ok((amount0_for_liquidity(sqrt_price_lower, sqrt_price_upper, liquidity)?, U256::zero()))
    } else if sqrt_price_current < sqrt_price_upper {
        Ok((
            amount0_for_liquidity(sqrt_price_current, sqrt_price_upper, liquidity)?,
            amount1_for_liquidity(sqrt_price_lower, sqrt_price_current, liquidity)?,
        ))
    } else {
        Ok((U256::zero(), amount1_for_liquidity(sqrt_price_lower, sqrt_price_upper, liquidity)?))
    }
}

/// Same regions as `amounts_for_liquidity`, rounded up.
pub fn amounts_for_liquidity_rounding_up(
    sqrt_price_current: U256,
    sqrt_price_lower: U256,
    sqrt_price_upper: U256,
    liquidity: U256,
) -> LyfResult<(U256, U256)> {
    validate_range(sqrt_price_lower, sqrt_price_upper)?;

    if sqrt_price_current <= sqrt_price_lower {
        Ok((
            amount0_for_liquidity_rounding_up(sqrt_price_lower, sqrt_price_upper, liquidity)?,
            U256::zero(),
        ))
    } else if sqrt_price_current < sqrt_price_upper {
        Ok((
            amount0_for_liquidity_rounding_up(sqrt_price_current, sqrt_price_upper, liquidity)?,
            amount1_for_liquidity_rounding_up(sqrt_price_lower, sqrt_price_current, liquidity)?,
        ))
    } else {
        Ok((
            U256::zero(),
            amount1_for_liquidity_rounding_up(sqrt_price_lower, sqrt_price_upper, liquidity)?,
        ))
    }
}

fn isqrt(n: U512) -> U512 {
    if n.is_zero() {
        return n;
    }
    let two = U512::from(2u64);
    let mut x = n;
    let mut y = (x + U512::one()) / two;
    while y < x {
        x = y;
        y = (x + n / x) / two;
    }
    x
}

/// `floor(sqrt(amount1 / amount0) * 2^96)`
pub fn encode_sqrt_price_x96(amount1: U256, amount0: U256) -> LyfResult<U256> {
    if amount0.is_zero() {
        return Err(LyfError::DivisionByZero);
    }
    let q192 = U512::from(2u64).pow(U512::from(2 * RESOLUTION));
    let ratio_x192 = widen(amount1) * q192 / widen(amount0);
    narrow(isqrt(ratio_x192))
}

/// Amount backing one unit of liquidity on each side, used as the
/// documented round trip tolerance.
pub fn round_trip_tolerance(
    sqrt_price_current: U256,
    sqrt_price_lower: U256,
    sqrt_price_upper: U256,
) -> LyfResult<(U256, U256)> {
    let (unit0, unit1) = amounts_for_liquidity_rounding_up(
        sqrt_price_current,
        sqrt_price_lower,
        sqrt_price_upper,
        U256::one(),
    )?;
    let slack = U256::from(2u64);
    Ok((math::checked_add(unit0, slack)?, math::checked_add(unit1, slack)?))
}

//! Full-precision fixed-point helpers.
//!
//! Every product that could exceed 256 bits is widened to `U512` here and
//! narrowed back with an explicit overflow check. Callers pick the rounding
//! direction; nothing else in the crate multiplies before dividing.

use odra::casper_types::{U256, U512};
use crate::errors::{LyfError, LyfResult};

/// 18-decimal fixed point scale (1.0 = 1e18)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Rounding direction for a division
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// `WAD` as `U256`
pub fn wad() -> U256 {
    U256::from(WAD)
}

/// `10^exp` as `U256`
pub fn pow10(exp: u32) -> LyfResult<U256> {
    if exp > 77 {
        return Err(LyfError::ArithmeticOverflow);
    }
    Ok(U256::from(10u64).pow(U256::from(exp)))
}

/// Widen a `U256` into a `U512` without loss
pub fn widen(value: U256) -> U512 {
    let mut bytes = [0u8; 32];
    value.to_little_endian(&mut bytes);
    U512::from_little_endian(&bytes)
}

/// Narrow a `U512` back to `U256`, failing if the upper half is set
pub fn narrow(value: U512) -> LyfResult<U256> {
    let mut bytes = [0u8; 64];
    value.to_little_endian(&mut bytes);
    if bytes[32..].iter().any(|b| *b != 0) {
        return Err(LyfError::ArithmeticOverflow);
    }
    Ok(U256::from_little_endian(&bytes[..32]))
}

/// `floor(a * b / denominator)` with a 512-bit intermediate product
pub fn mul_div(a: U256, b: U256, denominator: U256) -> LyfResult<U256> {
    if denominator.is_zero() {
        return Err(LyfError::DivisionByZero);
    }
    narrow(widen(a) * widen(b) / widen(denominator))
}

/// `ceil(a * b / denominator)` with a 512-bit intermediate product
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> LyfResult<U256> {
    if denominator.is_zero() {
        return Err(LyfError::DivisionByZero);
    }
    let product = widen(a) * widen(b);
    let denominator = widen(denominator);
    let quotient = product / denominator;
    if (product % denominator).is_zero() {
        narrow(quotient)
    } else {
        narrow(quotient + U512::one())
    }
}

/// `a * b / denominator` in the requested direction
pub fn mul_div_with(a: U256, b: U256, denominator: U256, rounding: Rounding) -> LyfResult<U256> {
    match rounding {
        Rounding::Down => mul_div(a, b, denominator),
        Rounding::Up => mul_div_rounding_up(a, b, denominator),
    }
}

/// `ceil(a / b)`
pub fn div_rounding_up(a: U256, b: U256) -> LyfResult<U256> {
    if b.is_zero() {
        return Err(LyfError::DivisionByZero);
    }
    let quotient = a / b;
    if (a % b).is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::one())
    }
}

pub fn checked_add(a: U256, b: U256) -> LyfResult<U256> {
    a.checked_add(b).ok_or(LyfError::ArithmeticOverflow)
}

pub fn checked_sub(a: U256, b: U256) -> LyfResult<U256> {
    a.checked_sub(b).ok_or(LyfError::ArithmeticUnderflow)
}

/// Convert a token amount into an 18-decimal USD value.
///
/// `price` is the USD value of one whole token expressed with
/// `price_decimals` decimals; `token_decimals` is the token's own precision.
pub fn to_usd(
    amount: U256,
    token_decimals: u8,
    price: U256,
    price_decimals: u8,
    rounding: Rounding,
) -> LyfResult<U256> {
    let token_decimals = u32::from(token_decimals);
    let price_decimals = u32::from(price_decimals);
    if price_decimals <= 18 {
        let scaled_price = price
            .checked_mul(pow10(18 - price_decimals)?)
            .ok_or(LyfError::ArithmeticOverflow)?;
        mul_div_with(amount, scaled_price, pow10(token_decimals)?, rounding)
    } else {
        mul_div_with(amount, price, pow10(token_decimals + price_decimals - 18)?, rounding)
    }
}

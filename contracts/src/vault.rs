//! Lending Vault Contract
//!
//! One vault per lending asset. Depositors receive an interest-bearing share
//! token (CEP-18); whitelisted borrowers receive debt shares. Both sides are
//! share pools over the vault's underlying:
//!
//! - deposit pool: `total_token` units over the share token supply
//! - debt pool: `total_debt` units over `total_debt_shares`
//!
//! Every mutating entry point accrues interest for the elapsed time first,
//! then updates its own bookkeeping, and only then moves tokens.
//!
//! ## Rounding
//!
//! Deposits mint shares rounded down and withdrawals pay out rounded down.
//! Borrows mint debt shares rounded up and repayments charge rounded up, so
//! the vault never under-collects.
//!
//! Accrued interest rounds down. A bare `accrue` call that would round a
//! non-zero rate on outstanding debt down to nothing leaves the accrual clock
//! where it was, so repeated calls cannot erase interest on small debts.
//! Entry points that change the totals always move the clock, since the
//! elapsed span must be priced at the utilization that held during it.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::cep18::Cep18Ledger;
use crate::errors::{LyfError, LyfResult, OrRevert};
use crate::events::{BorrowerUpdated, Borrowed, Deposited, InterestAccrued, Repaid, Withdrawn};
use crate::interest::{self, accrue_interest, InterestModelParams};
use crate::interfaces::{Cep18Client, RegistryClient};
use crate::math::{self, Rounding};
use crate::pool::SharePool;
use crate::types::VaultState;

/// Lending Vault Contract
#[odra::module(events = [Deposited, Withdrawn, Borrowed, Repaid, InterestAccrued, BorrowerUpdated])]
pub struct Vault {
    /// Registry contract address (admin, interest model)
    registry: Var<Address>,
    /// Underlying token lent by this vault
    token: Var<Address>,
    /// Interest-bearing deposit share token
    shares: SubModule<Cep18Ledger>,
    /// `total_token` over deposit shares
    deposits: Var<SharePool>,
    /// `total_debt` over debt shares
    debt: Var<SharePool>,
    /// Seconds
    last_accrual: Var<u64>,
    /// Borrowers whitelisted on this vault
    borrowers: Mapping<Address, bool>,
    /// Debt shares held by each borrower
    debt_shares: Mapping<Address, U256>,
}

#[odra::module]
impl Vault {
    /// Initialize the vault for `token`, naming its share token
    pub fn init(&mut self, registry: Address, token: Address, name: String, symbol: String, decimals: u8) {
        self.registry.set(registry);
        self.token.set(token);
        self.shares.init(name, symbol, decimals);
        self.deposits.set(SharePool::default());
        self.debt.set(SharePool::default());
        self.last_accrual.set(self.now());
    }

    // ========== CEP-18 Share Token ==========

    pub fn name(&self) -> String {
        self.shares.name()
    }

    pub fn symbol(&self) -> String {
        self.shares.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.shares.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.shares.total_supply()
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.shares.balance_of(account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.shares.allowance(owner, spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.shares.raw_transfer(sender, recipient, amount);
        true
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.shares.raw_approve(owner, spender, amount);
        true
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        self.shares.spend_allowance(owner, spender, amount);
        self.shares.raw_transfer(owner, recipient, amount);
        true
    }

    // ========== Lending ==========

    /// Deposit `amount` of the underlying and receive shares
    ///
    /// # Returns
    /// * Shares minted to the caller
    pub fn deposit(&mut self, amount: U256) -> U256 {
        if amount.is_zero() {
            self.env().revert(LyfError::ZeroAmount);
        }
        self.accrue_internal();

        let caller = self.env().caller();
        let mut deposits = self.deposit_pool();
        let shares = deposits.mint(amount, Rounding::Down).or_revert(&self.env());
        if shares.is_zero() {
            self.env().revert(LyfError::ZeroAmount);
        }
        self.deposits.set(deposits);
        self.shares.mint(caller, shares);

        self.env().emit_event(Deposited { owner: caller, amount, shares });
        self.underlying().transfer_from(caller, self.env().self_address(), amount);
        shares
    }

    /// Burn `shares` and receive the underlying they claim
    ///
    /// # Returns
    /// * Amount paid to the caller
    pub fn withdraw(&mut self, shares: U256) -> U256 {
        if shares.is_zero() {
            self.env().revert(LyfError::ZeroAmount);
        }
        self.accrue_internal();

        let caller = self.env().caller();
        if self.shares.balance_of(caller) < shares {
            self.env().revert(LyfError::InsufficientShares);
        }

        let free = self.free_liquidity();
        let mut deposits = self.deposit_pool();
        let amount = deposits.burn(shares, Rounding::Down).or_revert(&self.env());
        if amount > free {
            self.env().revert(LyfError::InsufficientLiquidity);
        }
        self.deposits.set(deposits);
        self.shares.burn(caller, shares);

        self.env().emit_event(Withdrawn { owner: caller, shares, amount });
        if !amount.is_zero() {
            self.underlying().transfer(caller, amount);
        }
        amount
    }

    /// Borrow `amount` of the underlying (whitelisted borrowers only)
    ///
    /// # Returns
    /// * Debt shares minted to the caller
    pub fn borrow(&mut self, amount: U256) -> U256 {
        let caller = self.env().caller();
        if !self.is_borrower(caller) {
            self.env().revert(LyfError::Unauthorized);
        }
        if amount.is_zero() {
            self.env().revert(LyfError::ZeroAmount);
        }
        self.accrue_internal();

        if amount > self.free_liquidity() {
            self.env().revert(LyfError::InsufficientLiquidity);
        }
        let mut debt = self.debt_pool();
        let debt_shares = debt.mint(amount, Rounding::Up).or_revert(&self.env());
        self.debt.set(debt);
        let held = self.debt_shares_of(caller);
        self.debt_shares.set(&caller, held + debt_shares);

        self.env().emit_event(Borrowed { borrower: caller, amount, debt_shares });
        self.underlying().transfer(caller, amount);
        debt_shares
    }

    /// Repay `debt_shares` of the caller's debt
    ///
    /// # Returns
    /// * Amount pulled from the caller (principal plus interest)
    pub fn repay(&mut self, debt_shares: U256) -> U256 {
        if debt_shares.is_zero() {
            self.env().revert(LyfError::ZeroAmount);
        }
        self.accrue_internal();

        let caller = self.env().caller();
        let held = self.debt_shares_of(caller);
        if debt_shares > held {
            self.env().revert(LyfError::InsufficientDebtShares);
        }
        let mut debt = self.debt_pool();
        let amount = debt.burn(debt_shares, Rounding::Up).or_revert(&self.env());
        self.debt.set(debt);
        self.debt_shares.set(&caller, held - debt_shares);

        self.env().emit_event(Repaid { borrower: caller, debt_shares, amount });
        if !amount.is_zero() {
            self.underlying().transfer_from(caller, self.env().self_address(), amount);
        }
        amount
    }

    /// Apply interest for the time elapsed since the last accrual
    pub fn accrue(&mut self) {
        self.apply_accrual(true);
    }

    /// Interest that would accrue between the last accrual and
    /// `now + offset_seconds`, using the current totals as a snapshot
    pub fn pending_interest(&self, offset_seconds: u64) -> U256 {
        let until = self.now().saturating_add(offset_seconds);
        let elapsed = until.saturating_sub(self.last_accrual_timestamp());
        let (interest, _) = self
            .interest_for(&self.deposit_pool(), &self.debt_pool(), elapsed)
            .or_revert(&self.env());
        interest
    }

    // ========== Admin Functions ==========

    /// Whitelist a borrower (admin via registry; must be an authorized borrower)
    pub fn add_borrower(&mut self, borrower: Address) {
        self.require_registry_admin();
        if !self.registry().is_authorized_borrower(borrower) {
            self.env().revert(LyfError::Unauthorized);
        }
        self.borrowers.set(&borrower, true);
        self.env().emit_event(BorrowerUpdated { borrower, whitelisted: true });
    }

    /// Remove a borrower from the whitelist (admin via registry)
    pub fn remove_borrower(&mut self, borrower: Address) {
        self.require_registry_admin();
        self.borrowers.set(&borrower, false);
        self.env().emit_event(BorrowerUpdated { borrower, whitelisted: false });
    }

    // ========== Views ==========

    pub fn is_borrower(&self, account: Address) -> bool {
        self.borrowers.get(&account).unwrap_or(false)
    }

    pub fn get_state(&self) -> VaultState {
        let deposits = self.deposit_pool();
        let debt = self.debt_pool();
        VaultState {
            total_token: deposits.total_units,
            total_supply_shares: deposits.total_shares,
            total_debt: debt.total_units,
            total_debt_shares: debt.total_shares,
            last_accrual_timestamp: self.last_accrual_timestamp(),
        }
    }

    /// Underlying held by the vault and not lent out
    pub fn free_liquidity(&self) -> U256 {
        self.deposit_pool()
            .total_units
            .saturating_sub(self.debt_pool().total_units)
    }

    /// Underlying per deposit share (WAD)
    pub fn exchange_rate(&self) -> U256 {
        self.deposit_pool().rate().or_revert(&self.env())
    }

    pub fn debt_shares_of(&self, borrower: Address) -> U256 {
        self.debt_shares.get(&borrower).unwrap_or(U256::zero())
    }

    /// Live amount owed for `debt_shares`, including pending interest,
    /// rounded up
    pub fn debt_share_value(&self, debt_shares: U256) -> U256 {
        let (_, debt) = self.projected().or_revert(&self.env());
        debt.units_for(debt_shares, Rounding::Up).or_revert(&self.env())
    }

    /// Live underlying claimed by `shares`, including pending interest,
    /// rounded down
    pub fn share_value(&self, shares: U256) -> U256 {
        let (deposits, _) = self.projected().or_revert(&self.env());
        deposits.units_for(shares, Rounding::Down).or_revert(&self.env())
    }

    /// `total_debt / total_token` (WAD)
    pub fn utilization(&self) -> U256 {
        let total_debt = self.debt_pool().total_units;
        interest::utilization(total_debt, self.free_liquidity()).or_revert(&self.env())
    }

    /// Annual borrow rate (WAD) at the current utilization
    pub fn current_borrow_rate(&self) -> U256 {
        let model = self.interest_model().or_revert(&self.env());
        model
            .borrow_rate(self.debt_pool().total_units, self.free_liquidity())
            .or_revert(&self.env())
    }

    pub fn get_token(&self) -> Address {
        self.token_address()
    }

    pub fn get_registry(&self) -> Option<Address> {
        self.registry.get()
    }

    // ========== Internal Functions ==========

    fn accrue_internal(&mut self) {
        self.apply_accrual(false);
    }

    /// With `hold_on_dust`, interest that rounds to zero on outstanding debt
    /// is left pending instead of being dropped
    fn apply_accrual(&mut self, hold_on_dust: bool) {
        let now = self.now();
        let last = self.last_accrual_timestamp();
        if now <= last {
            return;
        }

        let mut deposits = self.deposit_pool();
        let mut debt = self.debt_pool();
        let (accrued, rate) = self
            .interest_for(&deposits, &debt, now - last)
            .or_revert(&self.env());
        if hold_on_dust && accrued.is_zero() && !rate.is_zero() {
            return;
        }
        if !accrued.is_zero() {
            deposits.accrue(accrued).or_revert(&self.env());
            debt.accrue(accrued).or_revert(&self.env());
            self.deposits.set(deposits);
            self.debt.set(debt);
            self.env().emit_event(InterestAccrued {
                interest: accrued,
                rate,
                elapsed_seconds: now - last,
                total_debt: debt.total_units,
            });
        }
        self.last_accrual.set(now);
    }

    /// Interest and rate for `elapsed` seconds over the given pools
    fn interest_for(&self, deposits: &SharePool, debt: &SharePool, elapsed: u64) -> LyfResult<(U256, U256)> {
        if elapsed == 0 || debt.total_units.is_zero() {
            return Ok((U256::zero(), U256::zero()));
        }
        let model = self.interest_model()?;
        let supplied = math::checked_sub(deposits.total_units, debt.total_units)?;
        let rate = model.borrow_rate(debt.total_units, supplied)?;
        let accrual = accrue_interest(debt.total_units, rate, elapsed)?;
        Ok((accrual.interest_accrued, rate))
    }

    /// Pools as they would be after accruing up to now
    fn projected(&self) -> LyfResult<(SharePool, SharePool)> {
        let mut deposits = self.deposit_pool();
        let mut debt = self.debt_pool();
        let elapsed = self.now().saturating_sub(self.last_accrual_timestamp());
        let (accrued, _) = self.interest_for(&deposits, &debt, elapsed)?;
        deposits.accrue(accrued)?;
        debt.accrue(accrued)?;
        Ok((deposits, debt))
    }

    fn interest_model(&self) -> LyfResult<InterestModelParams> {
        self.registry()
            .interest_model_of(self.env().self_address())
            .ok_or(LyfError::InterestModelMissing)
    }

    fn deposit_pool(&self) -> SharePool {
        self.deposits.get().unwrap_or_default()
    }

    fn debt_pool(&self) -> SharePool {
        self.debt.get().unwrap_or_default()
    }

    fn last_accrual_timestamp(&self) -> u64 {
        self.last_accrual.get().unwrap_or(0)
    }

    /// Block time in seconds
    fn now(&self) -> u64 {
        self.env().get_block_time() / 1000
    }

    fn token_address(&self) -> Address {
        match self.token.get() {
            Some(token) => token,
            None => self.env().revert(LyfError::InvalidConfig),
        }
    }

    fn registry_address(&self) -> Address {
        match self.registry.get() {
            Some(registry) => registry,
            None => self.env().revert(LyfError::InvalidConfig),
        }
    }

    fn underlying(&self) -> Cep18Client {
        Cep18Client::new(self.env(), self.token_address())
    }

    fn registry(&self) -> RegistryClient {
        RegistryClient::new(self.env(), self.registry_address())
    }

    fn require_registry_admin(&self) {
        let caller = self.env().caller();
        if !self.registry().is_admin(caller) {
            self.env().revert(LyfError::NotAdmin);
        }
    }
}

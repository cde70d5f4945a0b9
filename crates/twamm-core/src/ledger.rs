//! # Token Ledger
//!
//! Token movements between accounts and the pool go through [`TokenLedger`].
//! The pool never holds balances itself; it only asks the ledger to pull
//! deposits from a caller and to push payouts back out.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::types::{AccountId, Token};

/// Failure reported by a token ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum LedgerError {
    #[error("insufficient {token} balance: needed {needed}, available {available}")]
    InsufficientBalance {
        token: Token,
        needed: u128,
        available: u128,
    },

    #[error("{token} balance overflow")]
    BalanceOverflow { token: Token },
}

/// Transfer capability for the two tokens of the pair
pub trait TokenLedger {
    /// Move `amount` of `token` from `from` into the pool
    fn transfer_from(&mut self, from: &AccountId, token: Token, amount: u128) -> Result<(), LedgerError>;

    /// Move `amount` of `token` from the pool to `to`
    fn transfer(&mut self, to: &AccountId, token: Token, amount: u128) -> Result<(), LedgerError>;
}

/// Ledger kept in memory, used by tests and the simulator
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryLedger {
    pool_account: AccountId,
    balances: BTreeMap<AccountId, [u128; 2]>,
}

impl InMemoryLedger {
    pub fn new(pool_account: impl Into<AccountId>) -> Self {
        Self {
            pool_account: pool_account.into(),
            balances: BTreeMap::new(),
        }
    }

    /// Account holding the pool's tokens
    pub fn pool_account(&self) -> &AccountId {
        &self.pool_account
    }

    /// Credit `amount` of `token` to `account` out of thin air
    pub fn mint(&mut self, account: &AccountId, token: Token, amount: u128) -> Result<(), LedgerError> {
        self.credit(account, token, amount)
    }

    pub fn balance_of(&self, account: &AccountId, token: Token) -> u128 {
        self.balances
            .get(account)
            .map(|balances| balances[slot(token)])
            .unwrap_or(0)
    }

    /// Tokens held by the pool account
    pub fn pool_balance(&self, token: Token) -> u128 {
        self.balance_of(&self.pool_account, token)
    }

    fn credit(&mut self, account: &AccountId, token: Token, amount: u128) -> Result<(), LedgerError> {
        let balance = &mut self.balances.entry(account.clone()).or_default()[slot(token)];
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { token })?;
        Ok(())
    }

    fn debit(&mut self, account: &AccountId, token: Token, amount: u128) -> Result<(), LedgerError> {
        let available = self.balance_of(account, token);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                token,
                needed: amount,
                available,
            });
        }
        if amount > 0 {
            self.balances.entry(account.clone()).or_default()[slot(token)] = available - amount;
        }
        Ok(())
    }

    fn move_tokens(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        token: Token,
        amount: u128,
    ) -> Result<(), LedgerError> {
        // Check the credit side first so a failure leaves both balances untouched
        self.balance_of(to, token)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { token })?;
        self.debit(from, token, amount)?;
        self.credit(to, token, amount)
    }
}

fn slot(token: Token) -> usize {
    match token {
        Token::A => 0,
        Token::B => 1,
    }
}

impl TokenLedger for InMemoryLedger {
    fn transfer_from(&mut self, from: &AccountId, token: Token, amount: u128) -> Result<(), LedgerError> {
        let pool = self.pool_account.clone();
        self.move_tokens(from, &pool, token, amount)
    }

    fn transfer(&mut self, to: &AccountId, token: Token, amount: u128) -> Result<(), LedgerError> {
        let pool = self.pool_account.clone();
        self.move_tokens(&pool, to, token, amount)
    }
}

// ============================================================================
// Settlement
// ============================================================================

/// A single token movement between an account and the pool
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub account: AccountId,
    pub token: Token,
    pub amount: u128,
}

/// Token movements an entry point requires, executed all together or not at all.
///
/// Deposits are pulled before anything is paid out. If any transfer fails,
/// the ones already made are reversed.
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
    pub deposits: Vec<Transfer>,
    pub payouts: Vec<Transfer>,
}

impl Settlement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull `amount` of `token` from `account`. Zero amounts are skipped.
    pub fn deposit(mut self, account: &AccountId, token: Token, amount: u128) -> Self {
        if amount > 0 {
            self.deposits.push(Transfer {
                account: account.clone(),
                token,
                amount,
            });
        }
        self
    }

    /// Pay `amount` of `token` to `account`. Zero amounts are skipped.
    pub fn payout(mut self, account: &AccountId, token: Token, amount: u128) -> Self {
        if amount > 0 {
            self.payouts.push(Transfer {
                account: account.clone(),
                token,
                amount,
            });
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty() && self.payouts.is_empty()
    }

    /// Run every transfer against `ledger`
    pub fn execute<L: TokenLedger + ?Sized>(&self, ledger: &mut L) -> Result<(), LedgerError> {
        for (index, deposit) in self.deposits.iter().enumerate() {
            if let Err(err) = ledger.transfer_from(&deposit.account, deposit.token, deposit.amount) {
                refund_deposits(ledger, &self.deposits[..index]);
                return Err(err);
            }
        }
        for (index, payout) in self.payouts.iter().enumerate() {
            if let Err(err) = ledger.transfer(&payout.account, payout.token, payout.amount) {
                reclaim_payouts(ledger, &self.payouts[..index]);
                refund_deposits(ledger, &self.deposits);
                return Err(err);
            }
        }
        Ok(())
    }
}

fn refund_deposits<L: TokenLedger + ?Sized>(ledger: &mut L, deposits: &[Transfer]) {
    for deposit in deposits.iter().rev() {
        if let Err(err) = ledger.transfer(&deposit.account, deposit.token, deposit.amount) {
            log::error!("failed to refund deposit of {} {} to {}: {}", deposit.amount, deposit.token, deposit.account, err);
        }
    }
}

fn reclaim_payouts<L: TokenLedger + ?Sized>(ledger: &mut L, payouts: &[Transfer]) {
    for payout in payouts.iter().rev() {
        if let Err(err) = ledger.transfer_from(&payout.account, payout.token, payout.amount) {
            log::error!("failed to reclaim payout of {} {} from {}: {}", payout.amount, payout.token, payout.account, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfers_move_balances() {
        let alice = AccountId::from("alice");
        let mut ledger = InMemoryLedger::new("pool");
        ledger.mint(&alice, Token::A, 100).unwrap();

        ledger.transfer_from(&alice, Token::A, 60).unwrap();
        assert_eq!(ledger.balance_of(&alice, Token::A), 40);
        assert_eq!(ledger.pool_balance(Token::A), 60);

        ledger.transfer(&alice, Token::A, 10).unwrap();
        assert_eq!(ledger.balance_of(&alice, Token::A), 50);
        assert_eq!(ledger.pool_balance(Token::A), 50);
        assert_eq!(ledger.balance_of(&alice, Token::B), 0);
    }

    #[test]
    fn test_insufficient_balance_is_typed() {
        let alice = AccountId::from("alice");
        let mut ledger = InMemoryLedger::new("pool");
        ledger.mint(&alice, Token::B, 5).unwrap();

        let err = ledger.transfer_from(&alice, Token::B, 6).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                token: Token::B,
                needed: 6,
                available: 5
            }
        );
        assert_eq!(ledger.balance_of(&alice, Token::B), 5);
        assert_eq!(
            ledger.transfer(&alice, Token::A, 1).unwrap_err().to_string(),
            "insufficient A balance: needed 1, available 0"
        );
    }

    #[test]
    fn test_settlement_reverts_on_failure() {
        let alice = AccountId::from("alice");
        let bob = AccountId::from("bob");
        let mut ledger = InMemoryLedger::new("pool");
        ledger.mint(&alice, Token::A, 100).unwrap();

        // Bob cannot cover the B deposit, so the A deposit is returned
        let settlement = Settlement::new()
            .deposit(&alice, Token::A, 100)
            .deposit(&bob, Token::B, 1);
        assert!(settlement.execute(&mut ledger).is_err());
        assert_eq!(ledger.balance_of(&alice, Token::A), 100);
        assert_eq!(ledger.pool_balance(Token::A), 0);

        // The pool cannot pay B, so the deposit is returned
        let settlement = Settlement::new()
            .deposit(&alice, Token::A, 40)
            .payout(&alice, Token::B, 5);
        assert!(settlement.execute(&mut ledger).is_err());
        assert_eq!(ledger.balance_of(&alice, Token::A), 100);

        let settlement = Settlement::new()
            .deposit(&alice, Token::A, 40)
            .payout(&bob, Token::A, 15)
            .payout(&bob, Token::B, 0);
        assert_eq!(settlement.payouts.len(), 1);
        settlement.execute(&mut ledger).unwrap();
        assert_eq!(ledger.balance_of(&alice, Token::A), 60);
        assert_eq!(ledger.balance_of(&bob, Token::A), 15);
        assert_eq!(ledger.pool_balance(Token::A), 25);
    }
}

//! Claim Ledger
//!
//! Token balances live in SPL token accounts. The pool keeps its own count of
//! outstanding Principal and Yield so that supply invariants can be checked
//! without loading the mints.

use anchor_lang::prelude::*;

use crate::math::MathError;

/// Outstanding claim supplies
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, InitSpace, Debug, Default)]
pub struct ClaimLedger {
    pub principal_supply: u64,
    pub yield_supply: u64,
}

impl ClaimLedger {
    /// Claims are always issued in equal pairs
    pub fn mint_pair(&mut self, shares: u64) -> Result<()> {
        self.principal_supply = self
            .principal_supply
            .checked_add(shares)
            .ok_or(MathError::Overflow)?;
        self.yield_supply = self
            .yield_supply
            .checked_add(shares)
            .ok_or(MathError::Overflow)?;
        Ok(())
    }

    /// Burns may be unequal once the pool matured
    pub fn burn(&mut self, principal: u64, yields: u64) -> Result<()> {
        self.principal_supply = self
            .principal_supply
            .checked_sub(principal)
            .ok_or(MathError::Overflow)?;
        self.yield_supply = self
            .yield_supply
            .checked_sub(yields)
            .ok_or(MathError::Overflow)?;
        Ok(())
    }

    pub fn is_balanced(&self) -> bool {
        self.principal_supply == self.yield_supply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_stay_balanced() {
        let mut ledger = ClaimLedger::default();
        ledger.mint_pair(100).unwrap();
        ledger.mint_pair(50).unwrap();
        ledger.burn(30, 30).unwrap();
        assert!(ledger.is_balanced());
        assert_eq!(ledger.principal_supply, 120);

        ledger.burn(20, 0).unwrap();
        assert!(!ledger.is_balanced());
    }

    #[test]
    fn test_cannot_burn_more_than_supply() {
        let mut ledger = ClaimLedger::default();
        ledger.mint_pair(10).unwrap();
        assert!(ledger.burn(11, 0).is_err());
        assert!(ledger.burn(0, 11).is_err());
    }
}

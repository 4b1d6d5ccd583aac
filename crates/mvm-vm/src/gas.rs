//! Gas accounting for metered work done on engine results.

use crate::error::GasError;

/// Anything that can be charged for metered work.
pub trait ChargeGas {
    fn charge_gas(&mut self, amount: u64, descriptor: &str) -> Result<(), GasError>;
}

/// Monotonic gas budget.
///
/// `consumed` only grows, except through [`GasMeter::refund_gas`]. A charge
/// that pushes `consumed` past `limit` still records the new total before
/// failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Meter with the largest possible limit.
    pub fn unlimited() -> Self {
        Self::new(u64::MAX)
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.consumed)
    }

    pub fn refund_gas(&mut self, amount: u64, descriptor: &str) -> Result<(), GasError> {
        if amount > self.consumed {
            return Err(GasError::NegativeGas {
                descriptor: descriptor.to_string(),
                amount,
                consumed: self.consumed,
            });
        }
        self.consumed -= amount;
        Ok(())
    }
}

impl ChargeGas for GasMeter {
    fn charge_gas(&mut self, amount: u64, descriptor: &str) -> Result<(), GasError> {
        let consumed = self
            .consumed
            .checked_add(amount)
            .ok_or_else(|| GasError::Overflow {
                descriptor: descriptor.to_string(),
            })?;
        self.consumed = consumed;

        if self.consumed > self.limit {
            return Err(GasError::LimitExceeded {
                descriptor: descriptor.to_string(),
                consumed: self.consumed,
                limit: self.limit,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_charge_within_limit() {
        let mut meter = GasMeter::new(100);
        meter.charge_gas(40, "a").unwrap();
        meter.charge_gas(60, "b").unwrap();
        assert_eq!(meter.consumed(), 100);
        assert_eq!(meter.remaining(), 0);
    }

    #[test]
    fn test_limit_exceeded_records_attempted_total() {
        let mut meter = GasMeter::new(100);
        meter.charge_gas(90, "a").unwrap();
        let err = meter.charge_gas(20, "b").unwrap_err();
        assert_eq!(
            err,
            GasError::LimitExceeded {
                descriptor: "b".to_string(),
                consumed: 110,
                limit: 100,
            }
        );
        assert_eq!(meter.consumed(), 110);
    }

    #[test]
    fn test_overflow_leaves_consumed() {
        let mut meter = GasMeter::unlimited();
        meter.charge_gas(u64::MAX - 1, "a").unwrap();
        let err = meter.charge_gas(2, "b").unwrap_err();
        assert!(matches!(err, GasError::Overflow { .. }));
        assert_eq!(meter.consumed(), u64::MAX - 1);
    }

    #[test]
    fn test_refund() {
        let mut meter = GasMeter::new(100);
        meter.charge_gas(50, "a").unwrap();
        meter.refund_gas(20, "r").unwrap();
        assert_eq!(meter.consumed(), 30);

        let err = meter.refund_gas(31, "r").unwrap_err();
        assert!(matches!(err, GasError::NegativeGas { amount: 31, consumed: 30, .. }));
        assert_eq!(meter.consumed(), 30);
    }

    proptest! {
        #[test]
        fn prop_first_charge_over_limit_fails(
            limit in 0u64..10_000,
            charges in proptest::collection::vec(0u64..1_000, 1..40),
        ) {
            let mut meter = GasMeter::new(limit);
            let mut total = 0u64;
            for amount in charges {
                total += amount;
                let result = meter.charge_gas(amount, "step");
                if total <= limit {
                    prop_assert!(result.is_ok());
                } else {
                    let is_limit_exceeded = matches!(result, Err(GasError::LimitExceeded { .. }));
                    prop_assert!(is_limit_exceeded);
                    prop_assert_eq!(meter.consumed(), total);
                    break;
                }
            }
        }

        #[test]
        fn prop_refund_over_consumed_is_noop(consumed in 0u64..1_000, extra in 1u64..1_000) {
            let mut meter = GasMeter::new(u64::MAX);
            meter.charge_gas(consumed, "c").unwrap();
            prop_assert!(meter.refund_gas(consumed + extra, "r").is_err());
            prop_assert_eq!(meter.consumed(), consumed);
        }
    }
}

use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::{
    models::{ExpenseError, ExpenseResult, ExpenseSummary, RawTransaction},
    storage::{PriceRepository, TransactionRepository},
};

/// 原生币最小单位的小数位数（1 ether = 10^18 wei）
pub const NATIVE_DECIMALS: u32 = 18;

/// gas 花费计算服务
#[derive(Clone)]
pub struct ExpenseService {
    transactions: Arc<dyn TransactionRepository>,
    prices: Arc<dyn PriceRepository>,
}

impl ExpenseService {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        prices: Arc<dyn PriceRepository>,
    ) -> Self {
        Self {
            transactions,
            prices,
        }
    }

    /// 计算地址最新快照的累计 gas 花费，并附带最新价格
    ///
    /// 返回的花费是原生币数量，不乘以价格。
    pub async fn compute_expense(&self, address: &str) -> ExpenseResult<ExpenseSummary> {
        if address.trim().is_empty() {
            return Err(ExpenseError::NotFound(address.to_string()));
        }

        let record = self
            .transactions
            .latest_for_address(address)
            .await?
            .ok_or_else(|| ExpenseError::NotFound(address.to_string()))?;

        let latest_price = self
            .prices
            .latest()
            .await?
            .ok_or_else(|| ExpenseError::Calculation("no price sample available".to_string()))?;

        let total_wei = total_gas_cost(&record.transactions)?;
        let total_expense = to_native_units(total_wei)?;

        debug!(
            address = %address,
            record_id = %record.id,
            transactions = record.len(),
            total_wei = %total_wei,
            "Expense computed"
        );

        Ok(ExpenseSummary {
            total_expense,
            current_price: latest_price.price,
        })
    }
}

/// 所有交易 `gasUsed * gasPrice` 之和（wei），溢出时报错
pub fn total_gas_cost(transactions: &[RawTransaction]) -> ExpenseResult<u128> {
    transactions
        .iter()
        .enumerate()
        .try_fold(0u128, |total, (index, tx)| {
            let gas_used = parse_gas_field(tx, "gasUsed", index)?;
            let gas_price = parse_gas_field(tx, "gasPrice", index)?;

            gas_used
                .checked_mul(gas_price)
                .and_then(|cost| total.checked_add(cost))
                .ok_or_else(|| {
                    ExpenseError::Calculation(format!("gas cost overflow at transaction {}", index))
                })
        })
}

/// wei 换算为原生币数量
pub fn to_native_units(wei: u128) -> ExpenseResult<Decimal> {
    let overflow = || ExpenseError::Calculation(format!("total {} wei is out of range", wei));

    let wei = i128::try_from(wei).map_err(|_| overflow())?;
    Decimal::try_from_i128_with_scale(wei, NATIVE_DECIMALS)
        .map(|amount| amount.normalize())
        .map_err(|_| overflow())
}

/// 十进制字符串、`0x` 十六进制字符串或非负整数
fn parse_gas_field(tx: &RawTransaction, field: &str, index: usize) -> ExpenseResult<u128> {
    let value = tx.get(field).ok_or_else(|| {
        ExpenseError::Calculation(format!("transaction {} has no {}", index, field))
    })?;

    let parsed = match value {
        Value::String(raw) => parse_integer(raw.trim()),
        Value::Number(number) => number.as_u64().map(u128::from),
        _ => None,
    };

    parsed.ok_or_else(|| {
        ExpenseError::Calculation(format!(
            "transaction {} has malformed {}: {}",
            index, field, value
        ))
    })
}

fn parse_integer(raw: &str) -> Option<u128> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u128::from_str_radix(hex, 16).ok(),
        None => raw.parse::<u128>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceSample, TransactionRecord};
    use crate::storage::{MemoryPriceStore, MemoryTransactionStore};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;

    struct Fixture {
        transactions: Arc<MemoryTransactionStore>,
        prices: Arc<MemoryPriceStore>,
        service: ExpenseService,
    }

    fn fixture() -> Fixture {
        let transactions = Arc::new(MemoryTransactionStore::new());
        let prices = Arc::new(MemoryPriceStore::new());
        let service = ExpenseService::new(transactions.clone(), prices.clone());
        Fixture {
            transactions,
            prices,
            service,
        }
    }

    #[tokio::test]
    async fn test_single_transaction_expense() {
        let f = fixture();
        f.transactions
            .insert(&TransactionRecord::new(
                "0xabc",
                vec![json!({"gasUsed": "21000", "gasPrice": "1000000000"})],
            ))
            .await
            .unwrap();
        f.prices.insert(&PriceSample::new(dec!(150000))).await.unwrap();

        let summary = f.service.compute_expense("0xabc").await.unwrap();
        assert_eq!(summary.total_expense, dec!(0.000021));
        assert_eq!(summary.current_price, dec!(150000));
    }

    #[tokio::test]
    async fn test_zero_transactions_cost_nothing() {
        let f = fixture();
        f.transactions
            .insert(&TransactionRecord::new("0xabc", vec![]))
            .await
            .unwrap();
        f.prices.insert(&PriceSample::new(dec!(2500))).await.unwrap();

        let summary = f.service.compute_expense("0xabc").await.unwrap();
        assert_eq!(summary.total_expense, Decimal::ZERO);
        assert_eq!(summary.current_price, dec!(2500));
    }

    #[tokio::test]
    async fn test_unknown_address_is_not_found() {
        let f = fixture();
        f.prices.insert(&PriceSample::new(dec!(1))).await.unwrap();

        let err = f.service.compute_expense("0xmissing").await.unwrap_err();
        assert!(err.is_not_found());

        let err = f.service.compute_expense("").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_price_is_calculation_error() {
        let f = fixture();
        f.transactions
            .insert(&TransactionRecord::new("0xabc", vec![]))
            .await
            .unwrap();

        let err = f.service.compute_expense("0xabc").await.unwrap_err();
        assert!(matches!(err, ExpenseError::Calculation(_)));
    }

    #[tokio::test]
    async fn test_uses_latest_record_and_latest_price() {
        let f = fixture();
        let now = Utc::now();
        f.transactions
            .insert(&TransactionRecord::with_timestamp(
                "0xabc",
                vec![json!({"gasUsed": "1", "gasPrice": "1000000000000000000"})],
                now,
            ))
            .await
            .unwrap();
        f.transactions
            .insert(&TransactionRecord::with_timestamp(
                "0xabc",
                vec![json!({"gasUsed": "2", "gasPrice": "1000000000000000000"})],
                now + Duration::seconds(1),
            ))
            .await
            .unwrap();
        f.prices
            .insert(&PriceSample::at(dec!(200), now + Duration::minutes(10)))
            .await
            .unwrap();
        f.prices.insert(&PriceSample::at(dec!(100), now)).await.unwrap();

        let summary = f.service.compute_expense("0xabc").await.unwrap();
        assert_eq!(summary.total_expense, dec!(2));
        assert_eq!(summary.current_price, dec!(200));
    }

    #[test]
    fn test_sums_mixed_representations() {
        let txs = vec![
            json!({"gasUsed": "21000", "gasPrice": "1000000000"}),
            json!({"gasUsed": 21000, "gasPrice": " 1000000000 "}),
            json!({"gasUsed": "0x5208", "gasPrice": "0x3B9ACA00"}),
        ];
        assert_eq!(total_gas_cost(&txs).unwrap(), 3 * 21_000_000_000_000u128);
    }

    #[test]
    fn test_malformed_gas_fields_are_rejected() {
        let cases = vec![
            json!({"gasUsed": "abc", "gasPrice": "1"}),
            json!({"gasUsed": "1.5", "gasPrice": "1"}),
            json!({"gasUsed": -1, "gasPrice": "1"}),
            json!({"gasUsed": 2.5, "gasPrice": "1"}),
            json!({"gasUsed": "", "gasPrice": "1"}),
            json!({"gasUsed": "0x", "gasPrice": "1"}),
            json!({"gasPrice": "1"}),
            json!({"gasUsed": null, "gasPrice": "1"}),
            json!("not an object"),
        ];

        for tx in cases {
            let result = total_gas_cost(&[tx.clone()]);
            assert!(
                matches!(result, Err(ExpenseError::Calculation(_))),
                "expected failure for {}",
                tx
            );
        }
    }

    #[test]
    fn test_values_beyond_safe_float_range_stay_exact() {
        // 2^53 + 1 无法用 f64 精确表示
        let txs = vec![json!({"gasUsed": "9007199254740993", "gasPrice": "1"})];
        assert_eq!(total_gas_cost(&txs).unwrap(), 9_007_199_254_740_993u128);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let max = u128::MAX.to_string();
        let txs = vec![json!({"gasUsed": max, "gasPrice": "2"})];
        assert!(matches!(
            total_gas_cost(&txs),
            Err(ExpenseError::Calculation(_))
        ));

        let txs = vec![
            json!({"gasUsed": u128::MAX.to_string(), "gasPrice": "1"}),
            json!({"gasUsed": "1", "gasPrice": "1"}),
        ];
        assert!(total_gas_cost(&txs).is_err());
    }

    #[test]
    fn test_native_unit_conversion() {
        assert_eq!(to_native_units(0).unwrap(), Decimal::ZERO);
        assert_eq!(to_native_units(21_000_000_000_000).unwrap(), dec!(0.000021));
        assert_eq!(
            to_native_units(1_500_000_000_000_000_000).unwrap(),
            dec!(1.5)
        );
        assert!(to_native_units(u128::MAX).is_err());
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 法币价格采样点，只追加不修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub id: Uuid,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl PriceSample {
    /// 以当前时间创建采样点
    pub fn new(price: Decimal) -> Self {
        Self::at(price, Utc::now())
    }

    pub fn at(price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            price,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_timestamp_is_now() {
        let before = Utc::now();
        let sample = PriceSample::new(dec!(150000));
        let after = Utc::now();

        assert_eq!(sample.price, dec!(150000));
        assert!(sample.timestamp >= before && sample.timestamp <= after);
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 地址的累计 gas 花费（原生币单位）以及最新法币价格
///
/// 两个字段分开返回，换算成法币由调用方完成。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub total_expense: Decimal,
    pub current_price: Decimal,
}

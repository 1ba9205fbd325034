use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// Per-category total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense: Option<f64>,
}

impl CategoryTotal {
    pub fn new(category: impl Into<String>, total: f64) -> Self {
        Self {
            category: category.into(),
            total,
            income: None,
            expense: None,
        }
    }
}

/// Current-month summary, recomputed server-side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct MonthlyReport {
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub total_income: f64,
    #[serde(default)]
    pub total_expense: f64,
    #[serde(default, deserialize_with = "lenient_categories")]
    pub categories: Vec<CategoryTotal>,
}

/// Totals per category over an optional date range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct CategoryReport {
    #[serde(default, deserialize_with = "lenient_categories")]
    pub categories: Vec<CategoryTotal>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoriesWire {
    List(Vec<CategoryTotal>),
    Split(BTreeMap<String, SplitTotals>),
}

#[derive(Deserialize)]
struct SplitTotals {
    #[serde(default)]
    income: f64,
    #[serde(default)]
    expense: f64,
}

/// Accepts both the `[{category, total}]` list and the
/// `{name: {income, expense}}` map the category report endpoint returns.
fn lenient_categories<'de, D>(deserializer: D) -> Result<Vec<CategoryTotal>, D::Error>
where
    D: Deserializer<'de>,
{
    let wire = Option::<CategoriesWire>::deserialize(deserializer)?;
    Ok(match wire {
        None => Vec::new(),
        Some(CategoriesWire::List(list)) => list,
        Some(CategoriesWire::Split(map)) => map
            .into_iter()
            .map(|(category, totals)| CategoryTotal {
                category,
                total: if totals.expense > 0.0 {
                    totals.expense
                } else {
                    totals.income
                },
                income: Some(totals.income),
                expense: Some(totals.expense),
            })
            .collect(),
    })
}

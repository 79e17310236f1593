//! SoQL query parameters and literal quoting.

/// Column holding the market and exchange name in both report programs.
pub const MARKET_NAME_FIELD: &str = "market_and_exchange_names";
/// Column holding the CFTC contract market code.
pub const CONTRACT_CODE_FIELD: &str = "cftc_contract_market_code";
/// Ascending report date ordering.
pub const ORDER_BY_DATE: &str = "report_date_as_yyyy_mm_dd asc";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SodaQuery {
    pub where_clause: Option<String>,
    pub select: Option<String>,
    pub order: Option<String>,
}

impl SodaQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    #[must_use]
    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    #[must_use]
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// `market_and_exchange_names = '<name>'`, ordered by report date.
    #[must_use]
    pub fn market_name(name: &str) -> Self {
        Self::new()
            .filter(format!("{MARKET_NAME_FIELD} = {}", quote(name)))
            .order(ORDER_BY_DATE)
    }

    /// `cftc_contract_market_code in ('a','b',...)`.
    #[must_use]
    pub fn contract_codes<S: AsRef<str>>(codes: &[S]) -> Self {
        Self::new().filter(in_clause(CONTRACT_CODE_FIELD, codes))
    }

    #[must_use]
    pub fn distinct_market_names() -> Self {
        Self::new().select(format!("distinct {MARKET_NAME_FIELD}"))
    }

    /// Query parameters for one page.
    pub(crate) fn page_params(&self, limit: usize, offset: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![("$limit", limit.to_string()), ("$offset", offset.to_string())];
        if let Some(clause) = &self.where_clause {
            params.push(("$where", clause.clone()));
        }
        if let Some(select) = &self.select {
            params.push(("$select", select.clone()));
        }
        if let Some(order) = &self.order {
            params.push(("$order", order.clone()));
        }
        params
    }
}

/// Single-quoted SoQL string literal; embedded quotes are doubled.
#[must_use]
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[must_use]
pub fn in_clause<S: AsRef<str>>(column: &str, values: &[S]) -> String {
    let quoted = values
        .iter()
        .map(|v| quote(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    format!("{column} in ({quoted})")
}

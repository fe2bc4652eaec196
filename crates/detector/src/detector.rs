use common::{ColumnMap, DetectionConfig, RawColumn, RawTable};
use tracing::{debug, info};

const SALES_ALIASES: &[&str] = &[
    "sales",
    "revenue",
    "amount",
    "value",
    "mrr",
    "daily_revenue",
    "units_sold",
    "total_sales",
    "price",
    "total",
    "income",
];
const DATE_ALIASES: &[&str] = &["date", "timestamp", "day", "datetime", "time", "period"];
const PRODUCT_ALIASES: &[&str] = &[
    "product",
    "item",
    "sku",
    "product_id",
    "product_name",
    "category",
    "service",
];
const REGION_ALIASES: &[&str] = &["region", "area", "location", "city", "state", "country"];
const CUSTOMER_ALIASES: &[&str] = &["customer", "client", "user", "account"];

/// Names tried, in order, for a synthesized date axis.
const SYNTHETIC_DATE_NAMES: &[&str] = &["date", "auto_date"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Sales,
    Date,
    Product,
    Region,
    Customer,
}

impl Role {
    const ALL: [Role; 5] = [
        Role::Sales,
        Role::Date,
        Role::Product,
        Role::Region,
        Role::Customer,
    ];

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Role::Sales => SALES_ALIASES,
            Role::Date => DATE_ALIASES,
            Role::Product => PRODUCT_ALIASES,
            Role::Region => REGION_ALIASES,
            Role::Customer => CUSTOMER_ALIASES,
        }
    }
}

/// Lowercase, trim, and collapse runs of separators into a single `_`.
pub fn normalize_column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if c.is_whitespace() || matches!(c, '-' | '_' | '.' | '/') {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.extend(c.to_lowercase());
    }
    out
}

/// Infers the date, sales and optional category columns of a raw table.
///
/// Never fails: an unresolved sales column is left as `None` for the
/// validation gate to report, and a missing date column is replaced by a
/// synthesized daily axis.
pub struct ColumnDetector {
    sample_size: usize,
}

impl ColumnDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            sample_size: config.sample_size,
        }
    }

    pub fn detect(&self, table: &RawTable) -> ColumnMap {
        let normalized: Vec<String> = table
            .columns
            .iter()
            .map(|c| normalize_column_name(&c.name))
            .collect();

        // Exact alias membership, one role per column, first match per role.
        let mut roles: Vec<Option<Role>> = vec![None; table.columns.len()];
        for (idx, name) in normalized.iter().enumerate() {
            let role = Role::ALL.into_iter().find(|role| {
                role.aliases().contains(&name.as_str()) && !roles.contains(&Some(*role))
            });
            roles[idx] = role;
        }

        let find = |roles: &[Option<Role>], role: Role| roles.iter().position(|r| *r == Some(role));

        if find(&roles, Role::Sales).is_none() {
            if let Some(idx) = self.sales_by_substring(table, &normalized, &roles) {
                debug!(column = %table.columns[idx].name, "Sales column matched by substring");
                roles[idx] = Some(Role::Sales);
            } else if let Some(idx) = first_unclaimed(table, &roles, RawColumn::is_numeric) {
                debug!(column = %table.columns[idx].name, "Sales column matched by numeric type");
                roles[idx] = Some(Role::Sales);
            }
        }

        if find(&roles, Role::Date).is_none() {
            let sample_size = self.sample_size;
            if let Some(idx) =
                first_unclaimed(table, &roles, |c| c.sample_parses_as_dates(sample_size))
            {
                debug!(column = %table.columns[idx].name, "Date column matched by parsing sample");
                roles[idx] = Some(Role::Date);
            }
        }

        let name_of = |role: Role| find(&roles, role).map(|idx| table.columns[idx].name.clone());

        let (date_column, date_synthesized) = match name_of(Role::Date) {
            Some(name) => (name, false),
            None => (synthetic_date_name(table), true),
        };

        let additional_columns = table
            .columns
            .iter()
            .zip(&roles)
            .filter(|(_, role)| role.is_none())
            .map(|(c, _)| c.name.clone())
            .collect();

        let map = ColumnMap {
            sales_column: name_of(Role::Sales),
            date_column,
            date_synthesized,
            product_column: name_of(Role::Product),
            region_column: name_of(Role::Region),
            customer_column: name_of(Role::Customer),
            additional_columns,
        };

        info!(
            sales = ?map.sales_column,
            date = %map.date_column,
            date_synthesized = map.date_synthesized,
            product = ?map.product_column,
            "Detected columns"
        );

        map
    }

    /// Substring containment against the sales aliases, preferring numeric
    /// columns over text ones.
    fn sales_by_substring(
        &self,
        table: &RawTable,
        normalized: &[String],
        roles: &[Option<Role>],
    ) -> Option<usize> {
        let candidates: Vec<usize> = normalized
            .iter()
            .enumerate()
            .filter(|(idx, name)| {
                roles[*idx].is_none() && SALES_ALIASES.iter().any(|alias| name.contains(alias))
            })
            .map(|(idx, _)| idx)
            .collect();

        candidates
            .iter()
            .copied()
            .find(|&idx| table.columns[idx].is_numeric())
            .or_else(|| candidates.first().copied())
    }
}

impl Default for ColumnDetector {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

fn first_unclaimed(
    table: &RawTable,
    roles: &[Option<Role>],
    predicate: impl Fn(&RawColumn) -> bool,
) -> Option<usize> {
    table
        .columns
        .iter()
        .enumerate()
        .find(|(idx, column)| roles[*idx].is_none() && predicate(*column))
        .map(|(idx, _)| idx)
}

/// A name for the synthesized axis that does not collide with a real column.
fn synthetic_date_name(table: &RawTable) -> String {
    let taken = |name: &str| table.column_names().any(|existing| existing == name);
    if let Some(name) = SYNTHETIC_DATE_NAMES.iter().find(|name| !taken(**name)) {
        return (*name).to_string();
    }
    (1..)
        .map(|i| format!("auto_date_{i}"))
        .find(|name| !taken(name))
        .unwrap_or_else(|| "auto_date".to_string())
}

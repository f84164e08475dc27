//! The predefined queries that stand in for real SQL execution.

use crate::model::{
    make_columns, LocalDataset, PredefinedQuery, QueryResult, QuerySource, Row, Value,
};

/// Northwind CSV exports used by the remote queries.
pub const NORTHWIND_BASE: &str = "https://raw.githubusercontent.com/graphql-compose/graphql-compose-examples/master/examples/northwind/data/csv";

/// Query text used for the first tab when the catalog is empty.
pub const DEFAULT_SQL: &str = "SELECT 1;";

/// All predefined queries in match order. The first entry is the default.
pub fn predefined_queries() -> Vec<PredefinedQuery> {
    vec![
        PredefinedQuery {
            id: "nw_customers",
            title: "Customers",
            description: Some("First 200 customers"),
            sql: "SELECT * FROM Customers LIMIT 200;",
            source: QuerySource::RemoteCsv {
                file: "customers.csv",
                limit: Some(200),
            },
        },
        PredefinedQuery {
            id: "nw_orders",
            title: "Orders",
            description: Some("Orders sample (virtualized)"),
            sql: "SELECT * FROM Orders;",
            source: QuerySource::RemoteCsv {
                file: "orders.csv",
                limit: None,
            },
        },
        PredefinedQuery {
            id: "nw_products",
            title: "Products",
            description: Some("Products sample"),
            sql: "SELECT * FROM Products;",
            source: QuerySource::RemoteCsv {
                file: "products.csv",
                limit: None,
            },
        },
        PredefinedQuery {
            id: "users",
            title: "Users",
            description: Some("1,000 generated users (offline)"),
            sql: "SELECT * FROM users;",
            source: QuerySource::Local(LocalDataset::Users),
        },
        PredefinedQuery {
            id: "sales",
            title: "Sales",
            description: Some("5,000 generated orders (offline)"),
            sql: "SELECT * FROM sales;",
            source: QuerySource::Local(LocalDataset::Sales),
        },
        PredefinedQuery {
            id: "teams",
            title: "Teams",
            description: Some("Team roster (offline)"),
            sql: "SELECT * FROM teams;",
            source: QuerySource::Local(LocalDataset::Teams),
        },
    ]
}

/// Source used when an id is not in the catalog.
pub const UNKNOWN_QUERY_SOURCE: QuerySource = QuerySource::RemoteCsv {
    file: "customers.csv",
    limit: Some(100),
};

/// Pick the predefined query a piece of SQL text "runs".
///
/// The first query whose title (up to the first `:`) or id occurs in the text
/// wins; with no match the first catalog entry is used. Matching is
/// case-sensitive.
pub fn match_query<'a>(
    predefined: &'a [PredefinedQuery],
    text: &str,
) -> Option<&'a PredefinedQuery> {
    predefined
        .iter()
        .find(|p| {
            let title_key = p.title.split(':').next().unwrap_or(p.title);
            text.contains(title_key) || text.contains(p.id)
        })
        .or_else(|| predefined.first())
}

/// Resolve the source for an id, falling back to the unknown-id source.
pub fn source_for_id(predefined: &[PredefinedQuery], id: &str) -> QuerySource {
    predefined
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.source)
        .unwrap_or(UNKNOWN_QUERY_SOURCE)
}

/// Canned result used when loading the real one fails.
pub fn fallback_result(query: &PredefinedQuery) -> QueryResult {
    match query.source {
        QuerySource::RemoteCsv { .. } => QueryResult::placeholder(),
        QuerySource::Local(dataset) => local_dataset(dataset),
    }
}

pub fn local_dataset(dataset: LocalDataset) -> QueryResult {
    match dataset {
        LocalDataset::Users => users(),
        LocalDataset::Sales => sales(),
        LocalDataset::Teams => teams(),
    }
}

fn row(pairs: Vec<(&str, Value)>) -> Row {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn users() -> QueryResult {
    const COUNTRIES: [&str; 5] = ["US", "UK", "DE", "IN", "SG"];
    let columns = make_columns(&["id", "name", "email", "age", "country"]);
    let rows = (0..1000i64)
        .map(|i| {
            row(vec![
                ("id", Value::Int(i + 1)),
                ("name", Value::Text(format!("User {}", i + 1))),
                ("email", Value::Text(format!("user{}@example.com", i + 1))),
                ("age", Value::Int(18 + (i * 7) % 50)),
                ("country", Value::from(COUNTRIES[(i % 5) as usize])),
            ])
        })
        .collect();
    QueryResult::new(columns, rows, 0)
}

fn sales() -> QueryResult {
    const REGIONS: [&str; 3] = ["NA", "EMEA", "APAC"];
    let columns = make_columns(&["order_id", "sku", "region", "quantity", "price_usd"]);
    let rows = (0..5000i64)
        .map(|i| {
            let price = 10.0 + (i % 50) as f64 * 0.75;
            row(vec![
                ("order_id", Value::Int(100_000 + i)),
                ("sku", Value::Text(format!("SKU-{:04}", i % 250))),
                ("region", Value::from(REGIONS[(i % 3) as usize])),
                ("quantity", Value::Int(1 + i % 20)),
                ("price_usd", Value::Float((price * 100.0).round() / 100.0)),
            ])
        })
        .collect();
    QueryResult::new(columns, rows, 0)
}

fn teams() -> QueryResult {
    let columns = make_columns(&["team", "members", "active_projects"]);
    let rows = [
        ("Analytics", 8, 3),
        ("Data Platform", 12, 5),
        ("Security", 6, 2),
        ("Governance", 9, 4),
    ]
    .into_iter()
    .map(|(team, members, projects)| {
        row(vec![
            ("team", Value::from(team)),
            ("members", Value::Int(members)),
            ("active_projects", Value::Int(projects)),
        ])
    })
    .collect();
    QueryResult::new(columns, rows, 0)
}

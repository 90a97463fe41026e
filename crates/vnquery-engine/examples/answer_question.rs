//! Answer one structured stock query against live TCBS data
//!
//! The natural-language layer is an external collaborator; this example
//! starts from its JSON output. Pass a query as the first argument:
//!
//! ```bash
//! cargo run --example answer_question '{
//!     "query_type": "ranking_query",
//!     "requested_field": "open",
//!     "tickers": ["BID", "TCB", "VCB"],
//!     "days": 10,
//!     "aggregate": "min"
//! }'
//! ```

use std::env;
use std::sync::Arc;

use chrono::Utc;
use vnquery_core::Query;
use vnquery_engine::{QueryRouter, TcbsClient};

// Total traded volume of VIC over the last ten days.
const DEFAULT_QUERY: &str = r#"{
    "query_type": "aggregate_query",
    "requested_field": "volume",
    "tickers": ["VIC"],
    "days": 10,
    "aggregate": "sum"
}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vnquery_engine::logging::init_tracing();

    let args: Vec<String> = env::args().collect();
    let raw = if args.len() > 1 {
        args[1].as_str()
    } else {
        DEFAULT_QUERY
    };

    let query: Query = serde_json::from_str(raw)?;
    // Relative shorthands like "days": 10 become literal dates here; the
    // router itself only reads start/end.
    let query = query.resolve_relative_range(Utc::now().date_naive());

    println!("=== vnquery ===\n");
    println!("query:\n{}\n", serde_json::to_string_pretty(&query)?);

    let router = QueryRouter::new(Arc::new(TcbsClient::new()));
    let answer = router.dispatch(&query).await;

    println!("answer:\n{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}

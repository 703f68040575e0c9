//! Fetches the public countries GraphQL API and prints every country.
//!
//! Demonstrates the full lifecycle: evaluate, subscribe, and a single manual
//! refetch when the first attempt fails.
//!
//! Run with: `cargo run --example countries`

use std::sync::Arc;

use serde::Deserialize;

use refetch::prelude::*;
use refetch::transport::http::HttpTransport;

const COUNTRIES_ENDPOINT: &str = "https://countries.trevorblades.com/";
const ALL_COUNTRIES_QUERY: &str = "query { countries { code name } }";

#[derive(Debug, Clone, Deserialize)]
struct AllCountries {
    countries: Vec<Country>,
}

#[derive(Debug, Clone, Deserialize)]
struct Country {
    code: String,
    name: String,
}

#[tokio::main]
async fn main() {
    let transport = Arc::new(HttpTransport::new());
    let config = ControllerConfig::new(COUNTRIES_ENDPOINT);
    let mut controller: QueryController<&str, AllCountries> =
        QueryController::new(config, transport);

    let mut updates = controller.subscribe();
    controller.evaluate(ALL_COUNTRIES_QUERY, Variables::new());

    let mut retried = false;
    loop {
        let state = updates
            .wait_for(|state| !state.is_pending())
            .await
            .expect("controller alive")
            .clone();

        match state {
            QueryState::Success { data } => {
                for country in data.countries {
                    println!("{} ({})", country.name, country.code);
                }
                break;
            }
            QueryState::Error { errors } => {
                eprintln!("query failed:");
                for error in &errors {
                    eprintln!("  {}", error.message);
                }
                if retried {
                    std::process::exit(1);
                }
                // This might just have been a hiccup; retry once.
                eprintln!("retrying...");
                retried = true;
                controller.refetch();
            }
            QueryState::Pending => unreachable!("wait_for filters pending states"),
        }
    }
}

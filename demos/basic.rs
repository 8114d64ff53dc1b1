use std::sync::Arc;

use schooladmin_http::{
    ApiClient, ApiError, ApiResponse, FileTokenStore, MemoryTokenStore, RequestOptions,
    TokenStorage, TokenStore,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Student {
    id: u64,
    name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let persistent = Arc::new(FileTokenStore::new("tokens.json"));
    if let Ok(token) = std::env::var("API_TOKEN") {
        persistent.set("token", &token)?;
    }

    let api = ApiClient::from_env()
        .with_token_storage(TokenStorage::new(persistent, Arc::new(MemoryTokenStore::new())))
        .with_session_expired_handler(|to: &str| eprintln!("session expired, please log in at {to}"));

    let result: Result<ApiResponse<Vec<Student>>, ApiError> = api
        .get("/students", RequestOptions::params([("page", 1), ("limit", 20)]))
        .await;

    match result {
        Ok(response) => {
            for student in response.into_data() {
                println!("{} {}", student.id, student.name);
            }
        }
        Err(err) => {
            let envelope = err.envelope();
            eprintln!("request failed: {envelope}");
            for (field, messages) in envelope.errors.iter().flatten() {
                eprintln!("  {field}: {}", messages.join(", "));
            }
        }
    }

    Ok(())
}

/*
[INPUT]:  FIRETODO_API_KEY / FIRETODO_PROJECT_ID, email and password arguments
[OUTPUT]: Signed-in identity and the user's stored task documents
[POS]:    Examples - authentication and query flow demonstration
[UPDATE]: When auth flow or store API changes
*/

use std::sync::Arc;

use firetodo_adapter::*;

/// Example: sign in, then list the documents owned by the user
///
/// Usage: `cargo run --example auth_example -- <email> <password>`
#[tokio::main]
async fn main() {
    println!("=== firetodo Authentication Example ===\n");

    let (Ok(api_key), Ok(project_id)) = (
        std::env::var("FIRETODO_API_KEY"),
        std::env::var("FIRETODO_PROJECT_ID"),
    ) else {
        eprintln!("Set FIRETODO_API_KEY and FIRETODO_PROJECT_ID first");
        return;
    };
    let mut args = std::env::args().skip(1);
    let (Some(email), Some(password)) = (args.next(), args.next()) else {
        eprintln!("Usage: auth_example <email> <password>");
        return;
    };

    let client = match FirebaseClient::new(&api_key, &project_id) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    println!("✓ HTTP client created");

    let auth = Arc::new(FirebaseAuth::new(client.clone()));
    let identity = match auth.sign_in(&email, &password).await {
        Ok(identity) => identity,
        Err(e) => {
            eprintln!("Sign-in failed: {} ({:?})", e, e.auth_code());
            return;
        }
    };
    println!("✓ Signed in as {} (uid {})", identity.label(), identity.uid);

    let store = FirestoreStore::new(client, auth.clone());
    let owner = serde_json::Value::String(identity.uid.clone());
    match store.query_equal("tasks", "userId", &owner).await {
        Ok(documents) => {
            println!("✓ {} task document(s)", documents.len());
            for document in documents {
                println!("  {} {}", document.id, serde_json::Value::Object(document.fields));
            }
        }
        Err(e) => eprintln!("Query failed: {}", e),
    }

    if let Err(e) = auth.sign_out().await {
        eprintln!("Sign-out failed: {}", e);
    }
    println!("\n✓ Authentication example complete");
}

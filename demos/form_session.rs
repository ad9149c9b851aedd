//! Collaborative form editing example
//!
//! Three collaborators edit the same form at once; the hub resolves every edit and
//! prints how it was classified.
//!
//! Run with: cargo run --example form_session

use form_merge::{Field, FormHub, Operation, Outcome};
use serde_json::json;

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("Form Merge Session Example");
    println!("==========================\n");

    let hub = FormHub::new();
    hub.load_form(
        "signup",
        vec![
            Field::new("name").with_attribute("label", "Name"),
            Field::new("email").with_attribute("label", "Email"),
            Field::new("phone").with_attribute("label", "Phone"),
        ],
    );

    let t = now_ms();
    let edits = vec![
        Operation::update("bob", t, "email", json!({"required": true}).as_object().cloned().unwrap_or_default()),
        Operation::delete("carol", t + 10, "phone"),
        Operation::update("alice", t + 20, "phone", json!({"label": "Mobile"}).as_object().cloned().unwrap_or_default()),
        Operation::update("alice", t + 30, "email", json!({"label": "E-mail"}).as_object().cloned().unwrap_or_default()),
        Operation::add("bob", t + 40, Field::new("company").with_attribute("label", "Company"), 1),
        Operation::add("carol", t + 45, Field::new("role").with_attribute("label", "Role"), 1),
        Operation::reorder("alice", t + 50, 0, 3),
    ];

    let mut handles = Vec::new();
    for op in edits {
        let hub = hub.clone();
        handles.push(tokio::spawn(async move {
            let actor = op.actor_id.clone();
            let kind = op.kind.name();
            let outcome = hub.submit("signup", op);
            (actor, kind, outcome)
        }));
    }

    for handle in handles {
        match handle.await {
            Ok((actor, kind, outcome)) => {
                let label = outcome.resolution.outcome().unwrap_or(Outcome::Rejected);
                match outcome.resolution.rejected.first() {
                    Some(rejection) => println!("{:<6} {:<8} {} ({})", actor, kind, label, rejection.reason),
                    None => println!("{:<6} {:<8} {}", actor, kind, label),
                }
            }
            Err(e) => eprintln!("task failed: {}", e),
        }
    }

    println!("\nFinal field list:");
    for field in hub.snapshot("signup").unwrap_or_default() {
        println!("  {} {:<8} {}", field.position, field.id, serde_json::Value::Object(field.attributes));
    }
}

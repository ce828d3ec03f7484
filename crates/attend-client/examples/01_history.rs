use anyhow::Result;
use attend_client::{AttendClient, ChatApi};
use attend_types::Role;

#[tokio::main]
async fn main() -> Result<()> {
    let base_url = std::env::var("ATTEND_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000/api".to_string());
    let client = AttendClient::with_base_url(base_url)?;

    let conversation = client.chat().create_conversation(None, "user123").await?;
    println!("Created conversation {}", conversation.id);

    let receipt = client
        .send_message(&conversation.id, "We are planning a garden wedding for 80 guests", Role::User)
        .await?;
    if let Some(reply) = receipt.ai_message {
        println!("assistant: {}", reply.content);
    }

    let page = client.fetch_messages(&conversation.id, 1, 20).await?;
    println!(
        "Page {}/{} ({} messages total)",
        page.pagination.current_page, page.pagination.last_page, page.pagination.total
    );
    // Pages come newest first
    for message in page.messages.iter().rev() {
        println!("{:>9}: {}", message.role.as_str(), message.content);
    }

    Ok(())
}

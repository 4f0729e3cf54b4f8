//! Voices and status command handlers.

use anyhow::Result;
use readaloud_playback::HttpDeliveryClient;

/// Print the server's voices as a table.
pub async fn list(server: &str) -> Result<()> {
    let client = HttpDeliveryClient::new(server)?;
    let voices = client.voices().await?;

    if voices.is_empty() {
        println!("No voices available (is a speech model loaded?)");
        return Ok(());
    }

    println!("{:<14} {:<16} {:<20} GENDER", "ID", "NAME", "CATEGORY");
    for voice in voices {
        println!(
            "{:<14} {:<16} {:<20} {:?}",
            voice.id, voice.name, voice.category, voice.gender
        );
    }
    Ok(())
}

/// Print model readiness and queue count.
pub async fn status(server: &str) -> Result<()> {
    let client = HttpDeliveryClient::new(server)?;
    let status = client.status().await?;

    println!("Server:        {}", client.base_url());
    println!("Model loaded:  {}", if status.model_loaded { "yes" } else { "no" });
    match status.sample_rate {
        Some(rate) => println!("Sample rate:   {rate} Hz"),
        None => println!("Sample rate:   -"),
    }
    println!("Active queues: {}", status.active_queues);
    Ok(())
}

//! Output formatting for CLI

use crate::commands::Transcript;
use console::style;
use serde::Serialize;

/// Output format options
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

fn print_json<T: Serialize + ?Sized>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print every dispatched event and rejected call
pub fn print_transcript(transcript: &Transcript, format: &str) -> anyhow::Result<()> {
    if let OutputFormat::Json = OutputFormat::from(format) {
        return print_json(transcript);
    }

    println!("Ad unit: {}", style(&transcript.ad_id).dim());
    println!("\nEvents:");
    for record in &transcript.events {
        let name = if record.event.is_quartile() {
            style(record.event.as_str()).cyan()
        } else {
            style(record.event.as_str()).green()
        };
        println!(
            "  {:>3}. {} {}",
            record.sequence,
            style(record.timestamp.format("%H:%M:%S%.3f")).dim(),
            name
        );
    }

    if !transcript.rejections.is_empty() {
        println!("\nRejected calls:");
        for rejection in &transcript.rejections {
            let at = rejection
                .step
                .map(|i| format!("step {i}"))
                .unwrap_or_else(|| "init".to_string());
            println!(
                "  {} {} [{}] {}",
                style(at).dim(),
                style(&rejection.action).yellow(),
                rejection.code,
                rejection.message
            );
        }
    }

    println!("\nFinal state: {}", style(transcript.final_state).bold());
    Ok(())
}

/// Print the quartile events only
pub fn print_quartiles(transcript: &Transcript, format: &str) -> anyhow::Result<()> {
    let quartiles = transcript.quartiles();
    if let OutputFormat::Json = OutputFormat::from(format) {
        return print_json(&quartiles);
    }

    println!("Quartiles:");
    for record in quartiles {
        println!("  {:>3}. {}", record.sequence, style(record.event.as_str()).cyan());
    }
    println!("\nFinal state: {}", style(transcript.final_state).bold());
    Ok(())
}

pub fn print_handshake(version: &str, format: &str) -> anyhow::Result<()> {
    match OutputFormat::from(format) {
        OutputFormat::Json => print_json(&serde_json::json!({ "vpaid_version": version })),
        OutputFormat::Text => {
            println!("VPAID {}", style(version).bold());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert!(matches!(OutputFormat::from("JSON"), OutputFormat::Json));
        assert!(matches!(OutputFormat::from("text"), OutputFormat::Text));
        assert!(matches!(OutputFormat::from("table"), OutputFormat::Text));
    }
}

//! Environment diagnostics for `speechcli check`.
//!
//! Verifies that the encoder is installed and that credentials for each
//! pipeline are present, without contacting the service.

use crate::config::{Config, Credentials, ServiceTarget};
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Present and working
    Ok(String),
    /// Not found or not configured
    NotFound(String),
    /// Found but has issues
    Warning(String),
}

/// Check if a command exists and runs. `probe` is the argument that makes it
/// print its version.
pub fn check_command(command: &str, probe: &str) -> CheckResult {
    match Command::new(command).arg(probe).output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let first = stdout.lines().next().unwrap_or("").trim().to_string();
            CheckResult::Ok(first)
        }
        Ok(_) => CheckResult::Warning(format!("'{command}' found but {probe} failed")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::NotFound(format!("'{command}' not found in PATH"))
        }
        Err(e) => CheckResult::Warning(format!("Error checking '{command}': {e}")),
    }
}

fn describe_target(target: &ServiceTarget) -> String {
    match target {
        ServiceTarget::Region(region) => format!("region {region}"),
        ServiceTarget::Endpoint(endpoint) => format!("endpoint {endpoint}"),
    }
}

/// Whether transcription credentials resolve from `lookup`.
pub fn check_transcription_credentials(lookup: impl Fn(&str) -> Option<String>) -> CheckResult {
    match Credentials::for_transcription_from(lookup) {
        Ok(c) => CheckResult::Ok(describe_target(&c.target)),
        Err(e) => CheckResult::NotFound(e.to_string()),
    }
}

/// Whether synthesis credentials resolve from `lookup`.
pub fn check_synthesis_credentials(lookup: impl Fn(&str) -> Option<String>) -> CheckResult {
    match Credentials::for_synthesis_from(lookup) {
        Ok(c) => CheckResult::Ok(describe_target(&c.target)),
        Err(e) => CheckResult::NotFound(e.to_string()),
    }
}

fn print_result(label: &str, result: &CheckResult, hint: Option<&str>) {
    print!("{label}: ");
    match result {
        CheckResult::Ok(detail) if detail.is_empty() => println!("✓ OK"),
        CheckResult::Ok(detail) => println!("✓ OK ({detail})"),
        CheckResult::NotFound(msg) => {
            println!("✗ {msg}");
            if let Some(hint) = hint {
                println!("  {hint}");
            }
        }
        CheckResult::Warning(msg) => println!("⚠ WARNING: {msg}"),
    }
}

/// Run all checks and print results. Returns `true` when nothing is missing.
pub fn check_dependencies(config: &Config) -> bool {
    println!("Checking speechcli environment...\n");

    let encoder = config.synthesize.encoder();
    let ffmpeg = check_command(&encoder, "-version");
    print_result(
        &format!("{encoder} (MP3 encoding, optional)"),
        &ffmpeg,
        Some("Install: sudo apt install ffmpeg  (or set FFMPEG_PATH)"),
    );

    let env = |name: &str| std::env::var(name).ok();
    let stt = check_transcription_credentials(env);
    print_result(
        "transcription credentials",
        &stt,
        Some("Set SPEECH_KEY and SPEECH_REGION (or SPEECH_ENDPOINT)"),
    );
    let tts = check_synthesis_credentials(env);
    print_result(
        "synthesis credentials",
        &tts,
        Some("Set SPEECH_KEY (or AZURE_SPEECH_KEY)"),
    );

    let ok = matches!(stt, CheckResult::Ok(_)) && matches!(tts, CheckResult::Ok(_));
    println!();
    if ok {
        println!("All required settings are present.");
    } else {
        println!("Some required settings are missing.");
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_command_is_not_found() {
        let result = check_command("speechcli-definitely-missing-binary", "-version");
        assert!(matches!(result, CheckResult::NotFound(_)));
    }

    #[test]
    fn transcription_credentials_need_a_location() {
        let result = check_transcription_credentials(env(&[("SPEECH_KEY", "k")]));
        assert!(matches!(result, CheckResult::NotFound(_)));

        let result =
            check_transcription_credentials(env(&[("SPEECH_KEY", "k"), ("SPEECH_REGION", "eastus")]));
        assert_eq!(result, CheckResult::Ok("region eastus".to_string()));
    }

    #[test]
    fn synthesis_credentials_default_region() {
        let result = check_synthesis_credentials(env(&[("AZURE_SPEECH_KEY", "k")]));
        assert_eq!(result, CheckResult::Ok("region canadacentral".to_string()));

        let result = check_synthesis_credentials(env(&[]));
        assert!(matches!(result, CheckResult::NotFound(_)));
    }
}

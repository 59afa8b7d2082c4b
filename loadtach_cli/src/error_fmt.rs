//! Human-readable error descriptions and structured JSON error formatting.

use loadtach_core::{BuildError, DeviceError, ProtocolError};

/// Every message in the chain, outermost first, lowercased.
fn chain_text(err: &eyre::Report) -> String {
    err.chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
        .to_ascii_lowercase()
}

fn find<E: std::error::Error + 'static>(err: &eyre::Report) -> Option<&E> {
    err.chain().find_map(|e| e.downcast_ref::<E>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingLoadCell => {
                "What happened: No load cell was provided to the device.\nLikely causes: The HX711 failed to initialize or was not wired into the builder.\nHow to fix: Ensure the load cell is created successfully and passed via with_load_cell(...).".to_string()
            }
            BuildError::MissingStorage => {
                "What happened: No calibration storage was provided to the device.\nLikely causes: The storage file could not be opened or was not wired into the builder.\nHow to fix: Check [storage] path in the config and pass it via with_storage(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(pe) = find::<ProtocolError>(err) {
        return match pe {
            ProtocolError::AcquisitionTimeout => "What happened: HX711 did not produce data within the configured timeout.\nLikely causes: Wrong DT/SCK pins, wiring/power issues, or timeout configured too low.\nHow to fix: Check [pins] in the config, verify 5V/GND, and raise acquisition.timeout_ms.".to_string(),
            ProtocolError::AcquisitionFault => "What happened: The load cell reported a fault.\nLikely causes: GPIO access denied or a disconnected sensor.\nHow to fix: Verify wiring and GPIO permissions, then rerun with --log-level=debug.".to_string(),
            other => format!(
                "What happened: The device rejected a command (ERR {} {other}).\nLikely causes: Malformed request.\nHow to fix: Check the command syntax.",
                other.code()
            ),
        };
    }

    if let Some(de) = find::<DeviceError>(err) {
        if matches!(de, DeviceError::Storage(_)) {
            return format!(
                "What happened: {de}.\nLikely causes: The storage file is not writable or the disk is full.\nHow to fix: Check [storage] path and permissions."
            );
        }
        return format!(
            "What happened: {de}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // String-based heuristics for errors coming from init or config
    let lower = chain_text(err);

    // Calibration CSV header special-case
    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration CSV. Expected 'raw,grams'.".to_string();
    }

    if lower.contains("open hx711") || lower.contains("open tach input") {
        return "What happened: Failed to initialize hardware pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("open calibration storage") {
        return format!(
            "What happened: Could not open the calibration storage.\nLikely causes: Missing directory or no write permission.\nHow to fix: Check [storage] path in the config. Original: {err}"
        );
    }

    if lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: Out-of-range values or a TOML syntax error.\nHow to fix: Edit the TOML config and try again. Detail: {lower}"
        );
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 for an acquisition timeout, 4 for a hardware fault, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match find::<ProtocolError>(err) {
        Some(ProtocolError::AcquisitionTimeout) => 3,
        Some(ProtocolError::AcquisitionFault) => 4,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if find::<BuildError>(err).is_some() {
        return "BuildError";
    }
    match find::<ProtocolError>(err) {
        Some(ProtocolError::AcquisitionTimeout) => "AcquisitionTimeout",
        Some(ProtocolError::AcquisitionFault) => "AcquisitionFault",
        Some(_) => "Protocol",
        None if chain_text(err).contains("invalid configuration") => "InvalidConfig",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_exit_3_and_hx711_text() {
        let err = eyre::Report::new(ProtocolError::AcquisitionTimeout).wrap_err("self-check acquisition");
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("HX711 did not produce data"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "AcquisitionTimeout");
    }

    #[test]
    fn csv_header_hint_survives_context() {
        let err = eyre::eyre!("calibration CSV must have headers 'raw,grams', got: a,b")
            .wrap_err("fit calibration from cal.csv");
        assert_eq!(
            humanize(&err),
            "Invalid headers in calibration CSV. Expected 'raw,grams'."
        );
        assert_eq!(exit_code_for_error(&err), 1);
    }

    #[test]
    fn config_errors_are_named() {
        let err = eyre::eyre!("tach.default_ppr must be >= 1").wrap_err("invalid configuration");
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "InvalidConfig");
        assert!(v["message"].as_str().unwrap().contains("default_ppr"));
    }
}

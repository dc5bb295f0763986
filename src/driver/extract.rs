//! Output extraction: echoed command → response body → trailing prompt.

use regex::Regex;

/// Extract the response body for one command from a captured buffer.
///
/// The device echoes the command, then the response, then a prompt. The
/// body is everything between the echo line and the first prompt line,
/// whitespace-trimmed. Lines before the echo (residue from session setup)
/// are dropped.
///
/// If the echo never appears the whole buffer minus trailing prompt lines
/// is returned; callers should treat that branch as best-effort recovery.
pub fn extract_output(buffer: &str, command: &str, prompt: &Regex) -> String {
    let lines: Vec<&str> = buffer.lines().collect();

    let echo_index = lines.iter().position(|line| line.contains(command));

    match echo_index {
        Some(echo) => {
            let body: Vec<&str> = lines[echo + 1..]
                .iter()
                .take_while(|line| !is_prompt_line(line, prompt))
                .copied()
                .collect();
            body.join("\n").trim().to_string()
        }
        None => {
            let end = lines
                .iter()
                .rposition(|line| !is_prompt_line(line, prompt) && !line.trim().is_empty())
                .map_or(0, |i| i + 1);
            lines[..end].join("\n").trim().to_string()
        }
    }
}

fn is_prompt_line(line: &str, prompt: &Regex) -> bool {
    let line = line.trim();
    !line.is_empty() && prompt.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::{DeviceKind, VendorProfile};

    fn junos() -> VendorProfile {
        VendorProfile::for_kind(DeviceKind::Junos)
    }

    #[test]
    fn test_extract_basic() {
        let buffer = "show version\nJuniper version info\nuser@device> ";
        let out = extract_output(buffer, "show version", junos().prompt());
        assert_eq!(out, "Juniper version info");
    }

    #[test]
    fn test_extract_multiline_body() {
        let buffer = "show interfaces terse\nge-0/0/0 up up\nge-0/0/1 up down\nuser@device> ";
        let out = extract_output(buffer, "show interfaces terse", junos().prompt());
        assert_eq!(out, "ge-0/0/0 up up\nge-0/0/1 up down");
    }

    #[test]
    fn test_extract_drops_leading_residue() {
        // Init responses that were never consumed sit ahead of the echo.
        let buffer = "Screen length set to 0\nshow version\nbody\nuser@device> ";
        let out = extract_output(buffer, "show version", junos().prompt());
        assert_eq!(out, "body");
    }

    #[test]
    fn test_extract_empty_body() {
        let buffer = "clear interfaces statistics\nuser@device> ";
        let out = extract_output(buffer, "clear interfaces statistics", junos().prompt());
        assert_eq!(out, "");
    }

    #[test]
    fn test_extract_body_stops_at_first_prompt() {
        let buffer = "show version\nline one\nuser@device> \ntrailing noise";
        let out = extract_output(buffer, "show version", junos().prompt());
        assert_eq!(out, "line one");
    }

    #[test]
    fn test_extract_missing_echo_recovers() {
        let buffer = "something unexpected\nuser@device> ";
        let out = extract_output(buffer, "show version", junos().prompt());
        assert_eq!(out, "something unexpected");
    }

    #[test]
    fn test_extract_missing_echo_all_prompts() {
        let buffer = "user@device> \n";
        let out = extract_output(buffer, "show version", junos().prompt());
        assert_eq!(out, "");
    }

    #[test]
    fn test_extract_strips_whitespace() {
        let buffer = "show system uptime\n\n  up 12 days  \n\nuser@device> ";
        let out = extract_output(buffer, "show system uptime", junos().prompt());
        assert_eq!(out, "up 12 days");
    }

    #[test]
    fn test_extract_iosxr_prompt_bound() {
        let profile = VendorProfile::for_kind(DeviceKind::IosXr);
        let buffer = "show platform\nNode status\nRP/0/RP0/CPU0:router# ";
        let out = extract_output(buffer, "show platform", profile.prompt());
        assert_eq!(out, "Node status");
    }
}

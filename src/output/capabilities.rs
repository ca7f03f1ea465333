// Human readable layout for capability responses
//
// Example output:
// ```text
// gNMI version: 0.8.0
// supported models:
//   - openconfig-interfaces, OpenConfig working group, 2.4.3
//   - openconfig-bgp, OpenConfig working group, 6.0.0
// supported encodings:
//   - JSON
//   - JSON_IETF
// ```

use super::CapabilityResponse;

/// Renders `caps` with every line starting with `prefix`, newline terminated.
pub fn render_capabilities(
    prefix: &str,
    caps: &CapabilityResponse,
) -> String {
    let mut out = String::new();
    let mut line = |text: &str| {
        out.push_str(prefix);
        out.push_str(text);
        out.push('\n');
    };

    line(&format!("gNMI version: {}", caps.gnmi_version));
    line("supported models:");
    for model in &caps.supported_models {
        line(&format!(
            "  - {}, {}, {}",
            model.name, model.organization, model.version
        ));
    }
    line("supported encodings:");
    for encoding in &caps.supported_encodings {
        line(&format!("  - {}", encoding.as_str()));
    }

    out
}

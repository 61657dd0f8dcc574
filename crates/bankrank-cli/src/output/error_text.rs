use bankrank_core::EtlError;

pub fn render_error(error: &EtlError) -> String {
    let mut lines = vec![
        "The command did not complete.".to_string(),
        String::new(),
        format!("  Error:    {}", error.code()),
        format!("  Details:  {error}"),
        String::new(),
        "What to do next:".to_string(),
    ];

    let steps = error.recovery_steps();
    if steps.is_empty() {
        lines.push("  1. Retry the command.".to_string());
    } else {
        for (index, step) in steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    lines.join("\n")
}

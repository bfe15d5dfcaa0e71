use crate::answers::Answer;

/// Best-guess typed value for a raw reply. `None` means the reply was blank.
pub fn interpret(reply: &str) -> Option<Answer> {
    if reply.trim().is_empty() {
        return None;
    }

    let lowered = reply.to_lowercase();
    match lowered.as_str() {
        "true" | "y" | "yes" => return Some(Answer::Bool(true)),
        "false" | "n" | "no" => return Some(Answer::Bool(false)),
        _ => {}
    }

    if let Some(number) = canonical_number(reply) {
        return Some(Answer::Number(number));
    }

    Some(Answer::Text(reply.to_string()))
}

/// Magnitudes at or above this render in exponent form, so no plain digit
/// string can be canonical there.
const EXPONENT_ABOVE: f64 = 1e21;
/// Non-zero magnitudes below this render in exponent form too.
const EXPONENT_BELOW: f64 = 1e-6;

/// Parses `text` as a number only when printing it back yields the same text,
/// so `"42"` and `"1.5"` are numbers but `"042"`, `"1.50"` and `"+1"` stay text.
/// Negative zero prints as `0`, so `"-0"` stays text as well.
fn canonical_number(text: &str) -> Option<f64> {
    let value = text.parse::<f64>().ok().filter(|value| value.is_finite())?;
    let magnitude = value.abs();
    if value.is_sign_negative() && value == 0.0 {
        return None;
    }
    if magnitude >= EXPONENT_ABOVE || (magnitude > 0.0 && magnitude < EXPONENT_BELOW) {
        return None;
    }
    (value.to_string() == text).then_some(value)
}

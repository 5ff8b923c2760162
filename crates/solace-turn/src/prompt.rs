//! Prompt composition for the generation capability.

use solace_types::FacialEmotionResult;

/// Builds the generation prompt from the user's text and an optional
/// facial-emotion judgment.
///
/// Pure and deterministic: identical inputs always produce the identical
/// string. An UNKNOWN facial judgment contributes nothing — the generator
/// should not be steered by a signal that carries no information.
pub fn compose_prompt(user_text: &str, facial: Option<&FacialEmotionResult>) -> String {
    let mut prompt = format!(
        "You are a compassionate therapist. The user says: '{user_text}'."
    );

    if let Some(emotion) = facial.filter(|emotion| !emotion.is_unknown()) {
        prompt.push_str(&format!(
            " The user's facial emotion appears to be {} (score: {}).",
            emotion.label.to_lowercase(),
            emotion.score
        ));
    }

    prompt.push_str(" Respond empathetically and helpfully.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_prompt() {
        let prompt = compose_prompt("I feel hopeless", None);
        assert_eq!(
            prompt,
            "You are a compassionate therapist. The user says: 'I feel hopeless'. \
             Respond empathetically and helpfully."
        );
    }

    #[test]
    fn facial_emotion_is_appended_lower_cased() {
        let emotion = FacialEmotionResult::detected("SAD", 88.5);
        let prompt = compose_prompt("I had a rough day", Some(&emotion));
        assert_eq!(
            prompt,
            "You are a compassionate therapist. The user says: 'I had a rough day'. \
             The user's facial emotion appears to be sad (score: 88.5). \
             Respond empathetically and helpfully."
        );
    }

    #[test]
    fn unknown_emotion_is_ignored() {
        let emotion = FacialEmotionResult::unknown("no face detected");
        let with_unknown = compose_prompt("hello", Some(&emotion));
        let without = compose_prompt("hello", None);
        assert_eq!(with_unknown, without);
    }

    #[test]
    fn identical_inputs_compose_identically() {
        let emotion = FacialEmotionResult::detected("HAPPY", 97.31);
        assert_eq!(
            compose_prompt("same text", Some(&emotion)),
            compose_prompt("same text", Some(&emotion))
        );
    }
}

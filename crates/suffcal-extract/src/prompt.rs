//! Instruction template for the extraction model.
//!
//! The working language is German since the tracked accounts are German
//! venues. Keys are fixed: `Titel`, `Datum`, `Uhrzeit`, `Ort`.

/// Key holding the event title.
pub const KEY_TITLE: &str = "Titel";
/// Key holding the ISO date.
pub const KEY_DATE: &str = "Datum";
/// Key holding the time of day.
pub const KEY_TIME: &str = "Uhrzeit";
/// Key holding the venue.
pub const KEY_LOCATION: &str = "Ort";

/// System prompt sent with every request.
pub const SYSTEM_PROMPT: &str =
    "Du bist ein hilfreicher Assistent, der relevante Informationen aus Texten extrahiert.";

/// Example object shown to the model.
const SCHEMA_EXAMPLE: &str = r#"{"Titel": null, "Datum": null, "Uhrzeit": null, "Ort": null}"#;

/// Builds the user prompt for the recognized text of one photo.
pub fn build_user_prompt(text: &str) -> String {
    format!(
        "Extrahiere aus folgendem Text die wichtigsten Informationen zur Veranstaltung \
         oder den Veranstaltungen: Titel, Datum, Uhrzeit und Ort.\n\
         \n\
         Antwortformat:\n\
         - Eine Veranstaltung: ein einzelnes JSON-Objekt mit den Schlüsseln \
         \"{title}\", \"{date}\", \"{time}\", \"{location}\".\n\
         - Mehrere Veranstaltungen: eine JSON-Liste solcher Objekte, zum Beispiel [{example}]\n\
         - Fehlende Angaben sind null.\n\
         - {date} im ISO-8601-Format JJJJ-MM-TT oder null.\n\
         - Antworte nur mit gültigem JSON in einer Zeile, ohne Erklärungen.\n\
         - Erfinde keine Angaben.\n\
         \n\
         Text: {text}\n",
        title = KEY_TITLE,
        date = KEY_DATE,
        time = KEY_TIME,
        location = KEY_LOCATION,
        example = SCHEMA_EXAMPLE,
        text = text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_contains_text_and_keys() {
        let prompt = build_user_prompt("SOMMERFEST 12. Juli Stadtpark");

        assert!(prompt.ends_with("Text: SOMMERFEST 12. Juli Stadtpark\n"));
        for key in [KEY_TITLE, KEY_DATE, KEY_TIME, KEY_LOCATION] {
            assert!(prompt.contains(&format!("\"{}\"", key)), "missing {}", key);
        }
        assert!(prompt.contains(SCHEMA_EXAMPLE));
        assert!(prompt.contains("Erfinde keine Angaben"));
    }

    #[test]
    fn test_schema_example_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(SCHEMA_EXAMPLE).unwrap();
        assert!(value[KEY_TITLE].is_null());
    }
}

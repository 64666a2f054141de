use crate::llm::ChatMessage;

/// System role the model answers under. The scaffolding and the examples
/// are Spanish because the schema and its data are; the model keys on that
/// vocabulary.
pub const SYSTEM_PROMPT: &str =
    "Eres un experto en SQL. Responde con una query de SQL utilizando el esquema de la base de datos.";

/// Fixed few-shot exchanges over the real-estate schema.
const EXAMPLES: [(&str, &str); 3] = [
    (
        "Recupera todas las columnas de las viviendas que tienen ascensor y cuestan menos de 300,000 euros.",
        "SELECT * FROM home_data_extraction.home_processed_extraction WHERE ascensor = 1 AND precio < 300000",
    ),
    (
        "\u{bf}Cu\u{e1}ntas viviendas hay en la ciudad de Madrid?",
        "SELECT COUNT(*) AS total_viviendas FROM home_data_extraction.home_processed_extraction WHERE provincia = 'Madrid'",
    ),
    (
        "\u{bf}Cu\u{e1}l es el precio promedio de las viviendas con ascensor en la ciudad de Barcelona?",
        "SELECT AVG(precio) AS precio_promedio FROM home_data_extraction.home_processed_extraction WHERE provincia = 'Barcelona' AND ascensor = 1",
    ),
];

// Rough chars-per-token ratio used to budget the prompt against the model's
// context window.
const APPROX_CHARS_PER_TOKEN: usize = 4;

/// Build the chat prompt: system role, the few-shot exchanges (each user
/// turn embedding the schema context), then the live question.
pub fn build_messages(schema_ctx: &str, question: &str, n_ctx: usize) -> Vec<ChatMessage> {
    let ctx = fit_context(schema_ctx, question, n_ctx);
    let mut messages = Vec::with_capacity(EXAMPLES.len() * 2 + 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    for (example_question, example_sql) in EXAMPLES {
        messages.push(ChatMessage::user(format!(
            "Usando el esquema: {ctx}.\n{example_question}"
        )));
        messages.push(ChatMessage::assistant(example_sql));
    }
    messages.push(ChatMessage::user(format!(
        "Usando el esquema: {ctx}.\n{question}"
    )));
    messages
}

/// Extend a prompt with the statement that failed and the error it produced,
/// asking the model for a corrected query.
pub fn retry_messages(
    mut messages: Vec<ChatMessage>,
    failed_sql: &str,
    error: &str,
) -> Vec<ChatMessage> {
    messages.push(ChatMessage::assistant(failed_sql));
    messages.push(ChatMessage::user(format!(
        "La consulta anterior ha fallado con este error: {error}\nCorrige la query de SQL y responde de nuevo."
    )));
    messages
}

/// Fit the schema context into the token budget. The context is embedded in
/// every user turn, so the per-copy allowance divides what remains after the
/// fixed prompt text and the question; the question itself is never cut.
fn fit_context(schema_ctx: &str, question: &str, n_ctx: usize) -> String {
    let budget = n_ctx.saturating_mul(APPROX_CHARS_PER_TOKEN);
    let fixed: usize = SYSTEM_PROMPT.len()
        + EXAMPLES
            .iter()
            .map(|(q, sql)| q.len() + sql.len())
            .sum::<usize>()
        + question.len();
    let copies = EXAMPLES.len() + 1;
    let per_copy = budget.saturating_sub(fixed) / copies;

    if schema_ctx.len() <= per_copy {
        return schema_ctx.to_string();
    }
    let mut end = per_copy;
    while end > 0 && !schema_ctx.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\u{2026}", &schema_ctx[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: &str = "Tabla 0:\nnombre:home_data_extraction.home_processed_extraction\ncolumnas:precio (INT)\n";

    #[test]
    fn prompt_has_system_examples_and_question() {
        let messages = build_messages(CTX, "\u{bf}Cu\u{e1}ntas viviendas hay?", 3000);
        assert_eq!(messages.len(), 8);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        let last = messages.last().unwrap();
        assert_eq!(last.role, "user");
        assert!(last.content.contains("Usando el esquema:"));
        assert!(last.content.ends_with("\u{bf}Cu\u{e1}ntas viviendas hay?"));
    }

    #[test]
    fn schema_context_is_embedded_in_every_user_turn() {
        let messages = build_messages(CTX, "pregunta", 3000);
        for msg in messages.iter().filter(|m| m.role == "user") {
            assert!(msg.content.contains("home_processed_extraction"));
        }
    }

    #[test]
    fn tiny_context_window_truncates_schema_not_question() {
        let question = "\u{bf}Cu\u{e1}l es el precio medio?";
        let messages = build_messages(&CTX.repeat(50), question, 300);
        let last = messages.last().unwrap();
        assert!(last.content.ends_with(question));
        assert!(last.content.len() < CTX.len() * 50);
    }

    #[test]
    fn retry_prompt_appends_failure_exchange() {
        let base = build_messages(CTX, "pregunta", 3000);
        let messages = retry_messages(base, "SELECT nope", "Unknown column 'nope'");
        assert_eq!(messages.len(), 10);
        assert_eq!(messages[8].role, "assistant");
        assert_eq!(messages[8].content, "SELECT nope");
        assert!(messages[9].content.contains("Unknown column 'nope'"));
    }
}

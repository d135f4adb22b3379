pub const SCHEMA_SYSTEM_PROMPT: &str =
    "You are a 20+ years experienced schema generator for better SEO for websites.";

pub const COMPARISON_SYSTEM_PROMPT: &str = "You are an AI assistant that compares JSON-LD schemas and provides an accuracy score and detailed comparison.";

pub const DEFAULT_INSTRUCTIONS: &str = r#"Generate a detailed, SEO-optimized schema in JSON-LD format following schema.org guidelines.
Ensure that the schema is generic enough to cover diverse content types but also includes the following aspects where applicable:

- Use the most relevant schema type (e.g., `Article`, `Recipe`, `Event`, `Product`) based on the provided content.
- Include key properties specific to the schema type (e.g., `author`, `datePublished`, `headline` for `Article`; `prepTime`, `cookTime`, `recipeIngredient`, `rating` for `Recipe`).
- Make sure that you do not add anything extra other than the content or modify the content.
- Include at least 15 SEO-friendly keywords extracted from the content.
- Ensure that the schema includes `@context`, `@type`, `url`, and `description` fields at a minimum.
- Include additional fields such as `mainEntityOfPage`, `image`, `publisher`, or `offers` when relevant.
- The output MUST be valid JSON-LD with proper syntax and double quotes.

Extract all relevant information from this content"#;

/// Build the generation prompt. A blank `user_instructions` falls back to
/// the built-in SEO instructions.
pub fn build_generation_prompt(user_instructions: Option<&str>, text_content: &str) -> String {
    match user_instructions.map(str::trim).filter(|s| !s.is_empty()) {
        Some(instructions) => format!(
            "{}\n\nExtract all relevant information from this content:\n{}\n\nReturn ONLY the JSON-LD schema, nothing else. Ensure all JSON is properly formatted with double quotes.",
            instructions, text_content
        ),
        None => format!("{}\n{}", DEFAULT_INSTRUCTIONS, text_content),
    }
}

pub fn build_comparison_prompt(user_schema: &str, generated_schema: &str) -> String {
    format!(
        r#"Compare the following two JSON-LD schemas and provide an accuracy score.
The accuracy score should reflect how closely the user schema matches the generated schema.
Provide the score as a percentage and list the missing or additional fields in the user schema compared to the generated schema.

User Schema:
{}

Generated Schema:
{}

Return the accuracy score as a percentage and list the missing or additional fields.
Write the fields on lines starting with "Missing fields: " and "Additional fields: "."#,
        user_schema, generated_schema
    )
}

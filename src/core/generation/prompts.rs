//! Prompt templates for schema and content generation.
//!
//! Every template instructs the model to return a single raw JSON value
//! with no surrounding commentary, honoring the schema's `ui_order`.

/// Base template for batch content generation.
const CONTENT_TEMPLATE: &str = "\
You are an RPG content generator for {system}, set in {setting}. You help lazy GMs generate rich and diverse content.
You will produce strictly valid JSON that describes any of ({content_kind}) influenced by {context} themes.
Ensure an appropriate name is chosen. Low level items should be generic in name, unimpressive and mundane.
Not all items are useful or positive in effect. Items can have costs or penalties for use, particularly powerful items.

Follow these rules:
- Return only raw JSON, no markdown code fences or extra commentary.
- The JSON must be valid per RFC 8259.
- Include a \"name\" field and a \"description\" field.
- Name and description have the highest priority and should be listed first.
- Flatten all properties. Avoid nested objects if possible. If you must use nested objects, flatten them into strings.
- Each property in the JSON schema is assigned an integer \"ui_order\" field.
  \"name\" has ui_order=1, \"description\"=2, and then assign ui_order=3,4,... to other fields by priority of importance.
- Sort the final JSON properties by ui_order. The final JSON must have fields in ascending ui_order order.
- Integer values must be integers, strings in double-quotes, etc. No trailing commas.

Your output:
A single JSON object with fields ordered by their ui_order, strictly valid JSON, and no additional text.

Schema:

{schema}";

/// Template for requesting a schema document from the model.
const SCHEMA_TEMPLATE: &str = "\
You are an RPG content generator for {system}, set in {setting}. Provide a JSON schema (draft-07) that describes {content_kind} objects influenced by {context}, following these rules:
- Return only raw JSON, no markdown code fences or extra commentary.
- The schema must be a single JSON object and strictly valid per the schema provided, do not deviate.
- Include \"name\" (type=string, ui_order=1) and \"description\" (type=string, ui_order=2) as required properties, always.
- Include ui_order as an integer for each property in the schema's \"properties\" definitions.
- Additional properties should also have ui_order assigned incrementally (3,4,...), sorted by their informative priority.
- Properties should be as flat as possible. Avoid nested objects. If necessary, just define them as strings.
- Disallow additional properties by setting \"additionalProperties\": false.
- No code fences or markdown formatting, just the raw JSON schema.

Schema:

{schema}";

/// Template for expanding a summary record into a fully detailed one.
const DETAIL_TEMPLATE: &str = "\
{base_summary}

You are an RPG content generator for {system}, set in {setting}. Convert the above information into a fully detailed JSON object describing a {content_kind} influenced by {context}, including all relevant stats, flavor, and details.
Follow these rules:
- Return only raw JSON, no markdown code fences or extra commentary.
- Ensure data and their types are absolutely correct. Digits with no strings should be an int type.
- Conform to the previously defined JSON schema (including ui_order).
- \"name\" ui_order=1, \"description\" ui_order=2.
- Include other fields with assigned ui_order, sorted accordingly.
- Flatten data: no complex nested objects.
- The output must be strictly valid JSON with a single top-level object.";

fn fill(
    template: &str,
    system: &str,
    setting: &str,
    content_kind: &str,
    context: &str,
) -> String {
    template
        .replace("{system}", system)
        .replace("{setting}", setting)
        .replace("{content_kind}", content_kind)
        .replace("{context}", context)
}

/// Content-generation prompt embedding the serialized schema.
pub fn content_prompt(
    system: &str,
    setting: &str,
    content_kind: &str,
    context: &str,
    schema_json: &str,
) -> String {
    fill(CONTENT_TEMPLATE, system, setting, content_kind, context).replace("{schema}", schema_json)
}

/// Schema-request prompt embedding an exemplar schema document.
pub fn schema_prompt(
    system: &str,
    setting: &str,
    content_kind: &str,
    context: &str,
    exemplar_schema: &str,
) -> String {
    fill(SCHEMA_TEMPLATE, system, setting, content_kind, context)
        .replace("{schema}", exemplar_schema)
}

/// Detail-expansion prompt embedding the summary record verbatim.
pub fn detail_prompt(
    system: &str,
    setting: &str,
    content_kind: &str,
    context: &str,
    base_summary: &str,
) -> String {
    fill(DETAIL_TEMPLATE, system, setting, content_kind, context)
        .replace("{base_summary}", base_summary)
}

/// Append the accumulated attempt-failure notes so the model can
/// self-correct. A no-op when there are none.
pub fn with_error_notes(prompt: &str, notes: &[String]) -> String {
    if notes.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt}\n\n# Errors so far:\n{}", notes.join("\n"))
    }
}

/// Breadcrumb line appended beneath the base prompt.
pub fn breadcrumb_line(breadcrumb: &str) -> String {
    format!("Selected category/type hierarchy: {breadcrumb}")
}

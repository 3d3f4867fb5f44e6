//! Prompt templating helpers.
//!
//! Both built-in prompts live in template files and are rendered from a
//! single code path: the system directive sent at the head of every turn,
//! and the instruction used when a session's history is summarized.

use std::collections::BTreeMap;

const SYSTEM_PROMPT_TEMPLATE: &str = include_str!("templates/system_prompt.template");
const SUMMARY_PROMPT_TEMPLATE: &str = include_str!("templates/summary_prompt.template");

/// Parameters used to compile the system prompt template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SystemPromptParams<'a> {
    pub enabled_tools: Vec<&'a str>,
    pub exit_commands: &'a [&'a str],
    pub clear_commands: &'a [&'a str],
}

/// Render the system prompt template using runtime parameters.
pub fn render_system_prompt(params: SystemPromptParams<'_>) -> String {
    let mut vars = BTreeMap::<&str, String>::new();
    vars.insert(
        "ENABLED_TOOLS_LIST",
        render_enabled_tools(&params.enabled_tools),
    );
    vars.insert("EXIT_COMMANDS", render_word_list(params.exit_commands));
    vars.insert("CLEAR_COMMANDS", render_word_list(params.clear_commands));

    normalize_blank_lines(&render_template(SYSTEM_PROMPT_TEMPLATE, &vars))
}

/// Render the summarization instruction for `transcript`.
pub fn render_summary_prompt(target_tokens: u32, transcript: &str) -> String {
    let mut vars = BTreeMap::<&str, String>::new();
    vars.insert("TARGET_TOKENS", target_tokens.to_string());
    vars.insert("CONVERSATION", transcript.to_string());
    render_template(SUMMARY_PROMPT_TEMPLATE, &vars)
        .trim()
        .to_string()
}

/// Single left-to-right pass, so substituted values are never re-expanded.
fn render_template(template: &str, vars: &BTreeMap<&str, String>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rendered.push_str(&rest[start..]);
            return rendered;
        };
        let key = &after[..end];
        match vars.get(key) {
            Some(value) => rendered.push_str(value),
            None => {
                rendered.push_str("{{");
                rendered.push_str(key);
                rendered.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    rendered.push_str(rest);
    rendered
}

fn render_enabled_tools(enabled_tools: &[&str]) -> String {
    if enabled_tools.is_empty() {
        return "- none".to_string();
    }

    enabled_tools
        .iter()
        .map(|name| format!("- `{name}`"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `'a', 'b' or 'c'`
fn render_word_list(words: &[&str]) -> String {
    let quoted: Vec<String> = words.iter().map(|word| format!("'{word}'")).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, init)) => format!("{} or {last}", init.join(", ")),
    }
}

fn normalize_blank_lines(text: &str) -> String {
    let mut out = String::new();
    let mut previous_blank = false;

    for line in text.lines() {
        let is_blank = line.trim().is_empty();
        if is_blank && previous_blank {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line.trim_end());
        previous_blank = is_blank;
    }

    out.trim().to_string()
}

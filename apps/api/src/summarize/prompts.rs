//! Prompt contract for the summarizer.
//!
//! The response must be a strict two-key JSON object. The summary is asked
//! for in markdown limited to the structures the block converter understands:
//! level 2-3 headings, dash bullet lists, and bold spans.

pub const SUMMARIZE_SYSTEM_ROLE: &str =
    "You are a helpful assistant that summarizes webpage content.";

pub const SUMMARIZE_PROMPT_TEMPLATE: &str = r####"Analyze the following webpage content and:
1. Write a markdown-structured summary of the page in at most 200 words. Do NOT quote the page verbatim: capture its purpose, key ideas, and takeaways in your own words. Structure the summary with "##" and "###" headings, "-" bullet lists, and **bold** emphasis where it helps.
2. Suggest up to 5 relevant tags, preferring this list of existing tags: [{existing_tags}]. Coin a new tag only when none of the existing ones fit.
3. Format the response as a JSON object with exactly two keys:
{
    "SummarizedText": "...",
    "suggestedTags": ["tag1", "tag2", ...]
}

Webpage content:
Title: {title}
URL: {url}
Text: {text}"####;

pub const INSIGHTS_SYSTEM: &str =
    "You are an expert analyst creating concise, engaging learning journey profiles.";

pub const INSIGHTS_PROMPT_TEMPLATE: &str = r#"Analyze the following reading history and create a brief, engaging profile of the reader's learning journey and interests:

Reading Data:
{reading_data}

Create a concise, third-person narrative that:
1. Identifies 2-3 core areas the reader is deeply exploring
2. Highlights any clear transition or evolution in interests
3. Points out emerging topics or new directions
4. Notes any interesting patterns in how topics interconnect

Keep the tone professional yet conversational, as if introducing the reader's interests to someone viewing their profile. Limit to 3-4 sentences."#;
